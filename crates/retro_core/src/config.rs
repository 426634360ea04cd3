//! Tuning configuration for the simulation.
//!
//! Every gameplay constant lives here so a session can be tuned from a
//! RON file without recompiling. Defaults reproduce the classic arena.
//!
//! # Example RON
//!
//! ```ron
//! SimConfig(
//!     world: (width: 24, height: 16),
//!     player_speed: 0.15,
//!     fireball: (damage: 40),
//! )
//! ```
//!
//! Omitted fields keep their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{fixed_decimal, vec2_decimal_list, Fixed, Vec2Fixed};
use crate::world::WorldBounds;

/// Projectile tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireballConfig {
    /// Distance travelled per tick.
    #[serde(with = "fixed_decimal")]
    pub velocity: Fixed,
    /// Maximum straight-line distance from the spawn point.
    #[serde(with = "fixed_decimal")]
    pub range: Fixed,
    /// Health removed from the unit that is hit.
    pub damage: u32,
    /// Displacement applied to the unit that is hit.
    #[serde(with = "fixed_decimal")]
    pub knockback: Fixed,
    /// Forward spawn offset, as a multiple of the firer's speed.
    #[serde(with = "fixed_decimal")]
    pub spawn_offset: Fixed,
    /// Ticks between animation frames.
    pub animation_period: u64,
    /// Trail particles are emitted on ticks divisible by this.
    pub trail_cadence: u64,
    /// Fewest trail particles per emission.
    pub trail_min: u32,
    /// Most trail particles per emission.
    pub trail_max: u32,
    /// Trail particle scatter around the projectile.
    #[serde(with = "fixed_decimal")]
    pub trail_spread: Fixed,
    /// Particles in the burst when the projectile is destroyed.
    pub impact_particles: u32,
    /// Burst particle scatter around the impact point.
    #[serde(with = "fixed_decimal")]
    pub impact_spread: Fixed,
}

impl Default for FireballConfig {
    fn default() -> Self {
        Self {
            velocity: Fixed::from_num(0.2),
            range: Fixed::from_num(15),
            damage: 25,
            knockback: Fixed::ONE,
            spawn_offset: Fixed::ZERO,
            animation_period: 10,
            trail_cadence: 3,
            trail_min: 1,
            trail_max: 3,
            trail_spread: Fixed::from_num(0.15),
            impact_particles: 25,
            impact_spread: Fixed::from_num(0.3),
        }
    }
}

/// Enemy-touches-player contact damage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeConfig {
    /// Contact distance.
    #[serde(with = "fixed_decimal")]
    pub radius: Fixed,
    /// Health removed per contact.
    pub damage: u32,
    /// Displacement of the player away from the enemy.
    #[serde(with = "fixed_decimal")]
    pub knockback: Fixed,
}

impl Default for MeleeConfig {
    fn default() -> Self {
        Self {
            radius: Fixed::ONE,
            damage: 5,
            knockback: Fixed::ONE,
        }
    }
}

/// Cosmetic particle tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Shortest lifetime in ticks.
    pub lifetime_min: u32,
    /// Longest lifetime in ticks.
    pub lifetime_max: u32,
    /// Candidate drift steps; one is picked at random per drift.
    #[serde(with = "vec2_decimal_list")]
    pub drift: Vec<Vec2Fixed>,
    /// Base ticks between drifts.
    pub drift_interval: u64,
    /// Random +/- offset applied to each drift interval.
    pub drift_jitter: u64,
    /// First drift happens within this many ticks of spawning.
    pub first_drift_max: u64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            lifetime_min: 100,
            lifetime_max: 300,
            drift: vec![
                Vec2Fixed::new(Fixed::ZERO, Fixed::from_num(-0.1)),
                Vec2Fixed::new(Fixed::from_num(0.1), Fixed::ZERO),
            ],
            drift_interval: 12,
            drift_jitter: 2,
            first_drift_max: 10,
        }
    }
}

/// Timings consumed by presentation-side observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// Ticks a unit flashes after being hit.
    pub hit_flash_ticks: u64,
    /// Ticks per walk-cycle frame.
    pub walk_frame_ticks: u64,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            hit_flash_ticks: 8,
            walk_frame_ticks: 15,
        }
    }
}

/// Complete simulation tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// World extent, fixed for the session.
    pub world: WorldBounds,
    /// Seed for cosmetic randomness and random spawns.
    pub seed: u32,
    /// Health every unit starts with.
    pub starting_health: u32,
    /// Player distance per tick.
    #[serde(with = "fixed_decimal")]
    pub player_speed: Fixed,
    /// Enemy distance per tick.
    #[serde(with = "fixed_decimal")]
    pub enemy_speed: Fixed,
    /// Minimum ticks between two shots of the same unit.
    pub shot_cooldown: u64,
    /// Minimum ticks between two path searches of the same enemy.
    pub path_update_delay: u64,
    /// Projectile-vs-unit hit distance.
    #[serde(with = "fixed_decimal")]
    pub collision_radius: Fixed,
    /// Projectile tuning.
    pub fireball: FireballConfig,
    /// Contact damage tuning.
    pub melee: MeleeConfig,
    /// Particle tuning.
    pub particles: ParticleConfig,
    /// Presentation timings.
    pub presentation: PresentationConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world: WorldBounds::default(),
            seed: 0x5EED,
            starting_health: 100,
            player_speed: Fixed::from_num(0.1),
            enemy_speed: Fixed::from_num(0.03),
            shot_cooldown: 15,
            path_update_delay: 30,
            collision_radius: Fixed::ONE,
            fireball: FireballConfig::default(),
            melee: MeleeConfig::default(),
            particles: ParticleConfig::default(),
            presentation: PresentationConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate a configuration from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ConfigParse`] for malformed RON and
    /// [`GameError::InvalidConfig`] for values [`validate`](Self::validate)
    /// rejects.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Self::parse(text, "<inline>")
    }

    /// Read, parse and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ConfigIo`] if the file cannot be read, plus the
    /// errors of [`from_ron_str`](Self::from_ron_str).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GameError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::parse(&text, &path.display().to_string())?;
        tracing::info!(path = %path.display(), "Loaded simulation config");
        Ok(config)
    }

    fn parse(text: &str, origin: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| GameError::ConfigParse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as pretty RON.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if serialization fails.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize config: {e}")))
    }

    /// Check that every value can drive a simulation.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.world.width == 0 || self.world.height == 0 {
            return Err(GameError::InvalidConfig(format!(
                "world must be non-empty, got {}x{}",
                self.world.width, self.world.height
            )));
        }

        let positive = [
            ("player_speed", self.player_speed),
            ("enemy_speed", self.enemy_speed),
            ("collision_radius", self.collision_radius),
            ("fireball.velocity", self.fireball.velocity),
            ("fireball.range", self.fireball.range),
            ("melee.radius", self.melee.radius),
        ];
        for (name, value) in positive {
            if value <= Fixed::ZERO {
                return Err(GameError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        if self.fireball.trail_min > self.fireball.trail_max {
            return Err(GameError::InvalidConfig(
                "fireball.trail_min exceeds fireball.trail_max".into(),
            ));
        }
        if self.particles.lifetime_min == 0
            || self.particles.lifetime_min > self.particles.lifetime_max
        {
            return Err(GameError::InvalidConfig(format!(
                "particle lifetime range {}..={} is invalid",
                self.particles.lifetime_min, self.particles.lifetime_max
            )));
        }
        if self.particles.drift_jitter > self.particles.drift_interval {
            return Err(GameError::InvalidConfig(
                "particles.drift_jitter exceeds particles.drift_interval".into(),
            ));
        }
        if self.fireball.animation_period == 0 || self.fireball.trail_cadence == 0 {
            return Err(GameError::InvalidConfig(
                "fireball animation_period and trail_cadence must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
