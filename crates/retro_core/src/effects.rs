//! Cosmetic particles: impact bursts, projectile trails and drift.
//!
//! Particles take no part in collision and are never clamped to the
//! world. They still live in simulation state because their schedule
//! draws from the seeded RNG.

use crate::components::{Body, Particle, SpriteTile};
use crate::config::{FireballConfig, ParticleConfig};
use crate::math::{Fixed, Vec2Fixed};
use crate::random::SeededRandom;
use crate::storage::{EntityStorage, IdAllocator};

/// Everything needed to spawn particles.
pub struct ParticleSpawner<'a> {
    /// Destination collection.
    pub particles: &'a mut EntityStorage<Particle>,
    /// Shared id source.
    pub ids: &'a mut IdAllocator,
    /// Shared RNG.
    pub rng: &'a mut SeededRandom,
    /// Particle tuning.
    pub config: &'a ParticleConfig,
    /// Health stamped on new particles; fixed for their whole life.
    pub health: u32,
    /// Current tick.
    pub tick: u64,
}

impl ParticleSpawner<'_> {
    /// Spawn `count` particles scattered within `spread` of `center`.
    pub fn burst(&mut self, center: Vec2Fixed, spread: Fixed, count: u32) {
        for _ in 0..count {
            let offset = Vec2Fixed::new(
                self.rng.fixed_range(-spread, spread),
                self.rng.fixed_range(-spread, spread),
            );
            let lifetime = self.rng.range_inclusive(
                i64::from(self.config.lifetime_min),
                i64::from(self.config.lifetime_max),
            ) as u32;
            let first_drift = self
                .rng
                .range_inclusive(0, self.config.first_drift_max as i64) as u64;

            self.particles.insert(
                self.ids,
                Particle {
                    id: 0,
                    body: Body::new(center + offset, self.health, SpriteTile::default()),
                    lifetime,
                    next_move_tick: self.tick + first_drift,
                },
            );
        }
    }

    /// Spawn the burst for a destroyed projectile.
    pub fn impact(&mut self, center: Vec2Fixed, fireball: &FireballConfig) {
        tracing::trace!(x = %center.x, y = %center.y, "Projectile impact");
        self.burst(center, fireball.impact_spread, fireball.impact_particles);
    }

    /// Spawn a trail puff behind a projectile, on cadence ticks only.
    pub fn trail(&mut self, center: Vec2Fixed, fireball: &FireballConfig) {
        if self.tick % fireball.trail_cadence != 0 {
            return;
        }
        let count = self.rng.range_inclusive(
            i64::from(fireball.trail_min),
            i64::from(fireball.trail_max),
        ) as u32;
        self.burst(center, fireball.trail_spread, count);
    }
}

/// Advance one particle by a tick.
///
/// Expired particles are left untouched. Live ones lose one tick of
/// lifetime and, once their drift time arrives, step by a random drift
/// vector and schedule the next drift `interval ± jitter` ticks out.
pub fn update_particle(
    particle: &mut Particle,
    rng: &mut SeededRandom,
    config: &ParticleConfig,
    tick: u64,
) {
    if !particle.is_live() {
        return;
    }

    particle.lifetime -= 1;

    if tick >= particle.next_move_tick {
        if let Some(&drift) = rng.pick(&config.drift) {
            particle.body.position += drift;
        }
        let jitter = config.drift_jitter as i64;
        let offset = rng.range_inclusive(-jitter, jitter);
        let interval = (config.drift_interval as i64 + offset).max(0) as u64;
        particle.next_move_tick = tick + interval;
    }
}
