//! Simulation state and the tick driver.
//!
//! [`GameState`] owns every entity and advances them one tick at a time
//! through [`GameState::step`]. A tick is planned as an ordered
//! [`CommandQueue`] and executed front to back; see [`GameState::plan_tick`]
//! for the order.
//!
//! # Determinism
//!
//! - Fixed-point math only (see [`crate::math`])
//! - Randomness comes from one seeded RNG owned by the state
//! - Entities are visited in storage (insertion) order
//! - Same config and intents always produce the same state hash
//!
//! # Example
//!
//! ```
//! use retro_core::config::SimConfig;
//! use retro_core::math::Vec2Fixed;
//! use retro_core::simulation::{GameState, TickIntents};
//!
//! let mut state = GameState::new_default(SimConfig::default()).unwrap();
//! state.step(TickIntents::moving(Vec2Fixed::from_ints(1, 0)));
//! assert_eq!(state.tick(), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::combat::HitEvent;
use crate::commands::{CommandQueue, Intent, SimCommand};
use crate::components::{EntityId, Particle, Projectile, Unit};
use crate::config::SimConfig;
use crate::error::{GameError, Result};
use crate::math::Vec2Fixed;
use crate::observer::{ObserverRegistry, UnitObserver};
use crate::random::SeededRandom;
use crate::storage::{EntityStorage, IdAllocator};
use crate::world::WorldBounds;

/// Player starting position in the classic arena.
pub const DEFAULT_PLAYER_START: (i32, i32) = (5, 4);

/// Enemy starting positions in the classic arena.
pub const DEFAULT_ENEMY_STARTS: [(i32, i32); 4] = [(14, 14), (2, 14), (7, 12), (10, 1)];

/// Attempts made by [`GameState::spawn_enemy_random`] before giving up.
const RANDOM_SPAWN_ATTEMPTS: u32 = 256;

/// Intents supplied once per tick by the input provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickIntents {
    /// Requested player movement. Magnitude is ignored; zero means stand still.
    pub move_direction: Vec2Fixed,
    /// Whether the player wants to fire.
    pub fire: bool,
}

impl TickIntents {
    /// No movement, no shot.
    pub const IDLE: Self = Self {
        move_direction: Vec2Fixed::ZERO,
        fire: false,
    };

    /// Move without firing.
    #[must_use]
    pub const fn moving(direction: Vec2Fixed) -> Self {
        Self {
            move_direction: direction,
            fire: false,
        }
    }

    /// Fire without moving.
    #[must_use]
    pub const fn firing() -> Self {
        Self {
            move_direction: Vec2Fixed::ZERO,
            fire: true,
        }
    }
}

/// Events generated during a simulation tick.
///
/// Useful to the presentation layer for sounds and effects, and to tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Projectiles spawned this tick.
    pub projectiles_fired: Vec<EntityId>,
    /// Hits applied this tick, in resolution order.
    pub hits: Vec<HitEvent>,
    /// Enemies that searched for a new path this tick.
    pub paths_recomputed: Vec<EntityId>,
    /// Projectiles removed by compaction.
    pub projectiles_removed: Vec<EntityId>,
    /// Particles removed by compaction.
    pub particles_expired: usize,
    /// Units removed by compaction.
    pub units_destroyed: Vec<EntityId>,
}

/// Complete simulation state for one session.
///
/// Created once at session start and only mutated by [`step`](Self::step)
/// (or by [`execute`](Self::execute) for tooling that drives single
/// commands).
pub struct GameState {
    /// Current simulation tick.
    pub(crate) tick: u64,
    /// Tuning values.
    pub(crate) config: SimConfig,
    /// World extent, copied out of the config.
    pub(crate) bounds: WorldBounds,
    /// Shared id source for all collections.
    pub(crate) ids: IdAllocator,
    /// Handle of the player unit.
    pub(crate) player: EntityId,
    /// Units; the player is inserted first.
    pub(crate) units: EntityStorage<Unit>,
    /// Projectiles in flight (and spent ones awaiting compaction).
    pub(crate) projectiles: EntityStorage<Projectile>,
    /// Cosmetic particles.
    pub(crate) particles: EntityStorage<Particle>,
    /// Seeded RNG for cosmetics and random spawns.
    pub(crate) rng: SeededRandom,
    /// Movement observers.
    pub(crate) observers: ObserverRegistry,
    /// Intents queued for the next tick.
    pub(crate) pending: Vec<Intent>,
}

impl GameState {
    /// Create a session with only the player, at `player_start`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if the config does not validate
    /// and [`GameError::InvalidState`] if `player_start` is outside the
    /// world.
    pub fn with_player(config: SimConfig, player_start: Vec2Fixed) -> Result<Self> {
        config.validate()?;
        let bounds = config.world;
        if !bounds.contains(player_start) {
            return Err(GameError::InvalidState(format!(
                "player start ({}, {}) is outside the {}x{} world",
                player_start.x, player_start.y, bounds.width, bounds.height
            )));
        }

        let mut ids = IdAllocator::new();
        let mut units = EntityStorage::new();
        let player = units.insert(
            &mut ids,
            Unit::player(player_start, config.starting_health, config.player_speed),
        );
        let rng = SeededRandom::new(config.seed);

        Ok(Self {
            tick: 0,
            bounds,
            ids,
            player,
            units,
            projectiles: EntityStorage::new(),
            particles: EntityStorage::new(),
            rng,
            observers: ObserverRegistry::new(),
            pending: Vec::new(),
            config,
        })
    }

    /// Create the classic opening: the player plus four enemies.
    ///
    /// # Errors
    ///
    /// Same as [`with_player`](Self::with_player), plus
    /// [`GameError::InvalidState`] if the world is too small to hold the
    /// classic start positions.
    pub fn new_default(config: SimConfig) -> Result<Self> {
        let (px, py) = DEFAULT_PLAYER_START;
        let mut state = Self::with_player(config, Vec2Fixed::from_ints(px, py))?;
        for (x, y) in DEFAULT_ENEMY_STARTS {
            state.spawn_enemy_at(Vec2Fixed::from_ints(x, y))?;
        }
        Ok(state)
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Tuning values in effect.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// World extent.
    #[must_use]
    pub fn bounds(&self) -> &WorldBounds {
        &self.bounds
    }

    /// Handle of the player unit. It stops resolving once the player has
    /// been destroyed and compacted.
    #[must_use]
    pub const fn player_id(&self) -> EntityId {
        self.player
    }

    /// The player unit, if it still exists.
    #[must_use]
    pub fn player(&self) -> Option<&Unit> {
        self.units.get(self.player)
    }

    /// All units, player first.
    #[must_use]
    pub fn units(&self) -> &EntityStorage<Unit> {
        &self.units
    }

    /// All projectiles, including spent ones not yet compacted.
    #[must_use]
    pub fn projectiles(&self) -> &EntityStorage<Projectile> {
        &self.projectiles
    }

    /// All particles, including expired ones not yet compacted.
    #[must_use]
    pub fn particles(&self) -> &EntityStorage<Particle> {
        &self.particles
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// Mutable unit access for scenario setup between ticks.
    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.units.get_mut(id)
    }

    /// Look up a projectile.
    #[must_use]
    pub fn projectile(&self, id: EntityId) -> Option<&Projectile> {
        self.projectiles.get(id)
    }

    /// Iterate live projectiles, for drawing.
    pub fn live_projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter().filter(|p| p.is_live())
    }

    /// Iterate live particles, for drawing.
    pub fn live_particles(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.is_live())
    }

    /// Subscribe to movement notifications.
    pub fn add_observer(&mut self, observer: Box<dyn UnitObserver>) {
        self.observers.add(observer);
    }

    /// Queue an extra intent for the next tick.
    ///
    /// Queued intents run after the player's fire request and before the
    /// player's movement, in the order they were queued.
    pub fn queue_intent(&mut self, intent: Intent) {
        self.pending.push(intent);
    }

    /// Add an enemy at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if the position is outside the
    /// world.
    pub fn spawn_enemy_at(&mut self, position: Vec2Fixed) -> Result<EntityId> {
        if !self.bounds.contains(position) {
            return Err(GameError::InvalidState(format!(
                "enemy spawn ({}, {}) is outside the world",
                position.x, position.y
            )));
        }
        let id = self.units.insert(
            &mut self.ids,
            Unit::enemy(position, self.config.starting_health, self.config.enemy_speed),
        );
        tracing::info!(enemy = id, x = %position.x, y = %position.y, "Enemy spawned");
        Ok(id)
    }

    /// Add an enemy on a random cell that no live unit is touching.
    ///
    /// Returns `None` if no free cell turned up within a bounded number
    /// of attempts.
    pub fn spawn_enemy_random(&mut self) -> Option<EntityId> {
        let max_x = i64::from(self.bounds.width) - 1;
        let max_y = i64::from(self.bounds.height) - 1;

        for _ in 0..RANDOM_SPAWN_ATTEMPTS {
            let x = self.rng.range_inclusive(0, max_x) as i32;
            let y = self.rng.range_inclusive(0, max_y) as i32;
            let candidate = Vec2Fixed::from_ints(x, y);
            let occupied = crate::combat::find_unit_at(
                &self.units,
                candidate,
                self.config.collision_radius,
                None,
            )
            .is_some();
            if !occupied {
                return self.spawn_enemy_at(candidate).ok();
            }
        }

        tracing::warn!("No free cell found for a random enemy spawn");
        None
    }

    /// Build the ordered command list for the current tick.
    ///
    /// Order:
    /// 1. Player shot, if requested
    /// 2. Queued intents, in queue order
    /// 3. Player movement
    /// 4. Pursuit AI for every enemy (path update, then follow)
    /// 5. Melee contact
    /// 6. One advance per projectile existing now (new shots wait a tick)
    /// 7. Particle update
    /// 8. Compaction: projectiles, particles, then units
    ///
    /// Compaction runs last so every collision check in the tick sees the
    /// entities it collides with.
    pub fn plan_tick(&mut self, intents: TickIntents) -> CommandQueue {
        let mut queue = CommandQueue::new();

        if intents.fire {
            queue.push(SimCommand::Shoot { unit: self.player });
        }
        for intent in self.pending.drain(..) {
            queue.push(intent.into());
        }
        queue.push(SimCommand::MoveUnit {
            unit: self.player,
            direction: intents.move_direction,
        });
        queue.push(SimCommand::PursuePlayer);
        queue.push(SimCommand::MeleeContact);
        for projectile in self.projectiles.ids() {
            queue.push(SimCommand::AdvanceProjectile { projectile });
        }
        queue.push(SimCommand::UpdateParticles);
        queue.push(SimCommand::CompactProjectiles);
        queue.push(SimCommand::CompactParticles);
        queue.push(SimCommand::CompactUnits);

        queue
    }

    /// Advance the simulation by one tick.
    ///
    /// Plans the tick, runs every command in order, then increments the
    /// tick counter. Never fails; out-of-range outcomes are clamped or
    /// ignored by the individual commands.
    pub fn step(&mut self, intents: TickIntents) -> TickEvents {
        let mut events = TickEvents::default();
        let mut queue = self.plan_tick(intents);

        while let Some(command) = queue.pop() {
            self.execute(command, &mut events);
        }

        #[cfg(feature = "debug-validation")]
        self.validate_invariants();

        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    #[cfg(feature = "debug-validation")]
    fn validate_invariants(&self) {
        for unit in &self.units {
            assert!(
                self.bounds.contains(unit.body.position),
                "unit {} left the world",
                unit.id
            );
            assert!(!unit.body.is_destroyed(), "unit {} survived compaction", unit.id);
        }
        assert!(self.projectiles.iter().all(Projectile::is_live));
        assert!(self.particles.iter().all(Particle::is_live));
    }

    /// Calculate a hash of the current simulation state.
    ///
    /// Two sessions with identical state produce identical hashes. The
    /// hash uses the standard library's default hasher, whose output may
    /// change between Rust releases, so only compare hashes produced by the
    /// same build.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.rng.hash(&mut hasher);
        self.player.hash(&mut hasher);
        self.units.hash(&mut hasher);
        self.projectiles.hash(&mut hasher);
        self.particles.hash(&mut hasher);

        hasher.finish()
    }
}

impl std::fmt::Debug for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameState")
            .field("tick", &self.tick)
            .field("bounds", &self.bounds)
            .field("player", &self.player)
            .field("units", &self.units.len())
            .field("projectiles", &self.projectiles.len())
            .field("particles", &self.particles.len())
            .field("observers", &self.observers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Fixed;
    use crate::observer::{EventLog, MotionEvent};

    fn fx(n: f64) -> Fixed {
        Fixed::from_num(n)
    }

    fn classic() -> GameState {
        GameState::new_default(SimConfig::default()).unwrap()
    }

    #[test]
    fn test_classic_opening() {
        let state = classic();
        assert_eq!(state.tick(), 0);
        assert_eq!(state.units().len(), 5);

        let first = state.units().iter().next().unwrap();
        assert_eq!(first.id, state.player_id());
        assert!(first.kind.is_player());
        assert_eq!(first.body.position, Vec2Fixed::from_ints(5, 4));
        assert!(state.units().iter().skip(1).all(|u| u.kind.is_enemy()));
    }

    #[test]
    fn test_player_outside_world_rejected() {
        let err = GameState::with_player(SimConfig::default(), Vec2Fixed::from_ints(16, 0))
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
    }

    #[test]
    fn test_classic_opening_needs_room() {
        let config = SimConfig {
            world: WorldBounds::new(8, 8),
            ..SimConfig::default()
        };
        assert!(GameState::new_default(config).is_err());
    }

    #[test]
    fn test_tick_increments() {
        let mut state = classic();
        state.step(TickIntents::IDLE);
        assert_eq!(state.tick(), 1);
        state.step(TickIntents::IDLE);
        assert_eq!(state.tick(), 2);
    }

    #[test]
    fn test_plan_order() {
        let mut state = classic();
        state.queue_intent(Intent::Shoot { unit: 3 });
        let queue = state.plan_tick(TickIntents {
            move_direction: Vec2Fixed::UNIT_X,
            fire: true,
        });
        let commands: Vec<_> = queue.iter().copied().collect();
        let player = state.player_id();

        assert_eq!(
            commands,
            vec![
                SimCommand::Shoot { unit: player },
                SimCommand::Shoot { unit: 3 },
                SimCommand::MoveUnit {
                    unit: player,
                    direction: Vec2Fixed::UNIT_X
                },
                SimCommand::PursuePlayer,
                SimCommand::MeleeContact,
                SimCommand::UpdateParticles,
                SimCommand::CompactProjectiles,
                SimCommand::CompactParticles,
                SimCommand::CompactUnits,
            ]
        );
        assert!(state.pending.is_empty(), "queued intents are consumed");
    }

    #[test]
    fn test_observer_sees_player_move_and_stop() {
        let mut state = classic();
        let log = EventLog::new();
        state.add_observer(Box::new(log.clone()));
        let player = state.player_id();

        state.step(TickIntents::moving(Vec2Fixed::from_ints(0, 5)));
        state.step(TickIntents::IDLE);

        let player_events: Vec<_> = log
            .events()
            .into_iter()
            .filter(|e| match e {
                MotionEvent::Moved { unit, .. } | MotionEvent::Stopped { unit } => *unit == player,
            })
            .collect();
        assert_eq!(
            player_events,
            vec![
                MotionEvent::Moved {
                    unit: player,
                    direction: Vec2Fixed::from_ints(0, 5)
                },
                MotionEvent::Stopped { unit: player },
            ]
        );
        assert_eq!(
            state.player().unwrap().body.position,
            Vec2Fixed::new(fx(5.0), fx(4.0) + fx(0.1))
        );
    }

    #[test]
    fn test_spawn_enemy_random_avoids_units() {
        let mut state = classic();
        for _ in 0..10 {
            let id = state.spawn_enemy_random().unwrap();
            let pos = state.unit(id).unwrap().body.position;
            let crowded = state
                .units()
                .iter()
                .filter(|u| u.id != id)
                .any(|u| u.body.position.distance(pos) < Fixed::ONE);
            assert!(!crowded);
            assert!(state.bounds().contains(pos));
        }
    }

    #[test]
    fn test_spawn_enemy_random_gives_up_when_full() {
        let config = SimConfig {
            world: WorldBounds::new(1, 1),
            ..SimConfig::default()
        };
        let mut state = GameState::with_player(config, Vec2Fixed::ZERO).unwrap();
        assert!(state.spawn_enemy_random().is_none());
    }

    #[test]
    fn test_deterministic_hash() {
        let mut a = classic();
        let mut b = classic();
        for tick in 0..120 {
            let intents = TickIntents {
                move_direction: Vec2Fixed::from_ints(1, (tick % 3) - 1),
                fire: tick % 20 == 0,
            };
            a.step(intents);
            b.step(intents);
        }
        assert_eq!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_different_seeds_diverge_once_particles_exist() {
        let mut a = classic();
        let mut b = GameState::new_default(SimConfig {
            seed: 777,
            ..SimConfig::default()
        })
        .unwrap();
        for tick in 0..40 {
            let intents = TickIntents {
                move_direction: Vec2Fixed::ZERO,
                fire: tick == 20,
            };
            a.step(intents);
            b.step(intents);
        }
        assert_ne!(a.state_hash(), b.state_hash());
    }
}
