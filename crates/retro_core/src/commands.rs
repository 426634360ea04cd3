//! Tick commands and their execution.
//!
//! Every mutation of a [`GameState`] during a tick goes through a
//! [`SimCommand`]. Commands hold entity handles, never references; a
//! handle that no longer resolves turns the command into a no-op.

use std::collections::VecDeque;

use crate::combat::{self, HitSource};
use crate::components::{Body, EntityId, Projectile, UnitKind, FIREBALL_FRAMES};
use crate::effects::{self, ParticleSpawner};
use crate::math::Vec2Fixed;
use crate::pathfinding::find_path;
use crate::simulation::{GameState, TickEvents};
use crate::world::WorldBounds;

/// Intents that can be queued for the next tick from outside the input
/// provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Move a unit one step in a direction.
    Move {
        /// Unit handle.
        unit: EntityId,
        /// Requested direction; zero means stand still.
        direction: Vec2Fixed,
    },
    /// Fire a projectile from a unit.
    Shoot {
        /// Unit handle.
        unit: EntityId,
    },
}

impl From<Intent> for SimCommand {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::Move { unit, direction } => Self::MoveUnit { unit, direction },
            Intent::Shoot { unit } => Self::Shoot { unit },
        }
    }
}

/// A single simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimCommand {
    /// Fire a projectile from a unit, subject to its cooldown.
    Shoot {
        /// Unit handle.
        unit: EntityId,
    },
    /// Move a unit at its speed, or stop it on a zero direction.
    MoveUnit {
        /// Unit handle.
        unit: EntityId,
        /// Requested direction.
        direction: Vec2Fixed,
    },
    /// Refresh paths and step every enemy toward the player.
    PursuePlayer,
    /// Apply enemy contact damage to the player.
    MeleeContact,
    /// Move one projectile and resolve what it runs into.
    AdvanceProjectile {
        /// Projectile handle.
        projectile: EntityId,
    },
    /// Age and drift every particle.
    UpdateParticles,
    /// Remove spent projectiles.
    CompactProjectiles,
    /// Remove expired particles.
    CompactParticles,
    /// Remove destroyed units.
    CompactUnits,
}

/// FIFO list of commands for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandQueue {
    commands: VecDeque<SimCommand>,
}

impl CommandQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command.
    pub fn push(&mut self, command: SimCommand) {
        self.commands.push_back(command);
    }

    /// Take the next command.
    pub fn pop(&mut self) -> Option<SimCommand> {
        self.commands.pop_front()
    }

    /// Number of commands still queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate queued commands in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &SimCommand> {
        self.commands.iter()
    }
}

/// What a projectile runs into on its next step.
enum Flight {
    /// Left the world or its range.
    Expired,
    /// Reached a unit.
    Hit(EntityId),
    /// Nothing in the way.
    Clear(Vec2Fixed),
}

/// Particle effect emitted by a projectile.
#[derive(Clone, Copy)]
enum Puff {
    Impact,
    Trail,
}

impl GameState {
    /// Run one command against the current tick.
    ///
    /// [`step`](Self::step) calls this for every planned command; tooling
    /// may call it directly to drive single commands.
    pub fn execute(&mut self, command: SimCommand, events: &mut TickEvents) {
        match command {
            SimCommand::Shoot { unit } => {
                if let Some(projectile) = self.shoot(unit) {
                    events.projectiles_fired.push(projectile);
                }
            }
            SimCommand::MoveUnit { unit, direction } => self.move_unit(unit, direction),
            SimCommand::PursuePlayer => self.pursue_player(events),
            SimCommand::MeleeContact => self.melee_contact(events),
            SimCommand::AdvanceProjectile { projectile } => {
                self.advance_projectile(projectile, events);
            }
            SimCommand::UpdateParticles => {
                let tick = self.tick;
                for particle in self.particles.iter_mut() {
                    effects::update_particle(particle, &mut self.rng, &self.config.particles, tick);
                }
            }
            SimCommand::CompactProjectiles => {
                let removed = self.projectiles.compact(Projectile::is_live);
                events.projectiles_removed.extend(removed);
            }
            SimCommand::CompactParticles => {
                events.particles_expired += self.particles.compact(|p| p.is_live()).len();
            }
            SimCommand::CompactUnits => {
                let removed = self.units.compact(|u| !u.body.is_destroyed());
                for &unit in &removed {
                    if unit == self.player {
                        tracing::info!(unit, tick = self.tick, "Player destroyed");
                    } else {
                        tracing::info!(unit, tick = self.tick, "Enemy destroyed");
                    }
                }
                events.units_destroyed.extend(removed);
            }
        }
    }

    fn move_unit(&mut self, id: EntityId, direction: Vec2Fixed) {
        let bounds = self.bounds;
        let Some(unit) = self.units.get_mut(id) else {
            return;
        };
        if unit.body.is_destroyed() {
            return;
        }

        match direction.try_normalize() {
            Some(dir) => {
                unit.body.position = bounds.clamp(unit.body.position + dir * unit.actor.speed);
                unit.actor.orientation = dir;
                unit.actor.is_moving = true;
                self.observers.notify_move(unit, direction);
            }
            None => {
                unit.actor.is_moving = false;
                self.observers.notify_stop(unit);
            }
        }
    }

    /// Spawn a projectile from `id`, returning its handle.
    fn shoot(&mut self, id: EntityId) -> Option<EntityId> {
        let tick = self.tick;
        let cooldown = self.config.shot_cooldown;
        let unit = self.units.get_mut(id)?;
        if unit.body.is_destroyed() || tick.saturating_sub(unit.actor.last_bullet_tick) < cooldown {
            return None;
        }
        let direction = unit.actor.orientation.try_normalize()?;
        unit.actor.last_bullet_tick = tick;

        let fireball = &self.config.fireball;
        let start = unit.body.position + direction * (unit.actor.speed * fireball.spawn_offset);
        let projectile = Projectile {
            id: 0,
            body: Body::new(start, self.config.starting_health, FIREBALL_FRAMES[0]),
            direction,
            start_position: start,
            velocity: fireball.velocity,
            range: fireball.range,
            damage: fireball.damage,
            owner: id,
            frame: 0,
        };
        let projectile = self.projectiles.insert(&mut self.ids, projectile);
        tracing::trace!(projectile, owner = id, tick, "Projectile fired");
        Some(projectile)
    }

    fn pursue_player(&mut self, events: &mut TickEvents) {
        let target = self
            .player()
            .filter(|p| !p.body.is_destroyed())
            .map(|p| WorldBounds::cell_of(p.body.position));
        let tick = self.tick;
        let delay = self.config.path_update_delay;
        let bounds = self.bounds;

        for id in self.units.ids() {
            let Some(unit) = self.units.get_mut(id) else {
                continue;
            };
            if unit.body.is_destroyed() {
                continue;
            }
            let position = unit.body.position;
            let speed = unit.actor.speed;
            let UnitKind::Enemy(pursuit) = &mut unit.kind else {
                continue;
            };

            if let Some(goal) = target {
                if tick.saturating_sub(pursuit.last_path_update_tick) >= delay {
                    let start = WorldBounds::cell_of(position);
                    pursuit.path = find_path(&bounds, start, goal);
                    pursuit.last_path_update_tick = tick;
                    events.paths_recomputed.push(id);
                    tracing::debug!(
                        enemy = id,
                        ?start,
                        ?goal,
                        steps = pursuit.path.len(),
                        "Path recomputed"
                    );
                }
            }

            let Some(&waypoint) = pursuit.path.first() else {
                unit.actor.is_moving = false;
                self.observers.notify_stop(unit);
                continue;
            };

            let waypoint = waypoint.to_world();
            let delta = waypoint - position;
            if delta.length() < speed {
                pursuit.path.remove(0);
                unit.body.position = waypoint;
            } else if let Some(dir) = delta.try_normalize() {
                unit.body.position = bounds.clamp(position + dir * speed);
                unit.actor.orientation = dir;
            }

            if delta.is_zero() {
                unit.actor.is_moving = false;
                self.observers.notify_stop(unit);
            } else {
                unit.actor.is_moving = true;
                self.observers.notify_move(unit, delta);
            }
        }
    }

    fn melee_contact(&mut self, events: &mut TickEvents) {
        let Some(player) = self.player().filter(|p| !p.body.is_destroyed()) else {
            return;
        };
        let player_position = player.body.position;
        let radius = self.config.melee.radius;

        let contact = self
            .units
            .iter()
            .filter(|u| u.kind.is_enemy() && !u.body.is_destroyed())
            .find(|u| player_position.distance(u.body.position) < radius)
            .map(|u| (u.id, u.body.position));
        let Some((enemy, enemy_position)) = contact else {
            return;
        };

        let push = combat::melee_push_direction(player_position, enemy_position);
        let melee = &self.config.melee;
        let bounds = self.bounds;
        let tick = self.tick;
        let Some(unit) = self.units.get_mut(self.player) else {
            return;
        };
        if let Some(hit) = combat::apply_hit(
            unit,
            &bounds,
            HitSource::Melee { enemy },
            melee.damage,
            push,
            melee.knockback,
            tick,
        ) {
            tracing::debug!(enemy, health = unit.body.health, "Melee contact");
            events.hits.push(hit);
        }
    }

    fn advance_projectile(&mut self, id: EntityId, events: &mut TickEvents) {
        let Some(projectile) = self.projectiles.get(id).filter(|p| p.is_live()) else {
            return;
        };
        let position = projectile.body.position;
        let direction = projectile.direction;
        let owner = projectile.owner;
        let damage = projectile.damage;
        let next = position + direction * projectile.velocity;

        let flight = if !self.bounds.contains(next)
            || next.distance(projectile.start_position) >= projectile.range
        {
            Flight::Expired
        } else if let Some(target) = combat::find_unit_at(
            &self.units,
            next,
            self.config.collision_radius,
            Some(owner),
        ) {
            Flight::Hit(target)
        } else {
            Flight::Clear(next)
        };

        match flight {
            Flight::Expired | Flight::Hit(_) => {
                if let Flight::Hit(target) = flight {
                    self.resolve_projectile_hit(id, owner, target, damage, direction, events);
                }
                if let Some(projectile) = self.projectiles.get_mut(id) {
                    projectile.body.health = 0;
                }
                self.emit_particles(position, Puff::Impact);
            }
            Flight::Clear(next) => {
                let tick = self.tick;
                let period = self.config.fireball.animation_period;
                if let Some(projectile) = self.projectiles.get_mut(id) {
                    projectile.body.position = next;
                    if tick % period == 0 {
                        projectile.next_frame();
                    }
                }
                self.emit_particles(next, Puff::Trail);
            }
        }
    }

    fn resolve_projectile_hit(
        &mut self,
        projectile: EntityId,
        owner: EntityId,
        target: EntityId,
        damage: u32,
        direction: Vec2Fixed,
        events: &mut TickEvents,
    ) {
        let bounds = self.bounds;
        let knockback = self.config.fireball.knockback;
        let tick = self.tick;
        let Some(unit) = self.units.get_mut(target) else {
            return;
        };
        if let Some(hit) = combat::apply_hit(
            unit,
            &bounds,
            HitSource::Projectile { projectile, owner },
            damage,
            direction,
            knockback,
            tick,
        ) {
            tracing::debug!(projectile, target, health = unit.body.health, "Projectile hit");
            events.hits.push(hit);
        }
    }

    fn emit_particles(&mut self, center: Vec2Fixed, puff: Puff) {
        let mut spawner = ParticleSpawner {
            particles: &mut self.particles,
            ids: &mut self.ids,
            rng: &mut self.rng,
            config: &self.config.particles,
            health: self.config.starting_health,
            tick: self.tick,
        };
        match puff {
            Puff::Impact => spawner.impact(center, &self.config.fireball),
            Puff::Trail => spawner.trail(center, &self.config.fireball),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::math::Fixed;
    use crate::observer::{EventLog, MotionEvent};
    use crate::simulation::TickIntents;
    use crate::world::GridCell;

    fn fx(n: f64) -> Fixed {
        Fixed::from_num(n)
    }

    fn arena(player: Vec2Fixed) -> GameState {
        GameState::with_player(SimConfig::default(), player).unwrap()
    }

    #[test]
    fn test_move_with_extreme_direction_steps_at_speed() {
        let mut state = arena(Vec2Fixed::from_ints(5, 4));
        let player = state.player_id();
        let log = EventLog::new();
        state.add_observer(Box::new(log.clone()));
        let mut events = TickEvents::default();

        let direction = Vec2Fixed::new(Fixed::MIN, Fixed::ZERO);
        state.execute(SimCommand::MoveUnit { unit: player, direction }, &mut events);

        let unit = state.player().unwrap();
        assert!(unit.body.position.x < fx(5.0) && unit.body.position.x > fx(4.89));
        assert_eq!(unit.body.position.y, fx(4.0));
        assert!(unit.actor.orientation.x < Fixed::ZERO);
        assert_eq!(
            log.events(),
            vec![MotionEvent::Moved { unit: player, direction }]
        );

        let direction = Vec2Fixed::new(Fixed::MAX, Fixed::MIN);
        state.execute(SimCommand::MoveUnit { unit: player, direction }, &mut events);
        assert!(state.bounds().contains(state.player().unwrap().body.position));
    }

    #[test]
    fn test_shoot_respects_cooldown() {
        let mut state = arena(Vec2Fixed::from_ints(5, 4));
        let player = state.player_id();
        let mut events = TickEvents::default();

        state.tick = 14;
        state.execute(SimCommand::Shoot { unit: player }, &mut events);
        assert!(events.projectiles_fired.is_empty(), "first shot waits one cooldown");

        state.tick = 20;
        state.execute(SimCommand::Shoot { unit: player }, &mut events);
        state.execute(SimCommand::Shoot { unit: player }, &mut events);
        assert_eq!(events.projectiles_fired.len(), 1);

        state.tick = 34;
        state.execute(SimCommand::Shoot { unit: player }, &mut events);
        assert_eq!(events.projectiles_fired.len(), 1);

        state.tick = 35;
        state.execute(SimCommand::Shoot { unit: player }, &mut events);
        assert_eq!(events.projectiles_fired.len(), 2);
        assert_eq!(state.projectiles().len(), 2);
    }

    #[test]
    fn test_projectile_spawns_on_firer_along_orientation() {
        let mut state = arena(Vec2Fixed::from_ints(5, 4));
        state.tick = 15;
        state.step(TickIntents::moving(Vec2Fixed::from_ints(0, -1)));
        let events = state.step(TickIntents::firing());
        let id = events.projectiles_fired[0];

        let projectile = state.projectile(id).unwrap();
        let player = state.player().unwrap();
        assert_eq!(projectile.start_position, player.body.position);
        assert_eq!(projectile.body.position, projectile.start_position, "not advanced on its first tick");
        assert_eq!(projectile.direction, Vec2Fixed::new(Fixed::ZERO, -Fixed::ONE));
        assert_eq!(projectile.owner, player.id);
        assert_eq!(projectile.body.health, 100);
    }

    #[test]
    fn test_destroyed_unit_can_not_shoot() {
        let mut state = arena(Vec2Fixed::from_ints(5, 4));
        let player = state.player_id();
        state.unit_mut(player).unwrap().body.health = 0;
        state.tick = 100;

        let mut events = TickEvents::default();
        state.execute(SimCommand::Shoot { unit: player }, &mut events);
        assert!(events.projectiles_fired.is_empty());
    }

    #[test]
    fn test_projectile_hits_enemy_but_not_firer() {
        let mut state = arena(Vec2Fixed::from_ints(2, 2));
        let enemy = state.spawn_enemy_at(Vec2Fixed::from_ints(4, 2)).unwrap();
        let player = state.player_id();
        state.tick = 15;
        state.step(TickIntents::firing());

        let mut hits = Vec::new();
        for _ in 0..10 {
            hits.extend(state.step(TickIntents::IDLE).hits);
        }

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, enemy);
        assert_eq!(hits[0].damage, 25);
        assert!(matches!(hits[0].source, HitSource::Projectile { owner, .. } if owner == player));

        let enemy = state.unit(enemy).unwrap();
        assert_eq!(enemy.body.health, 75);
        assert_eq!(enemy.body.position, Vec2Fixed::from_ints(5, 2));
        assert_eq!(state.player().unwrap().body.health, 100);
        assert!(state.projectiles().is_empty());
        assert!(state.particles().len() >= 25, "impact burst");
    }

    #[test]
    fn test_projectile_expires_at_range() {
        let mut config = SimConfig::default();
        config.fireball.range = Fixed::ONE;
        let mut state = GameState::with_player(config, Vec2Fixed::from_ints(2, 2)).unwrap();
        state.tick = 15;
        state.step(TickIntents::firing());

        let mut removed = Vec::new();
        for _ in 0..8 {
            let events = state.step(TickIntents::IDLE);
            assert!(events.hits.is_empty());
            removed.extend(events.projectiles_removed);
        }
        assert_eq!(removed.len(), 1);
        assert!(state.projectiles().is_empty());
    }

    #[test]
    fn test_projectile_leaving_world_is_spent_immediately() {
        let mut state = arena(Vec2Fixed::new(fx(15.9), fx(2.0)));
        state.tick = 15;
        let fired = state.step(TickIntents::firing()).projectiles_fired[0];
        let before = state.particles().len();

        let events = state.step(TickIntents::IDLE);
        assert_eq!(events.projectiles_removed, vec![fired]);
        assert_eq!(state.particles().len(), before + 25);
    }

    #[test]
    fn test_projectile_animates_on_period() {
        let mut state = arena(Vec2Fixed::from_ints(0, 8));
        state.tick = 19;
        let fired = state.step(TickIntents::firing()).projectiles_fired[0];
        assert_eq!(state.projectile(fired).unwrap().frame, 0);

        // Tick 20 is on the animation period.
        state.step(TickIntents::IDLE);
        let projectile = state.projectile(fired).unwrap();
        assert_eq!(projectile.frame, 1);
        assert_eq!(projectile.body.sprite_tile, FIREBALL_FRAMES[1]);
    }

    #[test]
    fn test_melee_hits_once_per_tick() {
        let mut state = arena(Vec2Fixed::from_ints(5, 5));
        let first = state.spawn_enemy_at(Vec2Fixed::new(fx(5.5), fx(5.0))).unwrap();
        state.spawn_enemy_at(Vec2Fixed::new(fx(5.0), fx(5.5))).unwrap();
        state.tick = 9;

        let mut events = TickEvents::default();
        state.execute(SimCommand::MeleeContact, &mut events);

        assert_eq!(events.hits.len(), 1);
        assert_eq!(events.hits[0].source, HitSource::Melee { enemy: first });
        let player = state.player().unwrap();
        assert_eq!(player.body.health, 95);
        assert_eq!(player.body.last_hit_tick, 9);
        assert_eq!(player.body.position, Vec2Fixed::from_ints(4, 5));
    }

    #[test]
    fn test_melee_radius_is_exclusive() {
        let mut state = arena(Vec2Fixed::from_ints(5, 5));
        state.spawn_enemy_at(Vec2Fixed::from_ints(6, 5)).unwrap();

        let mut events = TickEvents::default();
        state.execute(SimCommand::MeleeContact, &mut events);
        assert!(events.hits.is_empty());
    }

    #[test]
    fn test_pursuit_recomputes_on_delay_and_steps() {
        let mut state = arena(Vec2Fixed::from_ints(5, 4));
        let enemy = state.spawn_enemy_at(Vec2Fixed::from_ints(8, 4)).unwrap();
        let log = EventLog::new();
        state.add_observer(Box::new(log.clone()));
        state.tick = 30;

        let mut events = TickEvents::default();
        state.execute(SimCommand::PursuePlayer, &mut events);
        assert_eq!(events.paths_recomputed, vec![enemy]);

        let unit = state.unit(enemy).unwrap();
        assert_eq!(
            unit.pursuit().unwrap().path,
            vec![GridCell::new(7, 4), GridCell::new(6, 4), GridCell::new(5, 4)]
        );
        assert_eq!(unit.body.position, Vec2Fixed::new(fx(8.0) - fx(0.03), fx(4.0)));
        assert!(unit.actor.is_moving);
        assert_eq!(
            log.events(),
            vec![MotionEvent::Moved {
                unit: enemy,
                direction: Vec2Fixed::from_ints(-1, 0)
            }]
        );

        state.tick = 31;
        let mut events = TickEvents::default();
        state.execute(SimCommand::PursuePlayer, &mut events);
        assert!(events.paths_recomputed.is_empty(), "rate limited");
    }

    #[test]
    fn test_pursuit_snaps_to_close_waypoint() {
        let mut state = arena(Vec2Fixed::from_ints(5, 4));
        let enemy = state.spawn_enemy_at(Vec2Fixed::new(fx(7.01), fx(4.0))).unwrap();
        if let Some(unit) = state.unit_mut(enemy) {
            if let UnitKind::Enemy(pursuit) = &mut unit.kind {
                pursuit.path = vec![GridCell::new(7, 4), GridCell::new(6, 4)];
            }
        }

        let mut events = TickEvents::default();
        state.execute(SimCommand::PursuePlayer, &mut events);

        let unit = state.unit(enemy).unwrap();
        assert_eq!(unit.body.position, Vec2Fixed::from_ints(7, 4));
        assert_eq!(unit.pursuit().unwrap().path, vec![GridCell::new(6, 4)]);
    }

    #[test]
    fn test_enemy_holds_without_player() {
        let mut state = arena(Vec2Fixed::from_ints(5, 4));
        let enemy = state.spawn_enemy_at(Vec2Fixed::from_ints(9, 9)).unwrap();
        let player = state.player_id();
        state.unit_mut(player).unwrap().body.health = 0;
        state.step(TickIntents::IDLE);
        assert!(state.player().is_none());

        let log = EventLog::new();
        state.add_observer(Box::new(log.clone()));
        state.tick = 60;
        let events = state.step(TickIntents::moving(Vec2Fixed::UNIT_X));

        assert!(events.paths_recomputed.is_empty());
        assert_eq!(state.unit(enemy).unwrap().body.position, Vec2Fixed::from_ints(9, 9));
        assert_eq!(log.events(), vec![MotionEvent::Stopped { unit: enemy }]);
    }

    #[test]
    fn test_compaction_reports_destroyed_units() {
        let mut state = arena(Vec2Fixed::from_ints(5, 4));
        let enemy = state.spawn_enemy_at(Vec2Fixed::from_ints(9, 9)).unwrap();
        state.unit_mut(enemy).unwrap().body.health = 0;

        let events = state.step(TickIntents::IDLE);
        assert_eq!(events.units_destroyed, vec![enemy]);
        assert!(state.unit(enemy).is_none());
        assert_eq!(state.units().len(), 1);
    }

    #[test]
    fn test_stale_handles_are_ignored() {
        let mut state = arena(Vec2Fixed::from_ints(5, 4));
        let mut events = TickEvents::default();
        state.execute(SimCommand::MoveUnit { unit: 999, direction: Vec2Fixed::UNIT_X }, &mut events);
        state.execute(SimCommand::Shoot { unit: 999 }, &mut events);
        state.execute(SimCommand::AdvanceProjectile { projectile: 999 }, &mut events);
        assert_eq!(events, TickEvents::default());
    }
}
