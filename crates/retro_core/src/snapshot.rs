//! Read-only, serializable view of a [`GameState`] for drawing and tooling.
//!
//! Positions are converted to `f32` here and only here; nothing in a
//! snapshot feeds back into the simulation.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, SpriteTile, Unit};
use crate::math::Vec2Fixed;
use crate::simulation::GameState;

/// Unit role as shown to a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitRole {
    /// The controlled unit.
    Player,
    /// A pursuer.
    Enemy,
}

/// A unit captured in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Unit handle.
    pub id: EntityId,
    /// Role.
    pub role: UnitRole,
    /// World position.
    pub position: [f32; 2],
    /// Facing.
    pub orientation: [f32; 2],
    /// Remaining health.
    pub health: u32,
    /// Whether the unit moved during the last tick.
    pub is_moving: bool,
    /// Base sprite cell.
    pub sprite_tile: SpriteTile,
    /// Tick of the most recent hit.
    pub last_hit_tick: u64,
}

/// A projectile or particle captured in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteSnapshot {
    /// Entity handle.
    pub id: EntityId,
    /// World position.
    pub position: [f32; 2],
    /// Sprite cell.
    pub sprite_tile: SpriteTile,
}

/// Everything a frame needs to draw one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Tick the snapshot was taken at.
    pub tick: u64,
    /// World width and height in cells.
    pub world: [u32; 2],
    /// Units, player first.
    pub units: Vec<UnitSnapshot>,
    /// Live projectiles.
    pub projectiles: Vec<SpriteSnapshot>,
    /// Live particles.
    pub particles: Vec<SpriteSnapshot>,
    /// Determinism hash of the state.
    pub state_hash: u64,
}

fn to_f32(v: Vec2Fixed) -> [f32; 2] {
    [v.x.to_num::<f32>(), v.y.to_num::<f32>()]
}

impl From<&Unit> for UnitSnapshot {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            role: if unit.kind.is_player() {
                UnitRole::Player
            } else {
                UnitRole::Enemy
            },
            position: to_f32(unit.body.position),
            orientation: to_f32(unit.actor.orientation),
            health: unit.body.health,
            is_moving: unit.actor.is_moving,
            sprite_tile: unit.body.sprite_tile,
            last_hit_tick: unit.body.last_hit_tick,
        }
    }
}

impl GameState {
    /// Capture the current state for drawing or export.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            world: [self.bounds.width, self.bounds.height],
            units: self.units.iter().map(UnitSnapshot::from).collect(),
            projectiles: self
                .live_projectiles()
                .map(|p| SpriteSnapshot {
                    id: p.id,
                    position: to_f32(p.body.position),
                    sprite_tile: p.body.sprite_tile,
                })
                .collect(),
            particles: self
                .live_particles()
                .map(|p| SpriteSnapshot {
                    id: p.id,
                    position: to_f32(p.body.position),
                    sprite_tile: p.body.sprite_tile,
                })
                .collect(),
            state_hash: self.state_hash(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    #[test]
    fn test_snapshot_of_classic_opening() {
        let state = GameState::new_default(SimConfig::default()).unwrap();
        let snapshot = state.snapshot();

        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.world, [16, 16]);
        assert_eq!(snapshot.units.len(), 5);
        assert_eq!(snapshot.units[0].role, UnitRole::Player);
        assert_eq!(snapshot.units[0].position, [5.0, 4.0]);
        assert_eq!(snapshot.units[1].position, [14.0, 14.0]);
        assert!(snapshot.projectiles.is_empty());
        assert_eq!(snapshot.state_hash, state.state_hash());
    }

    #[test]
    fn test_snapshot_round_trips_through_ron() {
        let state = GameState::new_default(SimConfig::default()).unwrap();
        let snapshot = state.snapshot();
        let text = ron::to_string(&snapshot).unwrap();
        let back: WorldSnapshot = ron::from_str(&text).unwrap();
        assert_eq!(back, snapshot);
    }
}
