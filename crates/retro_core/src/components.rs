//! Entity records.
//!
//! Every simulated thing shares a [`Body`]. Units carry an [`Actor`]
//! plus a [`UnitKind`] tag whose payload holds role-specific state;
//! projectiles and particles are separate record types living in their
//! own collections. Behaviour is dispatched on the tag, not on types.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::world::GridCell;

/// Unique identifier for entities. Assigned monotonically, never reused.
pub type EntityId = u64;

/// Integer coordinate selecting a cell of a sprite sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SpriteTile {
    /// Sheet column.
    pub x: u32,
    /// Sheet row.
    pub y: u32,
}

impl SpriteTile {
    /// Create a new tile coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// State shared by every entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Body {
    /// World position.
    pub position: Vec2Fixed,
    /// Remaining health. Zero marks the entity destroyed.
    pub health: u32,
    /// Appearance cell.
    pub sprite_tile: SpriteTile,
    /// Tick of the most recent hit taken.
    pub last_hit_tick: u64,
}

impl Body {
    /// Create a new body.
    #[must_use]
    pub const fn new(position: Vec2Fixed, health: u32, sprite_tile: SpriteTile) -> Self {
        Self {
            position,
            health,
            sprite_tile,
            last_hit_tick: 0,
        }
    }

    /// True once health has reached zero.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.health == 0
    }

    /// Subtract damage, saturating at zero.
    ///
    /// Returns `true` if this hit destroyed the body.
    pub fn apply_damage(&mut self, amount: u32) -> bool {
        let was_alive = self.health > 0;
        self.health = self.health.saturating_sub(amount);
        was_alive && self.health == 0
    }
}

/// Movement state of anything that walks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// Distance covered per tick.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Last non-zero movement direction, unit length.
    pub orientation: Vec2Fixed,
    /// Whether the unit moved during the most recent tick.
    pub is_moving: bool,
    /// Tick of the most recent shot, for the cooldown.
    pub last_bullet_tick: u64,
}

impl Actor {
    /// Create a new actor facing +X.
    #[must_use]
    pub const fn new(speed: Fixed) -> Self {
        Self {
            speed,
            orientation: Vec2Fixed::UNIT_X,
            is_moving: false,
            last_bullet_tick: 0,
        }
    }
}

/// Pathing state of a pursuing enemy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pursuit {
    /// Remaining waypoints, next one first.
    pub path: Vec<GridCell>,
    /// Tick of the most recent path search.
    pub last_path_update_tick: u64,
}

/// Capability tag for units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// The input-controlled unit.
    Player,
    /// A pursuing enemy and its pathing state.
    Enemy(Pursuit),
}

impl UnitKind {
    /// True for the player tag.
    #[must_use]
    pub const fn is_player(&self) -> bool {
        matches!(self, Self::Player)
    }

    /// True for the enemy tag.
    #[must_use]
    pub const fn is_enemy(&self) -> bool {
        matches!(self, Self::Enemy(_))
    }
}

/// A player or enemy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Storage handle.
    pub id: EntityId,
    /// Shared entity state.
    pub body: Body,
    /// Movement state.
    pub actor: Actor,
    /// Role tag and role payload.
    pub kind: UnitKind,
}

impl Unit {
    /// Create a player unit.
    #[must_use]
    pub fn player(position: Vec2Fixed, health: u32, speed: Fixed) -> Self {
        Self {
            id: 0,
            body: Body::new(position, health, SpriteTile::new(2, 0)),
            actor: Actor::new(speed),
            kind: UnitKind::Player,
        }
    }

    /// Create an enemy unit with an empty path.
    #[must_use]
    pub fn enemy(position: Vec2Fixed, health: u32, speed: Fixed) -> Self {
        Self {
            id: 0,
            body: Body::new(position, health, SpriteTile::new(2, 2)),
            actor: Actor::new(speed),
            kind: UnitKind::Enemy(Pursuit::default()),
        }
    }

    /// Enemy pathing state, if this is an enemy.
    #[must_use]
    pub fn pursuit(&self) -> Option<&Pursuit> {
        match &self.kind {
            UnitKind::Enemy(pursuit) => Some(pursuit),
            UnitKind::Player => None,
        }
    }
}

/// Animation frames a fireball cycles through.
pub const FIREBALL_FRAMES: [SpriteTile; 3] = [
    SpriteTile::new(0, 0),
    SpriteTile::new(0, 1),
    SpriteTile::new(0, 2),
];

/// A fireball in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Projectile {
    /// Storage handle.
    pub id: EntityId,
    /// Shared entity state. Health drops to zero once the projectile is spent.
    pub body: Body,
    /// Unit-length travel direction.
    pub direction: Vec2Fixed,
    /// Spawn point, for the range cutoff.
    pub start_position: Vec2Fixed,
    /// Distance per tick.
    #[serde(with = "fixed_serde")]
    pub velocity: Fixed,
    /// Maximum distance from the spawn point.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Damage dealt on hit.
    pub damage: u32,
    /// The unit that fired it. Relation only, used to skip self-hits.
    pub owner: EntityId,
    /// Index into [`FIREBALL_FRAMES`].
    pub frame: usize,
}

impl Projectile {
    /// Whether the projectile is still in flight.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        !self.body.is_destroyed()
    }

    /// Advance the animation cycle by one frame.
    pub fn next_frame(&mut self) {
        self.frame = (self.frame + 1) % FIREBALL_FRAMES.len();
        self.body.sprite_tile = FIREBALL_FRAMES[self.frame];
    }
}

/// A purely cosmetic particle.
///
/// Lifetime, not health, is the destruction signal: health stays fixed and
/// the particle collection is compacted on `lifetime > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Particle {
    /// Storage handle.
    pub id: EntityId,
    /// Shared entity state.
    pub body: Body,
    /// Ticks remaining.
    pub lifetime: u32,
    /// Tick at which the next drift step happens.
    pub next_move_tick: u64,
}

impl Particle {
    /// Whether the particle is still visible.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.lifetime > 0
    }
}
