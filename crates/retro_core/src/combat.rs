//! Collision queries and hit resolution.
//!
//! Damage saturates at zero and a unit that is already destroyed can not
//! be hit again, so within one tick whichever hit resolves first wins.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Unit};
use crate::math::{Fixed, Vec2Fixed};
use crate::storage::EntityStorage;
use crate::world::WorldBounds;

/// What caused a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitSource {
    /// A projectile fired by the given unit.
    Projectile {
        /// Projectile handle.
        projectile: EntityId,
        /// Firing unit handle.
        owner: EntityId,
    },
    /// Contact with the given enemy.
    Melee {
        /// Enemy handle.
        enemy: EntityId,
    },
}

/// Outcome of one resolved hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HitEvent {
    /// What caused it.
    pub source: HitSource,
    /// Unit that was hit.
    pub target: EntityId,
    /// Health actually removed.
    pub damage: u32,
    /// Whether the hit destroyed the target.
    pub destroyed: bool,
}

/// First live unit within `radius` of `point`, in storage order.
///
/// `exclude` is skipped, which keeps projectiles from hitting their firer.
/// When several units qualify the earliest one wins (the player, then
/// enemies in spawn order); this is a fixed tie-break, not nearest-wins.
#[must_use]
pub fn find_unit_at(
    units: &EntityStorage<Unit>,
    point: Vec2Fixed,
    radius: Fixed,
    exclude: Option<EntityId>,
) -> Option<EntityId> {
    units
        .iter()
        .filter(|unit| !unit.body.is_destroyed())
        .filter(|unit| Some(unit.id) != exclude)
        .find(|unit| point.distance(unit.body.position) < radius)
        .map(|unit| unit.id)
}

/// Displace `position` by `magnitude` along `direction`, then clamp.
///
/// A zero `direction` has no defined push and leaves the position as is.
#[must_use]
pub fn knockback(
    bounds: &WorldBounds,
    position: Vec2Fixed,
    direction: Vec2Fixed,
    magnitude: Fixed,
) -> Vec2Fixed {
    match direction.try_normalize() {
        Some(dir) => bounds.clamp(position + dir * magnitude),
        None => bounds.clamp(position),
    }
}

/// Direction that pushes the player away from an enemy.
///
/// Falls back to +X when the two positions coincide.
#[must_use]
pub fn melee_push_direction(player: Vec2Fixed, enemy: Vec2Fixed) -> Vec2Fixed {
    (player - enemy)
        .try_normalize()
        .unwrap_or(Vec2Fixed::UNIT_X)
}

/// Apply damage, hit stamp and knockback to a unit.
///
/// Returns `None` if the unit was already destroyed, in which case
/// nothing changes.
pub fn apply_hit(
    unit: &mut Unit,
    bounds: &WorldBounds,
    source: HitSource,
    damage: u32,
    push: Vec2Fixed,
    push_magnitude: Fixed,
    tick: u64,
) -> Option<HitEvent> {
    if unit.body.is_destroyed() {
        return None;
    }

    let before = unit.body.health;
    let destroyed = unit.body.apply_damage(damage);
    unit.body.last_hit_tick = tick;
    unit.body.position = knockback(bounds, unit.body.position, push, push_magnitude);

    Some(HitEvent {
        source,
        target: unit.id,
        damage: before - unit.body.health,
        destroyed,
    })
}
