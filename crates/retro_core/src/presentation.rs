//! Sprite selection for units, driven by movement notifications.
//!
//! [`AnimationTracker`] is a [`UnitObserver`]: it records which units are
//! walking from the events the simulation publishes and derives the sprite
//! cell to draw from that plus the unit's facing. It keeps copies of what
//! it needs and never points back into simulation state.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::components::{EntityId, SpriteTile, Unit, UnitKind};
use crate::config::PresentationConfig;
use crate::math::{Fixed, Vec2Fixed};
use crate::observer::UnitObserver;

/// Sprite sheet row holding the player's walk cycle.
pub const PLAYER_ROW: u32 = 0;
/// Sprite sheet row holding an enemy's walk cycle.
pub const ENEMY_ROW: u32 = 2;

/// Sheet column for a facing direction.
///
/// Horizontal facing wins: +X is column 0, -X column 1, then +Y column 2
/// and -Y column 3. `None` for a zero vector.
#[must_use]
pub fn facing_column(orientation: Vec2Fixed) -> Option<u32> {
    if orientation.x > Fixed::ZERO {
        Some(0)
    } else if orientation.x < Fixed::ZERO {
        Some(1)
    } else if orientation.y > Fixed::ZERO {
        Some(2)
    } else if orientation.y < Fixed::ZERO {
        Some(3)
    } else {
        None
    }
}

#[derive(Debug, Default)]
struct Tracked {
    moving: HashMap<EntityId, bool>,
}

/// Walk-cycle and hit-flash state for drawing units.
///
/// Cloning yields another handle onto the same record, so one clone can be
/// registered with the simulation while another is kept for drawing.
#[derive(Debug, Clone, Default)]
pub struct AnimationTracker {
    config: PresentationConfig,
    tracked: Rc<RefCell<Tracked>>,
}

impl AnimationTracker {
    /// Create a tracker with the given timings.
    #[must_use]
    pub fn new(config: PresentationConfig) -> Self {
        Self {
            config,
            tracked: Rc::default(),
        }
    }

    /// Whether the last notification for `unit` was a move.
    #[must_use]
    pub fn is_moving(&self, unit: EntityId) -> bool {
        self.tracked
            .borrow()
            .moving
            .get(&unit)
            .copied()
            .unwrap_or(false)
    }

    /// Sprite cell to draw for `unit` at `tick`.
    ///
    /// The column always follows the unit's facing. Walking units also
    /// alternate between two rows every `walk_frame_ticks`; standing units
    /// keep the row of their base cell.
    #[must_use]
    pub fn unit_tile(&self, unit: &Unit, tick: u64) -> SpriteTile {
        let mut tile = unit.body.sprite_tile;
        if self.is_moving(unit.id) {
            let base_row = match unit.kind {
                UnitKind::Player => PLAYER_ROW,
                UnitKind::Enemy(_) => ENEMY_ROW,
            };
            let period = self.config.walk_frame_ticks.max(1);
            tile.y = base_row + ((tick / period) % 2) as u32;
        }
        if let Some(column) = facing_column(unit.actor.orientation) {
            tile.x = column;
        }
        tile
    }

    /// Whether `unit` should be drawn flashing for a recent hit.
    #[must_use]
    pub fn is_flashing(&self, unit: &Unit, tick: u64) -> bool {
        tick.saturating_sub(unit.body.last_hit_tick) < self.config.hit_flash_ticks
    }

    /// Drop records for units that no longer exist.
    pub fn retain(&self, mut alive: impl FnMut(EntityId) -> bool) {
        self.tracked.borrow_mut().moving.retain(|&id, _| alive(id));
    }
}

impl UnitObserver for AnimationTracker {
    fn on_unit_move(&mut self, unit: &Unit, _direction: Vec2Fixed) {
        self.tracked.borrow_mut().moving.insert(unit.id, true);
    }

    fn on_unit_stop(&mut self, unit: &Unit) {
        self.tracked.borrow_mut().moving.insert(unit.id, false);
    }
}
