//! Scripted input providers.
//!
//! A script stands in for the keyboard: it maps a tick number to that
//! tick's [`TickIntents`]. Scripts are pure functions of the tick, so a
//! run is reproducible from its command line alone.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use retro_core::math::Vec2Fixed;
use retro_core::simulation::TickIntents;

/// Ticks spent on each leg of a scripted movement pattern.
const LEG_TICKS: u64 = 30;

/// Built-in movement patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    /// Never move.
    #[default]
    Idle,
    /// Walk right, down, left, up, one leg at a time.
    Circle,
    /// Walk up and down along one column.
    Strafe,
}

impl Script {
    /// Movement direction for `tick`.
    #[must_use]
    pub fn direction(self, tick: u64) -> Vec2Fixed {
        let leg = tick / LEG_TICKS;
        match self {
            Self::Idle => Vec2Fixed::ZERO,
            Self::Circle => match leg % 4 {
                0 => Vec2Fixed::from_ints(1, 0),
                1 => Vec2Fixed::from_ints(0, 1),
                2 => Vec2Fixed::from_ints(-1, 0),
                _ => Vec2Fixed::from_ints(0, -1),
            },
            Self::Strafe => {
                if leg % 2 == 0 {
                    Vec2Fixed::from_ints(0, 1)
                } else {
                    Vec2Fixed::from_ints(0, -1)
                }
            }
        }
    }
}

/// Movement script plus a fire cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScriptedInput {
    /// Movement pattern.
    pub script: Script,
    /// Request a shot every this many ticks; `None` never fires.
    pub fire_every: Option<u64>,
}

impl ScriptedInput {
    /// Intents for `tick`.
    #[must_use]
    pub fn intents(&self, tick: u64) -> TickIntents {
        TickIntents {
            move_direction: self.script.direction(tick),
            fire: self
                .fire_every
                .is_some_and(|every| every > 0 && tick % every == 0),
        }
    }
}
