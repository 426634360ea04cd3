//! # Retro Core
//!
//! Deterministic tick simulation for a small top-down arena: one player,
//! pursuing enemies, fireballs and cosmetic particles on a bounded grid.
//!
//! This crate contains **only** simulation logic:
//! - No rendering or windowing
//! - No input polling (intents arrive as plain values)
//! - No system randomness (one seeded RNG per session)
//! - No floating-point math in the tick (uses fixed-point)
//!
//! This separation enables:
//! - Headless runs and scripted scenarios
//! - Determinism testing via state hashes
//! - Any frontend that can read a [`snapshot::WorldSnapshot`]
//!
//! ## Crate Structure
//!
//! - [`simulation`] - [`GameState`](simulation::GameState) and the tick driver
//! - [`commands`] - Per-tick command list and command execution
//! - [`components`] - Entity records
//! - [`storage`] - Ordered entity collections with stable handles
//! - [`pathfinding`] - Grid A*
//! - [`combat`] - Collision queries, damage and knockback
//! - [`effects`] - Particle bursts, trails and drift
//! - [`observer`] - Movement notifications
//! - [`presentation`] - Sprite selection from movement notifications
//! - [`snapshot`] - Serializable read-only view of a tick
//! - [`config`] - RON tuning
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod commands;
pub mod components;
pub mod config;
pub mod effects;
pub mod error;
pub mod math;
pub mod observer;
pub mod pathfinding;
pub mod presentation;
pub mod random;
pub mod simulation;
pub mod snapshot;
pub mod storage;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::{HitEvent, HitSource};
    pub use crate::commands::{Intent, SimCommand};
    pub use crate::components::*;
    pub use crate::config::SimConfig;
    pub use crate::error::{GameError, Result};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::observer::{EventLog, MotionEvent, UnitObserver};
    pub use crate::presentation::AnimationTracker;
    pub use crate::simulation::{GameState, TickEvents, TickIntents};
    pub use crate::snapshot::WorldSnapshot;
    pub use crate::world::{GridCell, WorldBounds};
}
