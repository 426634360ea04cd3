//! Test fixtures and helpers.
//!
//! Pre-built sessions and input scripts for consistent testing.

use fixed::types::I32F32;
use retro_core::components::EntityId;
use retro_core::config::SimConfig;
use retro_core::math::Vec2Fixed;
use retro_core::simulation::{GameState, TickIntents};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a vector from integer components.
#[must_use]
pub fn vec2(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// Create a vector from float components (for tests only).
#[must_use]
pub fn vec2_f(x: f64, y: f64) -> Vec2Fixed {
    Vec2Fixed::new(fixed_f(x), fixed_f(y))
}

/// Default config with a different shot cooldown.
///
/// A cooldown of zero lets the player fire on the very first tick.
#[must_use]
pub fn config_with_cooldown(shot_cooldown: u64) -> SimConfig {
    SimConfig {
        shot_cooldown,
        ..SimConfig::default()
    }
}

/// The classic opening with default tuning.
///
/// # Panics
///
/// Panics if the default config stops validating.
#[must_use]
pub fn classic_state() -> GameState {
    GameState::new_default(SimConfig::default()).expect("default config is valid")
}

/// A player and a single enemy.
///
/// Returns the session and the enemy handle.
///
/// # Panics
///
/// Panics if either position is outside the world.
#[must_use]
pub fn duel(config: SimConfig, player: Vec2Fixed, enemy: Vec2Fixed) -> (GameState, EntityId) {
    let mut state = GameState::with_player(config, player).expect("player start in bounds");
    let enemy = state.spawn_enemy_at(enemy).expect("enemy start in bounds");
    (state, enemy)
}

/// Step a session `ticks` times without input.
pub fn advance_idle(state: &mut GameState, ticks: u64) {
    for _ in 0..ticks {
        state.step(TickIntents::IDLE);
    }
}

/// Deterministic input script that walks a square and fires regularly.
///
/// Covers every movement direction, stop ticks and shots, so it exercises
/// most of the tick in a few hundred steps.
#[must_use]
pub fn patrol_script(tick: u64) -> TickIntents {
    let direction = match (tick / 40) % 5 {
        0 => vec2(1, 0),
        1 => vec2(0, 1),
        2 => vec2(-1, 0),
        3 => vec2(0, -1),
        _ => Vec2Fixed::ZERO,
    };
    TickIntents {
        move_direction: direction,
        fire: tick % 25 == 0,
    }
}
