//! Headless session runner.
//!
//! Builds a [`GameState`], drives it with a [`ScriptedInput`] and reports
//! what happened. This is the outer frame loop without a window.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use retro_core::components::Unit;
use retro_core::config::SimConfig;
use retro_core::error::GameError;
use retro_core::math::Vec2Fixed;
use retro_core::observer::UnitObserver;
use retro_core::simulation::GameState;
use retro_core::snapshot::WorldSnapshot;

use crate::script::ScriptedInput;

/// Errors surfaced by the headless runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Session setup failed.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Snapshot export failed.
    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Run parameters.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Simulation tuning.
    pub sim: SimConfig,
    /// Number of ticks to run.
    pub ticks: u64,
    /// Input provider.
    pub input: ScriptedInput,
}

/// Observer notifications seen during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionCounts {
    /// `on_unit_move` calls.
    pub moves: u64,
    /// `on_unit_stop` calls.
    pub stops: u64,
}

/// Observer that tallies notifications into a shared counter.
#[derive(Debug, Clone, Default)]
pub struct EventCounter {
    counts: Rc<RefCell<MotionCounts>>,
}

impl EventCounter {
    /// Current tallies.
    #[must_use]
    pub fn counts(&self) -> MotionCounts {
        *self.counts.borrow()
    }
}

impl UnitObserver for EventCounter {
    fn on_unit_move(&mut self, _unit: &Unit, _direction: Vec2Fixed) {
        self.counts.borrow_mut().moves += 1;
    }

    fn on_unit_stop(&mut self, _unit: &Unit) {
        self.counts.borrow_mut().stops += 1;
    }
}

/// End-of-run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Tick counter after the run.
    pub tick: u64,
    /// Player health, or `None` once the player is gone.
    pub player_health: Option<u32>,
    /// Enemies still alive.
    pub enemies_alive: usize,
    /// Live projectiles at the end.
    pub projectiles: usize,
    /// Live particles at the end.
    pub particles: usize,
    /// Shots fired over the run.
    pub shots_fired: u64,
    /// Hits applied over the run.
    pub hits: u64,
    /// Units destroyed over the run.
    pub units_destroyed: u64,
    /// Observer notifications over the run.
    pub motion: MotionCounts,
    /// Final state hash. Only comparable between runs of the same build.
    pub state_hash: u64,
}

/// Drives one session with scripted input.
#[derive(Debug)]
pub struct HeadlessRunner {
    config: RunConfig,
    state: GameState,
    counter: EventCounter,
    shots_fired: u64,
    hits: u64,
    units_destroyed: u64,
}

impl HeadlessRunner {
    /// Build the classic opening from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Game`] if the simulation config is invalid.
    pub fn new(config: RunConfig) -> Result<Self, RunnerError> {
        let mut state = GameState::new_default(config.sim.clone())?;
        let counter = EventCounter::default();
        state.add_observer(Box::new(counter.clone()));

        Ok(Self {
            config,
            state,
            counter,
            shots_fired: 0,
            hits: 0,
            units_destroyed: 0,
        })
    }

    /// The session being driven.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Advance one tick using the script.
    pub fn step(&mut self) {
        let intents = self.config.input.intents(self.state.tick());
        let events = self.state.step(intents);

        self.shots_fired += events.projectiles_fired.len() as u64;
        self.hits += events.hits.len() as u64;
        self.units_destroyed += events.units_destroyed.len() as u64;

        if events.units_destroyed.contains(&self.state.player_id()) {
            tracing::info!(tick = self.state.tick(), "Player lost");
        }
    }

    /// Run the configured number of ticks and summarize.
    pub fn run(&mut self) -> RunSummary {
        tracing::info!(
            ticks = self.config.ticks,
            script = ?self.config.input.script,
            "Starting headless run"
        );
        for _ in 0..self.config.ticks {
            self.step();
        }
        let summary = self.summary();
        tracing::info!(tick = summary.tick, hash = summary.state_hash, "Run complete");
        summary
    }

    /// Report on the session so far.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            tick: self.state.tick(),
            player_health: self.state.player().map(|p| p.body.health),
            enemies_alive: self.state.units().iter().filter(|u| u.kind.is_enemy()).count(),
            projectiles: self.state.live_projectiles().count(),
            particles: self.state.live_particles().count(),
            shots_fired: self.shots_fired,
            hits: self.hits,
            units_destroyed: self.units_destroyed,
            motion: self.counter.counts(),
            state_hash: self.state.state_hash(),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        self.state.snapshot()
    }

    /// Snapshot encoded as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Json`] if encoding fails.
    pub fn snapshot_json(&self) -> Result<String, RunnerError> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }
}

/// Run the same configuration `runs` times and compare final hashes.
///
/// # Errors
///
/// Returns [`RunnerError::Game`] if the simulation config is invalid.
pub fn verify_determinism(config: &RunConfig, runs: u32) -> Result<bool, RunnerError> {
    let mut hashes = Vec::with_capacity(runs as usize);
    for run in 0..runs {
        let mut runner = HeadlessRunner::new(config.clone())?;
        let hash = runner.run().state_hash;
        tracing::debug!(run, hash, "Verification run finished");
        hashes.push(hash);
    }
    Ok(hashes.windows(2).all(|w| w[0] == w[1]))
}
