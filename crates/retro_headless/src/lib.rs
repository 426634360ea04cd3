//! Headless runner for scripted sessions and CI verification.
//!
//! Drives the simulation core without a window. A scripted input provider
//! plays the part of the keyboard, so a run is fully described by its
//! command line. This enables:
//!
//! - **CI verification**: Automated checks of game logic and determinism
//! - **Manual inspection**: ASCII frames and JSON snapshots in a terminal
//! - **Tuning**: Try a RON config without building a frontend
//!
//! # Example
//!
//! ```bash
//! # Run 600 ticks walking in a square and firing every 20 ticks
//! cargo run -p retro_headless -- run --ticks 600 --script circle --fire-every 20 --ascii
//!
//! # Verify determinism
//! cargo run -p retro_headless -- verify --ticks 1000 --runs 5
//! ```

pub mod ascii_visualizer;
pub mod runner;
pub mod script;

pub use ascii_visualizer::{render_ascii, AsciiConfig};
pub use runner::{HeadlessRunner, RunConfig, RunSummary, RunnerError};
pub use script::{Script, ScriptedInput};
