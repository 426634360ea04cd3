//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces
//! identical results given identical config and inputs.
//!
//! # Testing Strategy
//!
//! Replays and scripted scenarios only mean something if a session is a
//! pure function of its config and input stream. Sources of
//! non-determinism include:
//!
//! - **Floating-point math**: We use fixed-point arithmetic via
//!   [`retro_core::math::Fixed`] throughout the tick.
//!
//! - **HashMap iteration order**: Entity collections are ordered vectors;
//!   the simulation never iterates a hash map.
//!
//! - **System randomness**: All "random" behavior draws from the seeded
//!   RNG owned by the session.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual commands (movement, combat, pursuit)
//! 2. **Property tests**: Random input streams still replay identically
//! 3. **Parallel tests**: Running N sessions on threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use retro_core::simulation::{GameState, TickIntents};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for tick in 0..ticks {
            step(&mut state, tick);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a [`GameState`] twice under the same input script and compare the
/// final state hashes.
pub fn verify_simulation_determinism<F, I>(setup_fn: F, inputs: I, num_ticks: u64) -> bool
where
    F: Fn() -> GameState,
    I: Fn(u64) -> TickIntents,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |state, tick| {
            state.step(inputs(tick));
        },
        GameState::state_hash,
    )
    .is_deterministic
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N sessions on scoped threads and collect final hashes.
///
/// Each session is built, stepped and hashed on its own thread, so the
/// session itself never crosses a thread boundary.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations_scoped<F, I>(
    setup_fn: F,
    inputs: I,
    num_sims: usize,
    num_ticks: u64,
) -> ParallelSimResult
where
    F: Fn() -> GameState + Sync,
    I: Fn(u64) -> TickIntents + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut state = setup_fn();
                    for tick in 0..num_ticks {
                        state.step(inputs(tick));
                    }
                    state.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if the runs stay identical, `Some(tick)` for the first tick
/// after which their hashes differ.
pub fn find_first_divergence<F, I>(setup_fn: F, inputs: I, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> GameState,
    I: Fn(u64) -> TickIntents,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for tick in 0..num_ticks {
        first.step(inputs(tick));
        second.step(inputs(tick));

        if first.state_hash() != second.state_hash() {
            tracing::warn!(tick = tick + 1, "Simulations diverged");
            return Some(tick + 1);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for simulation testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing.
pub mod strategies {
    use proptest::prelude::*;
    use retro_core::math::{Fixed, Vec2Fixed};
    use retro_core::simulation::TickIntents;
    use retro_core::world::WorldBounds;

    /// Generate a movement direction with components in -3..=3.
    ///
    /// Includes the zero vector, which means "stand still".
    pub fn arb_direction() -> impl Strategy<Value = Vec2Fixed> {
        (-3i32..=3, -3i32..=3).prop_map(|(x, y)| Vec2Fixed::from_ints(x, y))
    }

    /// Generate a direction with arbitrary magnitude, including huge ones.
    ///
    /// Mixes large integer vectors, arbitrary raw fixed-point bits and the
    /// representable extremes.
    pub fn arb_wild_direction() -> impl Strategy<Value = Vec2Fixed> {
        let component = prop_oneof![
            (-1_000_000i32..1_000_000).prop_map(|n| Fixed::from_num(n)),
            any::<i64>().prop_map(|bits| Fixed::from_bits(bits)),
            Just(Fixed::MIN),
            Just(Fixed::MAX),
            Just(Fixed::ZERO),
        ];
        (component.clone(), component).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Generate one tick of player input.
    pub fn arb_intents() -> impl Strategy<Value = TickIntents> {
        (arb_direction(), any::<bool>()).prop_map(|(move_direction, fire)| TickIntents {
            move_direction,
            fire,
        })
    }

    /// Generate a stream of player input.
    pub fn arb_intent_sequence(max_len: usize) -> impl Strategy<Value = Vec<TickIntents>> {
        proptest::collection::vec(arb_intents(), 1..max_len)
    }

    /// Generate a position inside `bounds`, on a 1/8 cell lattice.
    pub fn arb_position_in(bounds: WorldBounds) -> impl Strategy<Value = Vec2Fixed> {
        let w = i32::try_from(bounds.width * 8).unwrap_or(i32::MAX);
        let h = i32::try_from(bounds.height * 8).unwrap_or(i32::MAX);
        let eighth = Fixed::from_num(0.125);
        (0..w, 0..h).prop_map(move |(x, y)| {
            Vec2Fixed::new(Fixed::from_num(x) * eighth, Fixed::from_num(y) * eighth)
        })
    }

    /// Generate damage values (1-100).
    pub fn arb_damage() -> impl Strategy<Value = u32> {
        1u32..100u32
    }

    /// Generate a seed.
    pub fn arb_seed() -> impl Strategy<Value = u32> {
        any::<u32>()
    }
}
