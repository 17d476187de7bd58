//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a battle produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Battles must be reproducible so that recorded command logs replay
//! exactly. Sources of non-determinism include:
//!
//! - **Floating-point math**: We use fixed-point arithmetic via
//!   [`tactics_core::math::Fixed`] throughout.
//!
//! - **Map iteration order**: Units live in a `BTreeMap` keyed by id and
//!   rosters are ordered vectors.
//!
//! - **System randomness**: Critical rolls come from an injected
//!   [`tactics_core::rng::RandomSource`], seeded from the scenario.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tactics_core::data::Catalog;
use tactics_core::events::BattleEvent;
use tactics_core::rng::RandomSource;
use tactics_core::scenario::Scenario;
use tactics_core::turn::TurnController;

use crate::strategies::BattleCommand;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps taken per run.
    pub steps: usize,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the battle was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a battle multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the battle
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step (given its index)
/// * `hash` - Function to compute a state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: usize,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, usize),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for index in 0..steps {
            step(&mut state, index);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Hash the full observable state of a battle.
#[must_use]
pub fn battle_fingerprint<R: RandomSource>(tc: &TurnController<R>) -> u64 {
    let mut hasher = DefaultHasher::new();
    format!("{:?}", tc.snapshot()).hash(&mut hasher);
    hasher.finish()
}

/// Replay `commands` against a fresh seeded battle.
///
/// Returns every emitted event and the final fingerprint.
///
/// # Panics
///
/// Panics if the scenario does not build against the catalog.
#[must_use]
pub fn replay(
    catalog: &Arc<Catalog>,
    scenario: &Scenario,
    commands: &[BattleCommand],
) -> (Vec<BattleEvent>, u64) {
    let mut tc = TurnController::new(Arc::clone(catalog), scenario.clone())
        .unwrap_or_else(|e| panic!("replay scenario failed to build: {e}"));
    let mut events = Vec::new();
    for command in commands {
        let emitted = command.apply(&mut tc);
        tracing::trace!(?command, emitted = emitted.len(), "Replayed command");
        events.extend(emitted);
    }
    (events, battle_fingerprint(&tc))
}
