//! Score sources for the solution-evaluation operation
//!
//! Scoring is the only nondeterministic operation in the workflow. The
//! source is injected at construction so tests can pin the branch
//! outcome. No source keeps a generator that outlives a single call:
//! [`EntropyScore`] seeds a fresh generator per draw and [`SeededScore`]
//! derives one from its seed and the ticket id, so concurrent runs never
//! contend on shared generator state.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;
use ticketflow_types::CaseRecord;

/// Draws a solution score for a record
pub trait ScoreSource: Send + Sync {
    fn draw(&self, range: RangeInclusive<u32>, record: &CaseRecord) -> u32;
}

/// Fresh OS-seeded generator per draw
#[derive(Clone, Copy, Debug, Default)]
pub struct EntropyScore;

impl ScoreSource for EntropyScore {
    fn draw(&self, range: RangeInclusive<u32>, _record: &CaseRecord) -> u32 {
        StdRng::from_entropy().gen_range(range)
    }
}

/// Reproducible scores: the same seed and ticket always draw the same value
#[derive(Clone, Copy, Debug)]
pub struct SeededScore {
    seed: u64,
}

impl SeededScore {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl ScoreSource for SeededScore {
    fn draw(&self, range: RangeInclusive<u32>, record: &CaseRecord) -> u32 {
        let mixed = self.seed ^ record.ticket_id().value().rotate_left(32);
        StdRng::seed_from_u64(mixed).gen_range(range)
    }
}

/// Always returns the same score, ignoring the configured range
#[derive(Clone, Copy, Debug)]
pub struct FixedScore(u32);

impl FixedScore {
    pub fn new(score: u32) -> Self {
        Self(score)
    }
}

impl ScoreSource for FixedScore {
    fn draw(&self, _range: RangeInclusive<u32>, _record: &CaseRecord) -> u32 {
        self.0
    }
}
