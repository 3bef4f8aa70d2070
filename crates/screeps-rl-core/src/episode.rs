//! Per-episode bookkeeping

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScreepsRlError};

/// Counters for the current episode.
///
/// `first_qualifying_tick` is the tick at which a positive creep count was
/// first observed; once set it stays fixed until [`EpisodeTracker::on_reset`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeTracker {
    tick_count: u64,
    first_qualifying_tick: Option<u64>,
    last_count: u64,
}

impl EpisodeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new episode
    pub fn on_reset(&mut self) {
        *self = Self::default();
    }

    /// Record one step with the creep count observed after it
    pub fn on_step(&mut self, current_count: u64) {
        self.tick_count += 1;
        if self.first_qualifying_tick.is_none() && current_count > 0 {
            self.first_qualifying_tick = Some(self.tick_count);
        }
        self.last_count = current_count;
    }

    /// Ticks elapsed since the first qualifying tick
    pub fn ticks_since_first_qualifying(&self) -> Result<u64> {
        self.first_qualifying_tick
            .map(|first| self.tick_count - first)
            .ok_or(ScreepsRlError::NotYetQualified)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn first_qualifying_tick(&self) -> Option<u64> {
        self.first_qualifying_tick
    }

    pub fn last_count(&self) -> u64 {
        self.last_count
    }
}
