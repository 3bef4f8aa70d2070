//! Observation types

use serde::{Deserialize, Serialize};

use crate::reward::RewardComponents;

/// Number of observation features
pub const OBS_DIM: usize = 5;

/// Room-level observation.
///
/// Layout: `[energy_ready, harvester_work, upgrader_work, controller_level,
/// controller_progress / 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Observation(pub [f64; OBS_DIM]);

impl Observation {
    /// Substituted whenever the remote value cannot be decoded
    pub const DEFAULT: Observation = Observation([0.0, 0.0, 0.0, 1.0, 0.0]);

    pub fn new(values: [f64; OBS_DIM]) -> Self {
        Self(values)
    }

    /// 1.0 when the room has at least the spawn energy threshold
    pub fn energy_ready(&self) -> f64 {
        self.0[0]
    }

    /// Active WORK parts across harvesters
    pub fn harvester_work(&self) -> f64 {
        self.0[1]
    }

    /// Active WORK parts across upgraders
    pub fn upgrader_work(&self) -> f64 {
        self.0[2]
    }

    /// Room controller level
    pub fn controller_level(&self) -> f64 {
        self.0[3]
    }

    /// Controller progress in hundredths
    pub fn controller_progress(&self) -> f64 {
        self.0[4]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Single-line summary used by `render`
    pub fn summary(&self) -> String {
        format!(
            "E:{} | H:{} | U:{} | RCL:{} | prog:{}",
            self.energy_ready() as i64,
            self.harvester_work() as i64,
            self.upgrader_work() as i64,
            self.controller_level() as i64,
            self.controller_progress() as i64,
        )
    }
}

impl Default for Observation {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<[f64; OBS_DIM]> for Observation {
    fn from(values: [f64; OBS_DIM]) -> Self {
        Self(values)
    }
}

/// Box observation space bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSpace {
    pub low: [f64; OBS_DIM],
    pub high: [f64; OBS_DIM],
}

impl ObservationSpace {
    /// Bounds for RCL 1..=8 and simplified progress
    pub fn spawn_room() -> Self {
        Self {
            low: [0.0, 0.0, 0.0, 1.0, 0.0],
            high: [1.0, 50.0, 50.0, 8.0, 500.0],
        }
    }

    /// Whether every feature lies within bounds
    pub fn contains(&self, obs: &Observation) -> bool {
        obs.0
            .iter()
            .zip(self.low.iter().zip(self.high.iter()))
            .all(|(v, (lo, hi))| v >= lo && v <= hi)
    }
}

impl Default for ObservationSpace {
    fn default() -> Self {
        Self::spawn_room()
    }
}

/// Per-step info map; empty except on the terminating step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    /// Living creeps when the controller reached level 2
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creeps_until_lvl2: Option<u64>,

    /// Ticks from the first living creep to level 2
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticks_until_lvl2: Option<u64>,
}

impl StepInfo {
    pub fn is_empty(&self) -> bool {
        self.creeps_until_lvl2.is_none() && self.ticks_until_lvl2.is_none()
    }
}

/// Result of an environment step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Observation after the action
    pub observation: Observation,

    /// Scalar reward signal
    pub reward: f64,

    /// Decomposed reward for analysis
    #[serde(default)]
    pub reward_components: RewardComponents,

    /// Episode terminated (controller level reached)
    pub terminated: bool,

    /// Episode truncated (step limit)
    pub truncated: bool,

    /// Episode summary on termination
    #[serde(default)]
    pub info: StepInfo,
}

impl StepResult {
    /// Whether the episode has ended for either reason
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}
