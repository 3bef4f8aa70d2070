//! Reward types and reward shaping

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::action::Action;
use crate::observation::Observation;

/// Scalar reward with optional decomposition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reward {
    /// Total scalar reward
    pub value: f64,
    /// Decomposed components for analysis
    #[serde(default)]
    pub components: RewardComponents,
}

impl Reward {
    fn add(&mut self, name: &str, amount: f64) {
        self.value += amount;
        self.components.insert(name.to_string(), amount);
    }
}

/// Decomposed reward components
pub type RewardComponents = HashMap<String, f64>;

/// Definition of a reward component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardComponentDef {
    /// Component name
    pub name: String,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Trait for scoring a transition
pub trait RewardFunction: Send + Sync {
    /// Score `prev --action--> curr`
    fn compute(&self, prev: &Observation, curr: &Observation, action: &Action) -> Reward;

    /// List available reward components
    fn components(&self) -> Vec<RewardComponentDef>;
}

/// Shaping constants for [`SpawnReward`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Applied every step
    pub step_cost: f64,
    /// Applied to spawns whose body has no MOVE part
    pub immobile_spawn_penalty: f64,
    /// Multiplier on positive controller progress
    pub progress_weight: f64,
    /// Desired harvester share of WORK parts
    pub target_harvester_ratio: f64,
    /// Weight of the squared deviation from the target ratio
    pub balance_weight: f64,
    /// Controller level that ends the episode
    pub goal_level: f64,
    /// Bonus once the goal level is observed
    pub goal_bonus: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            step_cost: -0.1,
            immobile_spawn_penalty: -1.0,
            progress_weight: 1.0,
            target_harvester_ratio: 0.6,
            balance_weight: 5.0,
            goal_level: 2.0,
            goal_bonus: 20.0,
        }
    }
}

/// Reward for the spawn-control task
#[derive(Debug, Clone, Default)]
pub struct SpawnReward {
    pub config: RewardConfig,
}

impl SpawnReward {
    pub fn new(config: RewardConfig) -> Self {
        Self { config }
    }
}

impl RewardFunction for SpawnReward {
    fn compute(&self, prev: &Observation, curr: &Observation, action: &Action) -> Reward {
        let cfg = &self.config;
        let mut reward = Reward::default();

        reward.add("step_cost", cfg.step_cost);

        if action.is_immobile_spawn() {
            reward.add("immobile_spawn", cfg.immobile_spawn_penalty);
        }

        let progress = curr.controller_progress() - prev.controller_progress();
        if progress > 0.0 {
            reward.add("progress", progress * cfg.progress_weight);
        }

        let h = curr.harvester_work();
        let total = h + curr.upgrader_work();
        if total > 0.0 {
            let deviation = h / total - cfg.target_harvester_ratio;
            reward.add("balance", -cfg.balance_weight * deviation * deviation);
        }

        if curr.controller_level() >= cfg.goal_level {
            reward.add("level_up", cfg.goal_bonus);
        }

        reward
    }

    fn components(&self) -> Vec<RewardComponentDef> {
        [
            ("step_cost", "Constant per-step cost"),
            ("immobile_spawn", "Spawned a creep without MOVE"),
            ("progress", "Controller progress gained this step"),
            ("balance", "Squared deviation from the harvester/upgrader target"),
            ("level_up", "Controller reached the goal level"),
        ]
        .into_iter()
        .map(|(name, description)| RewardComponentDef {
            name: name.to_string(),
            description: Some(description.to_string()),
        })
        .collect()
    }
}
