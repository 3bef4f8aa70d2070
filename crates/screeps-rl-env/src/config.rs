//! Environment configuration

use screeps_rl_core::{Result, RewardConfig, ScreepsRlError};
use std::str::FromStr;
use std::time::Duration;

/// Tunables for the spawn environment
#[derive(Debug, Clone, PartialEq)]
pub struct EnvConfig {
    /// Shard hosting the training room
    pub shard: String,
    /// Memory key holding the JSON-encoded observation
    pub state_key: String,
    /// Memory key holding the living creep count
    pub count_key: String,
    /// Wall-clock time assumed per server tick
    pub tick_quantum: Duration,
    /// Ticks to wait after the world reset
    pub reset_settle_ticks: f64,
    /// Ticks to wait between scheduling a snapshot and re-reading it
    pub snapshot_settle_ticks: f64,
    /// Energy required before a spawn is attempted
    pub spawn_energy_threshold: u32,
    /// Reward shaping; its `goal_level` also terminates the episode
    pub reward: RewardConfig,
    /// Truncate after this many steps
    pub max_episode_steps: Option<u64>,
    /// Log a one-line room summary after every step
    pub render: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            shard: "shard0".to_string(),
            state_key: "dqn_state".to_string(),
            count_key: "dqn_creep_count".to_string(),
            tick_quantum: Duration::from_millis(100),
            reset_settle_ticks: 3.0,
            snapshot_settle_ticks: 0.1,
            spawn_energy_threshold: 200,
            reward: RewardConfig::default(),
            max_episode_steps: None,
            render: false,
        }
    }
}

impl EnvConfig {
    /// Defaults overridden by `SCREEPS_SHARD`, `SCREEPS_TICK_MS`,
    /// `SCREEPS_MAX_STEPS` and `SCREEPS_RENDER`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(shard) = std::env::var("SCREEPS_SHARD") {
            config.shard = shard;
        }
        if let Some(ms) = parse_var::<u64>("SCREEPS_TICK_MS")? {
            config.tick_quantum = Duration::from_millis(ms);
        }
        if let Some(steps) = parse_var::<u64>("SCREEPS_MAX_STEPS")? {
            config.max_episode_steps = Some(steps);
        }
        if let Some(render) = parse_var::<bool>("SCREEPS_RENDER")? {
            config.render = render;
        }
        Ok(config)
    }
}

/// Parse an optional environment variable
pub fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ScreepsRlError::Config(format!("{}: invalid value {:?}", name, raw))),
        Err(_) => Ok(None),
    }
}
