//! screeps-rl: run spawn-control episodes against a Screeps server
//!
//! Drives the environment with a uniform-random policy and logs per-episode
//! metrics: creeps alive when the controller reached level 2, and ticks from
//! the first living creep to that point.
//!
//! Usage: `screeps-rl [episodes] [seed]`. Connection, reset command and
//! environment tunables come from `SCREEPS_*` variables.

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use screeps_bridge::{CommandReset, ResetConfig, ScreepsApi, ScreepsConfig};
use screeps_rl_env::{EnvConfig, RemoteBoundary, ScreepsSpawnEnv, WorldReset};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Outcome of one episode
#[derive(Debug, Default)]
struct EpisodeStats {
    steps: u64,
    total_reward: f64,
    terminated: bool,
    creeps_until_lvl2: Option<u64>,
    ticks_until_lvl2: Option<u64>,
}

async fn run_episode<R, W>(env: &mut ScreepsSpawnEnv<R, W>, rng: &mut SmallRng) -> Result<EpisodeStats>
where
    R: RemoteBoundary,
    W: WorldReset,
{
    let (obs, _info) = env.reset().await?;
    info!("Episode start: {}", obs.summary());

    let n_actions = env.catalog().len();
    let mut stats = EpisodeStats::default();
    loop {
        let index = rng.gen_range(0..n_actions);
        let result = env.step(index).await?;
        stats.steps += 1;
        stats.total_reward += result.reward;

        if result.done() {
            stats.terminated = result.terminated;
            stats.creeps_until_lvl2 = result.info.creeps_until_lvl2;
            stats.ticks_until_lvl2 = result.info.ticks_until_lvl2;
            return Ok(stats);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let episodes: u64 = args.get(1).map(|s| s.parse()).transpose()?.unwrap_or(1);
    let seed: Option<u64> = args.get(2).map(|s| s.parse()).transpose()?;

    let screeps = ScreepsConfig::from_env()?;
    let env_config = EnvConfig::from_env()?;
    info!(
        "screeps-rl starting: {} episode(s) on {} ({})",
        episodes,
        screeps.base_url(),
        env_config.shard
    );

    let api = ScreepsApi::new(screeps)?;
    let world = CommandReset::new(ResetConfig::from_env());
    let mut env = ScreepsSpawnEnv::new(api, world, env_config);
    for component in env.reward_components() {
        debug!(
            "Reward component {}: {}",
            component.name,
            component.description.unwrap_or_default()
        );
    }

    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };

    for episode in 1..=episodes {
        let stats = run_episode(&mut env, &mut rng).await?;
        info!(
            episode,
            steps = stats.steps,
            total_reward = stats.total_reward,
            terminated = stats.terminated,
            creeps_to_rcl2 = ?stats.creeps_until_lvl2,
            ticks_to_rcl2 = ?stats.ticks_until_lvl2,
            "Episode finished"
        );
    }

    Ok(())
}
