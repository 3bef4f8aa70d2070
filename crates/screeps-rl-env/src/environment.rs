//! Step/reset environment over a live Screeps room

use screeps_rl_core::{
    Action, ActionCatalog, ActionSpace, EpisodeTracker, LenientDecoder, Observation,
    ObservationSpace, Result, RewardComponentDef, RewardFunction, ScreepsRlError, SpawnReward,
    StateDecoder, StepInfo, StepResult,
};
use tracing::{debug, info, warn};

use crate::commands::{spawn_command, state_snapshot_command};
use crate::config::EnvConfig;
use crate::remote::{RemoteBoundary, WorldReset};
use crate::sync::{FixedDelay, TickSynchronizer, TickWait};

/// Lifecycle of an environment instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvState {
    /// Never reset
    Unstarted,
    /// Accepting steps
    Ready,
    /// Episode ended; reset required
    Terminated,
}

/// Room-level spawn controller exposed as an RL environment.
///
/// Every step spawns a creep (or waits), lets the server run one tick, then
/// reads back a snapshot computed on the server. One instance per room: two
/// environments pointed at the same room will race each other's commands.
pub struct ScreepsSpawnEnv<R, W> {
    config: EnvConfig,
    sync: TickSynchronizer<R>,
    world: W,
    catalog: ActionCatalog,
    decoder: Box<dyn StateDecoder>,
    reward_fn: Box<dyn RewardFunction>,
    tracker: EpisodeTracker,
    state: EnvState,
    prev: Observation,
}

impl<R: RemoteBoundary, W: WorldReset> ScreepsSpawnEnv<R, W> {
    /// Create an environment with the lenient decoder and the spawn reward
    /// shaped by `config.reward`
    pub fn new(remote: R, world: W, config: EnvConfig) -> Self {
        let clock = FixedDelay::new(config.tick_quantum);
        let sync = TickSynchronizer::new(remote, Box::new(clock), config.shard.clone());
        let reward_fn = SpawnReward::new(config.reward.clone());
        Self {
            config,
            sync,
            world,
            catalog: ActionCatalog::new(),
            decoder: Box::new(LenientDecoder),
            reward_fn: Box::new(reward_fn),
            tracker: EpisodeTracker::new(),
            state: EnvState::Unstarted,
            prev: Observation::DEFAULT,
        }
    }

    /// Use a different decoding strategy
    pub fn with_decoder(mut self, decoder: impl StateDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Use a different reward function.
    ///
    /// Termination still follows `config.reward.goal_level`.
    pub fn with_reward(mut self, reward_fn: impl RewardFunction + 'static) -> Self {
        self.reward_fn = Box::new(reward_fn);
        self
    }

    /// Use a different tick wait strategy
    pub fn with_clock(mut self, clock: impl TickWait + 'static) -> Self {
        self.sync.set_clock(Box::new(clock));
        self
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn action_space(&self) -> ActionSpace {
        self.catalog.action_space()
    }

    pub fn observation_space(&self) -> ObservationSpace {
        ObservationSpace::spawn_room()
    }

    /// Components the reward function may report per step
    pub fn reward_components(&self) -> Vec<RewardComponentDef> {
        self.reward_fn.components()
    }

    pub fn state(&self) -> EnvState {
        self.state
    }

    pub fn tracker(&self) -> &EpisodeTracker {
        &self.tracker
    }

    pub fn remote(&self) -> &R {
        self.sync.remote()
    }

    /// Last observation returned to the caller
    pub fn last_observation(&self) -> Observation {
        self.prev
    }

    /// Reinitialize the room and return the baseline observation
    pub async fn reset(&mut self) -> Result<(Observation, StepInfo)> {
        info!(shard = %self.config.shard, "Resetting environment");
        self.state = EnvState::Unstarted;

        self.world.reset_world().await?;
        self.sync.wait_ticks(self.config.reset_settle_ticks).await;

        self.tracker.on_reset();

        // Let the server finish the current tick, read it, then schedule the
        // measurement for the next one
        self.sync.wait_ticks(1.0).await;
        let obs = self.poll_observation().await;
        self.schedule_snapshot().await?;

        self.prev = obs;
        self.state = EnvState::Ready;
        debug!(?obs, "Reset complete");
        Ok((obs, StepInfo::default()))
    }

    /// Apply one action and advance the room by one tick
    pub async fn step(&mut self, action_index: usize) -> Result<StepResult> {
        match self.state {
            EnvState::Ready => {}
            EnvState::Unstarted => return Err(ScreepsRlError::NotReset),
            EnvState::Terminated => return Err(ScreepsRlError::EpisodeTerminated),
        }

        let action = self.catalog.resolve(action_index)?;
        if let Action::Spawn { role, body } = action {
            let code = spawn_command(role, &body, self.config.spawn_energy_threshold);
            self.sync.dispatch(&code).await?;
        }

        self.sync.wait_ticks(1.0).await;
        let _stale = self.poll_observation().await;
        self.schedule_snapshot().await?;
        // Re-read once the freshly scheduled snapshot has had time to land
        self.sync.wait_ticks(self.config.snapshot_settle_ticks).await;
        let obs = self.poll_observation().await;

        let creeps = self.poll_count().await;
        self.tracker.on_step(creeps);
        debug!(
            tick = self.tracker.tick_count(),
            ctrl_lvl = obs.controller_level(),
            creeps,
            action = %action,
            "step"
        );

        let reward = self.reward_fn.compute(&self.prev, &obs, &action);
        self.prev = obs;

        let terminated = obs.controller_level() >= self.config.reward.goal_level;
        let truncated = !terminated
            && self
                .config
                .max_episode_steps
                .is_some_and(|max| self.tracker.tick_count() >= max);

        let mut info = StepInfo::default();
        if terminated {
            info = self.episode_summary()?;
            info!(
                ticks = self.tracker.tick_count(),
                creeps = ?info.creeps_until_lvl2,
                ticks_to_goal = ?info.ticks_until_lvl2,
                "Controller reached goal level"
            );
        } else if truncated {
            info!(ticks = self.tracker.tick_count(), "Episode truncated");
        }
        if terminated || truncated {
            self.state = EnvState::Terminated;
        }

        if self.config.render {
            info!("{}", self.render());
        }

        Ok(StepResult {
            observation: obs,
            reward: reward.value,
            reward_components: reward.components,
            terminated,
            truncated,
            info,
        })
    }

    /// One-line summary of the last observation
    pub fn render(&self) -> String {
        self.prev.summary()
    }

    fn episode_summary(&self) -> Result<StepInfo> {
        let ticks_until_lvl2 = if self.tracker.first_qualifying_tick().is_some() {
            Some(self.tracker.ticks_since_first_qualifying()?)
        } else {
            warn!("Goal level reached before any creep was counted; ticks_until_lvl2 omitted");
            None
        };
        Ok(StepInfo {
            creeps_until_lvl2: Some(self.tracker.last_count()),
            ticks_until_lvl2,
        })
    }

    async fn schedule_snapshot(&self) -> Result<()> {
        let code = state_snapshot_command(
            &self.config.state_key,
            &self.config.count_key,
            self.config.spawn_energy_threshold,
        );
        self.sync.dispatch(&code).await
    }

    async fn poll_observation(&self) -> Observation {
        let raw = self.sync.poll(&self.config.state_key).await;
        let obs = self.decoder.decode(&raw);
        if !ObservationSpace::spawn_room().contains(&obs) {
            debug!(?obs, "Observation outside the declared bounds");
        }
        obs
    }

    async fn poll_count(&self) -> u64 {
        let raw = self.sync.poll(&self.config.count_key).await;
        self.decoder.decode_count(&raw)
    }
}
