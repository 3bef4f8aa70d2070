//! Tick synchronization
//!
//! The server advances on its own clock and gives no completion signal, so
//! the synchronizer submits a command, sleeps a fixed quantum per tick, then
//! polls derived state. Stale or partial reads are absorbed by the decoder.

use async_trait::async_trait;
use screeps_rl_core::Result;
use std::time::Duration;
use tracing::debug;

use crate::remote::RemoteBoundary;

/// Waits for the remote simulation to advance
#[async_trait]
pub trait TickWait: Send + Sync {
    /// Suspend for roughly `n` ticks; fractional values are allowed
    async fn wait_ticks(&self, n: f64);
}

/// Sleeps `n * quantum`
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    pub quantum: Duration,
}

impl FixedDelay {
    pub fn new(quantum: Duration) -> Self {
        Self { quantum }
    }

    /// Delay for `n` ticks; zero for non-positive or non-finite `n`,
    /// saturating at [`Duration::MAX`]
    pub fn delay_for(&self, n: f64) -> Duration {
        if !n.is_finite() || n <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.quantum.as_secs_f64() * n).unwrap_or(Duration::MAX)
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

#[async_trait]
impl TickWait for FixedDelay {
    async fn wait_ticks(&self, n: f64) {
        let delay = self.delay_for(n);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Submit → wait → poll against one shard
pub struct TickSynchronizer<R> {
    remote: R,
    clock: Box<dyn TickWait>,
    shard: String,
}

impl<R: RemoteBoundary> TickSynchronizer<R> {
    pub fn new(remote: R, clock: Box<dyn TickWait>, shard: impl Into<String>) -> Self {
        Self {
            remote,
            clock,
            shard: shard.into(),
        }
    }

    /// Replace the wait strategy
    pub fn set_clock(&mut self, clock: Box<dyn TickWait>) {
        self.clock = clock;
    }

    pub fn shard(&self) -> &str {
        &self.shard
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Send one command; does not wait for it to take effect
    pub async fn dispatch(&self, command: &str) -> Result<()> {
        debug!(shard = %self.shard, len = command.len(), "dispatch");
        self.remote.dispatch_command(command, &self.shard).await
    }

    pub async fn wait_ticks(&self, n: f64) {
        self.clock.wait_ticks(n).await;
    }

    /// Read a memory key; transport failures read as `Null`
    pub async fn poll(&self, key: &str) -> serde_json::Value {
        match self.remote.read_memory(key, &self.shard).await {
            Ok(value) => value,
            Err(e) => {
                debug!(key, error = %e, "memory read failed, treating as unavailable");
                serde_json::Value::Null
            }
        }
    }
}
