//! Remote boundary traits
//!
//! The environment never talks to the server directly; it goes through these
//! traits so the HTTP client, a replay, or a scripted test double can stand in.

use async_trait::async_trait;
use screeps_rl_core::Result;
use std::sync::Arc;

/// Console execution and memory reads against one Screeps server
#[async_trait]
pub trait RemoteBoundary: Send + Sync {
    /// Execute console code. No structured result is returned.
    async fn dispatch_command(&self, code: &str, shard: &str) -> Result<()>;

    /// Read a top-level memory key. The value may be wrapped in an envelope.
    async fn read_memory(&self, key: &str, shard: &str) -> Result<serde_json::Value>;
}

#[async_trait]
impl<T: RemoteBoundary + ?Sized> RemoteBoundary for Arc<T> {
    async fn dispatch_command(&self, code: &str, shard: &str) -> Result<()> {
        (**self).dispatch_command(code, shard).await
    }

    async fn read_memory(&self, key: &str, shard: &str) -> Result<serde_json::Value> {
        (**self).read_memory(key, shard).await
    }
}

/// Administrative reinitialization of the training room
#[async_trait]
pub trait WorldReset: Send + Sync {
    /// Restore the room to its starting state. Failure aborts the reset.
    async fn reset_world(&self) -> Result<()>;
}

#[async_trait]
impl<T: WorldReset + ?Sized> WorldReset for Arc<T> {
    async fn reset_world(&self) -> Result<()> {
        (**self).reset_world().await
    }
}
