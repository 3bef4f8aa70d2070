//! World reset via an external command
//!
//! Restoring a room (removing creeps, rewinding the controller, refilling the
//! spawn) needs admin access to the server's storage, which the web API does
//! not offer. Operators supply a script that does it; a non-zero exit aborts
//! the environment reset.

use async_trait::async_trait;
use screeps_rl_core::{Result, ScreepsRlError};
use screeps_rl_env::WorldReset;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::ResetConfig;

/// Runs the configured reset program once per episode
#[derive(Debug, Clone)]
pub struct CommandReset {
    config: ResetConfig,
}

impl CommandReset {
    pub fn new(config: ResetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResetConfig {
        &self.config
    }
}

impl Default for CommandReset {
    fn default() -> Self {
        Self::new(ResetConfig::default())
    }
}

#[async_trait]
impl WorldReset for CommandReset {
    async fn reset_world(&self) -> Result<()> {
        info!(
            "Running world reset: {} {}",
            self.config.program,
            self.config.args.join(" ")
        );

        let mut child = Command::new(&self.config.program)
            .args(&self.config.args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ScreepsRlError::ResetFailed(format!("Failed to start {}: {}", self.config.program, e))
            })?;

        let status = tokio::time::timeout(self.config.timeout, child.wait())
            .await
            .map_err(|_| {
                ScreepsRlError::ResetFailed(format!(
                    "{} timed out after {:?}",
                    self.config.program, self.config.timeout
                ))
            })?
            .map_err(|e| ScreepsRlError::ResetFailed(format!("Failed to wait for reset: {}", e)))?;

        if !status.success() {
            return Err(ScreepsRlError::ResetFailed(format!(
                "{} exited with {}",
                self.config.program, status
            )));
        }

        debug!("World reset finished");
        Ok(())
    }
}
