//! # screeps-rl-env
//!
//! Step/reset environment bridging a synchronous RL loop to a Screeps room.
//!
//! This crate provides:
//! - `RemoteBoundary` / `WorldReset` traits for the server-side collaborators
//! - The tick synchronizer (submit → wait → poll)
//! - Console code for spawning and state snapshots
//! - `ScreepsSpawnEnv`, the environment itself

pub mod commands;
pub mod config;
pub mod environment;
pub mod remote;
pub mod sync;

pub use config::EnvConfig;
pub use environment::{EnvState, ScreepsSpawnEnv};
pub use remote::{RemoteBoundary, WorldReset};
pub use sync::{FixedDelay, TickSynchronizer, TickWait};
