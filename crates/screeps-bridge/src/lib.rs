//! Screeps bridge for screeps-rl
//!
//! Connects the environment to a real Screeps server:
//!
//! - **Commands and state**: the web API console and memory endpoints
//! - **World reset**: an operator-supplied script run once per episode

mod api;
mod config;
mod reset;

pub use api::{ScreepsApi, inflate_memory};
pub use config::{ResetConfig, ScreepsConfig};
pub use reset::CommandReset;
