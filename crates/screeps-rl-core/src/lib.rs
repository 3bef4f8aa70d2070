//! # screeps-rl-core
//!
//! Core types for the Screeps spawn-control environment.
//!
//! This crate provides the pure, transport-free pieces of the environment:
//! - The discrete action catalog (body compositions × roles, plus wait)
//! - Observation layout and space bounds
//! - Defensive decoding of raw memory values
//! - Episode bookkeeping
//! - Reward shaping

pub mod action;
pub mod decode;
pub mod episode;
pub mod error;
pub mod observation;
pub mod reward;

pub use action::{Action, ActionCatalog, ActionSpace, BodyPart, Role};
pub use decode::{LenientDecoder, StateDecoder, decode_count, decode_observation};
pub use episode::EpisodeTracker;
pub use error::{Result, ScreepsRlError};
pub use observation::{OBS_DIM, Observation, ObservationSpace, StepInfo, StepResult};
pub use reward::{
    Reward, RewardComponentDef, RewardComponents, RewardConfig, RewardFunction, SpawnReward,
};
