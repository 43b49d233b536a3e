// detailed implementation
pub mod algorithms;
pub mod config;
pub mod env_checker;
pub mod environments;
pub mod error;
pub mod harness;
pub mod networks;
pub mod policies;
pub mod replay_buffer;
pub mod report;
pub mod spaces;
pub mod utils;

// Traits
pub mod agent;
pub mod environment;
pub mod policy;

pub use error::{Error, Result};
