pub mod config;
pub mod deploy;
pub mod error;
pub mod github;
pub mod play;
pub mod trigger;
pub mod workflow;
