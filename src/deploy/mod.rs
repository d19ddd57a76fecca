pub mod deployer;
pub mod environment;
pub mod runner;

pub use deployer::{Deployer, Deployment};
pub use environment::Environment;
pub use runner::{CommandOutput, CommandRunner, TokioCommandRunner};
