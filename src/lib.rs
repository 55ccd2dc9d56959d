pub mod compact;
pub mod config;
pub mod error;
pub mod guest;
pub mod locator;
pub mod model;
pub mod orchestrator;
pub mod platform;
pub mod utils;

pub use config::AppConfig;
pub use error::Error;
pub use model::{CompactionMethod, CompactionOutcome, RunSummary, VirtualDiskImage};
pub use orchestrator::{Orchestrator, OrchestratorConfig, RunReport};
