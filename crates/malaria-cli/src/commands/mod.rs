//! Command implementations for the CLI.

mod analyze;
mod config;
mod export;
mod health;
mod history;
mod info;

pub use analyze::{AnalyzeArgs, cmd_analyze};
pub use config::cmd_config;
pub use export::cmd_export;
pub use health::cmd_health;
pub use history::cmd_history;
pub use info::{StoreSummary, cmd_info};
