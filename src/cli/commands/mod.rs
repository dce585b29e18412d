//! CLI command implementations.

mod config;
mod export;
mod list;
mod process;
mod serve;
mod show;
mod stats;

pub use config::run_config;
pub use export::run_export;
pub use list::run_list;
pub use process::run_process;
pub use serve::run_serve;
pub use show::run_show;
pub use stats::run_stats;
