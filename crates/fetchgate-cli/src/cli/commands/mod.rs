//! CLI command handlers.

pub(crate) mod fetch;
mod show_config;

pub use fetch::{run_fetch, FetchRequest};
pub use show_config::run_show_config;
