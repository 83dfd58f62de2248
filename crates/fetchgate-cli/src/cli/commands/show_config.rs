//! `fetchgate config` – print the effective configuration.

use anyhow::Result;
use fetchgate_core::config::FetchgateConfig;
use std::path::Path;

pub fn run_show_config(cfg: &FetchgateConfig, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        println!("# {}", path.display());
    }
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}
