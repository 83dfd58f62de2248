//! Tests for the config subcommand and global flags.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_config() {
    match parse(&["fetchgate", "config"]) {
        CliCommand::Config => {}
        _ => panic!("expected Config"),
    }
}

#[test]
fn cli_parse_global_config_flag() {
    let cli = Cli::try_parse_from(["fetchgate", "fetch", "--config", "/etc/fg.toml", "https://a.example"])
        .unwrap();
    assert_eq!(cli.config.as_deref(), Some(Path::new("/etc/fg.toml")));
    assert!(matches!(cli.command, CliCommand::Fetch { .. }));
}

#[test]
fn cli_requires_subcommand() {
    assert!(Cli::try_parse_from(["fetchgate"]).is_err());
}
