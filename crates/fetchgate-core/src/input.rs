//! Where a batch's URLs come from.
//!
//! Precedence: URLs given as arguments, then a URL list file, then the
//! `urls` list in the config. Having none of the three is a precondition
//! failure; an explicitly empty source is a valid (empty) batch.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("no URLs supplied: pass URLs as arguments, use --input <FILE>, or set `urls` in the config")]
    NoUrlSource,
    #[error("failed to read URL list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parses a URL list: one URL per line, blank lines and `#` comments skipped.
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn load_url_file(path: &Path) -> Result<Vec<String>, InputError> {
    let text = std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_url_list(&text))
}

/// Picks the batch input by precedence.
pub fn resolve_urls(
    args: &[String],
    file: Option<&Path>,
    config_urls: Option<&[String]>,
) -> Result<Vec<String>, InputError> {
    if !args.is_empty() {
        return Ok(args.to_vec());
    }
    if let Some(path) = file {
        return load_url_file(path);
    }
    config_urls
        .map(<[String]>::to_vec)
        .ok_or(InputError::NoUrlSource)
}
