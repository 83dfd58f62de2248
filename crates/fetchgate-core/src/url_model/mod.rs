//! URL validation and page filename derivation.
//!
//! Every fetched page lands in the output directory under a name derived
//! purely from its URL: scheme stripped, path separators replaced, `.html`
//! appended. Distinct URLs can collide after this mapping; the later write
//! wins.

mod sanitize;

pub use sanitize::{sanitize_page_stem, NAME_MAX};

use crate::retry::FetchError;
use url::Url;

/// Suffix appended to every page file.
pub const PAGE_SUFFIX: &str = ".html";

/// Stem used when a URL has nothing left after stripping the scheme.
const EMPTY_STEM: &str = "index";

/// Parses `raw` and checks it is an absolute http(s) URL.
pub fn parse_page_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidUrl(format!(
            "{}: unsupported scheme {:?}",
            raw, other
        ))),
    }
}

/// Derives the on-disk page name for a URL.
///
/// # Examples
///
/// - `page_file_name("https://example.com")` → `"example.com.html"`
/// - `page_file_name("http://example.com/a/b")` → `"example.com_a_b.html"`
pub fn page_file_name(url: &str) -> String {
    let trimmed = url.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);

    let stem = sanitize_page_stem(without_scheme, NAME_MAX - PAGE_SUFFIX.len());
    let stem = if stem.is_empty() { EMPTY_STEM } else { &stem };
    format!("{}{}", stem, PAGE_SUFFIX)
}
