//! Linux-safe page filename cleanup.

/// Linux NAME_MAX in bytes.
pub const NAME_MAX: usize = 255;

/// Replaces bytes that cannot appear in a Linux filename component.
///
/// - `/`, `\`, NUL, and control characters become `_`
/// - Leading dots are dropped so a name is never hidden, `.` or `..`
/// - Length is capped at `max_len` bytes on a char boundary
///
/// Unlike general download names, runs of `_` are kept as-is: two URLs that
/// differ only in slash count should still map to different pages.
pub fn sanitize_page_stem(stem: &str, max_len: usize) -> String {
    let mapped: String = stem
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c == '\0' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = mapped.trim_start_matches('.');
    if trimmed.len() <= max_len {
        return trimmed.to_string();
    }
    let mut take = max_len;
    while take > 0 && !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    trimmed[..take].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_slash_and_backslash() {
        assert_eq!(sanitize_page_stem("a/b\\c", NAME_MAX), "a_b_c");
    }

    #[test]
    fn keeps_repeated_underscores() {
        assert_eq!(sanitize_page_stem("host//path", NAME_MAX), "host__path");
    }

    #[test]
    fn control_chars() {
        assert_eq!(sanitize_page_stem("page\x00name\n", NAME_MAX), "page_name_");
    }

    #[test]
    fn strips_leading_dots() {
        assert_eq!(sanitize_page_stem("../etc", NAME_MAX), "_etc");
    }

    #[test]
    fn caps_on_char_boundary() {
        let long = "é".repeat(200);
        let out = sanitize_page_stem(&long, 11);
        assert_eq!(out.len(), 10);
        assert!(out.chars().all(|c| c == 'é'));
    }
}
