//! Slug derivation and validation.
//!
//! Slugs are unique per owner across the whole garden, so a note can be
//! addressed by its path regardless of where it sits in the tree.

/// Maximum length of a generated slug. Uniqueness suffixes may push the
/// stored value slightly past this; the column accepts up to 255.
pub const MAX_SLUG_LENGTH: usize = 200;

/// Derives a slug from a human-readable title.
///
/// Lowercases, turns whitespace/underscore/hyphen runs into a single
/// hyphen, drops everything outside `[a-z0-9-]`, trims hyphens at both
/// ends, and truncates to [`MAX_SLUG_LENGTH`]. A title with no usable
/// characters yields an empty string; callers substitute a fallback.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len().min(MAX_SLUG_LENGTH));
    let mut pending_hyphen = false;

    for c in title.to_lowercase().chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            // Leading separators are dropped, interior runs collapse.
            pending_hyphen = !slug.is_empty();
            continue;
        }
        if c.is_ascii_alphanumeric() {
            if pending_hyphen {
                slug.push('-');
                pending_hyphen = false;
            }
            slug.push(c);
        }
    }

    slug.truncate(MAX_SLUG_LENGTH);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Checks a slug against the stored format: `^[a-z0-9]+(-[a-z0-9]+)*$`,
/// at most 255 bytes.
pub fn is_valid_slug(slug: &str) -> bool {
    if slug.is_empty() || slug.len() > 255 {
        return false;
    }

    let mut prev_was_hyphen = true; // rejects a leading hyphen
    for c in slug.chars() {
        match c {
            'a'..='z' | '0'..='9' => prev_was_hyphen = false,
            '-' => {
                if prev_was_hyphen {
                    return false;
                }
                prev_was_hyphen = true;
            }
            _ => return false,
        }
    }
    !prev_was_hyphen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_titles() {
        assert_eq!(generate_slug("Hello World"), "hello-world");
        assert_eq!(generate_slug("My First Note!"), "my-first-note");
        assert_eq!(generate_slug("snake_case_title"), "snake-case-title");
    }

    #[test]
    fn separator_runs_collapse() {
        assert_eq!(generate_slug("a  -  b"), "a-b");
        assert_eq!(generate_slug("a___b---c"), "a-b-c");
        assert_eq!(generate_slug("  padded  "), "padded");
    }

    #[test]
    fn non_ascii_is_dropped() {
        assert_eq!(generate_slug("Café ☕ Notes"), "caf-notes");
        assert_eq!(generate_slug("日本語"), "");
    }

    #[test]
    fn punctuation_only_title_is_empty() {
        assert_eq!(generate_slug("!!! ???"), "");
    }

    #[test]
    fn truncation_never_leaves_a_trailing_hyphen() {
        let title = format!("{}-x", "a".repeat(MAX_SLUG_LENGTH - 1));
        let slug = generate_slug(&title);
        assert!(slug.len() <= MAX_SLUG_LENGTH);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn generated_slugs_are_always_valid_or_empty() {
        for title in [
            "Hello World",
            "  __weird__  input__ ",
            "MiXeD CaSe 123",
            "---",
            "a",
        ] {
            let slug = generate_slug(title);
            assert!(slug.is_empty() || is_valid_slug(&slug), "title: {title:?}");
        }
    }

    #[test]
    fn validation_accepts_canonical_forms() {
        assert!(is_valid_slug("a"));
        assert!(is_valid_slug("a-b-c"));
        assert!(is_valid_slug("note-2"));
        assert!(is_valid_slug("123"));
    }

    #[test]
    fn validation_rejects_bad_forms() {
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("trailing-"));
        assert!(!is_valid_slug("double--hyphen"));
        assert!(!is_valid_slug("Upper"));
        assert!(!is_valid_slug("spa ce"));
        assert!(!is_valid_slug(&"a".repeat(256)));
        assert!(is_valid_slug(&"a".repeat(255)));
    }
}
