//! Slugs for category names.
//!
//! Category names are free text chosen by the user; file names on disk are
//! derived from them with [`category_file_stem`].

use sha2::{Digest, Sha256};

/// Stem used for the root category's files.
pub const ROOT_FILE_STEM: &str = "root";

/// Normalize free text into a lowercase dash-separated slug.
///
/// # Examples
/// ```
/// use listsync_core::slug::normalize_slug;
///
/// assert_eq!(normalize_slug("Close Friends"), "close-friends");
/// assert_eq!(normalize_slug("  work  "), "work");
/// assert_eq!(normalize_slug("a--b"), "a-b");
/// assert_eq!(normalize_slug("Hello World!"), "hello-world");
/// ```
pub fn normalize_slug(input: &str) -> String {
    let normalized: String = input
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();

    collapse_dashes(&normalized)
}

/// Collapse consecutive dashes and remove leading/trailing dashes.
fn collapse_dashes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_dash = true; // Start true to skip leading dashes

    for c in s.chars() {
        if c == '-' {
            if !prev_was_dash {
                result.push(c);
                prev_was_dash = true;
            }
        } else {
            result.push(c);
            prev_was_dash = false;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// File stem for a category: the slug plus a short hash of the exact name, so
/// "Work" and "work!" never share a file.
pub fn category_file_stem(category: &str) -> String {
    if category.is_empty() {
        return ROOT_FILE_STEM.to_string();
    }
    let digest = Sha256::digest(category.as_bytes());
    let short_hash = hex::encode(&digest[..4]);
    let slug = normalize_slug(category);
    if slug.is_empty() {
        format!("category-{}", short_hash)
    } else {
        format!("{}-{}", slug, short_hash)
    }
}

/// Result of validating a user-supplied category name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryNameValidation {
    /// Trimmed name, ready to use
    Valid(String),
    /// Empty after trimming (reserved for the root category)
    Empty,
    /// Contains a control character
    ControlCharacter,
}

pub fn validate_category_name(input: &str) -> CategoryNameValidation {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        CategoryNameValidation::Empty
    } else if trimmed.chars().any(char::is_control) {
        CategoryNameValidation::ControlCharacter
    } else {
        CategoryNameValidation::Valid(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_slug() {
        assert_eq!(normalize_slug("Close Friends"), "close-friends");
        assert_eq!(normalize_slug("-test-"), "test");
        assert_eq!(normalize_slug("with_underscores"), "with-underscores");
        assert_eq!(normalize_slug("123-numeric"), "123-numeric");
    }

    #[test]
    fn test_collapse_dashes() {
        assert_eq!(collapse_dashes("a---b"), "a-b");
        assert_eq!(collapse_dashes("-both-"), "both");
    }

    #[test]
    fn test_category_file_stem() {
        assert_eq!(category_file_stem(""), "root");
        let work = category_file_stem("Work");
        assert!(work.starts_with("work-"));
        assert_ne!(work, category_file_stem("work!"));
        assert!(category_file_stem("!!!").starts_with("category-"));
        assert_eq!(category_file_stem("Work"), work);
    }

    #[test]
    fn test_validate_category_name() {
        assert_eq!(
            validate_category_name("  Friends "),
            CategoryNameValidation::Valid("Friends".to_string())
        );
        assert_eq!(validate_category_name("   "), CategoryNameValidation::Empty);
        assert_eq!(
            validate_category_name("a\nb"),
            CategoryNameValidation::ControlCharacter
        );
    }
}
