//! Project slug generation.

use std::collections::HashSet;

use crate::error::CoreError;

/// Maximum slug length (before any uniqueness suffix).
pub const MAX_SLUG_LEN: usize = 80;

/// Fold common Latin accented characters to their ASCII base letter.
fn fold_accent(c: char) -> Option<char> {
    let folded = match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(folded)
}

/// Generate a URL-safe slug from a project title.
///
/// Lowercases, folds accents, replaces everything that is not ASCII
/// alphanumeric with hyphens, collapses consecutive hyphens, trims them from
/// both ends and truncates to [`MAX_SLUG_LEN`]. Falls back to `"project"`
/// when nothing usable remains.
pub fn generate_slug(title: &str) -> String {
    let mut result = String::with_capacity(title.len());
    let mut prev_hyphen = true;
    for c in title.to_lowercase().chars() {
        let c = fold_accent(c).unwrap_or(c);
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen {
            result.push('-');
            prev_hyphen = true;
        }
    }

    result.truncate(MAX_SLUG_LEN);
    let trimmed = result.trim_matches('-');
    if trimmed.is_empty() {
        "project".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Pick the first free slug among `base`, `base-2`, `base-3`, ...
///
/// `taken` holds the slugs already in use that start with `base`.
pub fn unique_slug(base: &str, taken: &[String]) -> String {
    let taken: HashSet<&str> = taken.iter().map(String::as_str).collect();
    if !taken.contains(base) {
        return base.to_string();
    }
    (2u32..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}

/// Validate a client-supplied slug (non-empty, lowercase alphanumeric + hyphens).
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if slug.is_empty() || slug.len() > MAX_SLUG_LEN + 8 {
        return Err(CoreError::Validation("Slug has an invalid length".to_string()));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(CoreError::Validation(
            "Slug may only contain lowercase letters, digits and hyphens".to_string(),
        ));
    }
    Ok(())
}
