//! URL slugs for catalog entities.
//!
//! A slug is matched back to its entity by re-scanning catalog names, so the
//! function only has to be stable, not reversible.

/// Lowercase, drop characters outside `[a-z0-9\s-]`, collapse whitespace,
/// underscore and hyphen runs to one hyphen, trim hyphens at both ends.
pub fn slug(name: &str) -> String {
    let lowered = name.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut pending_sep = false;
    for c in kept.chars() {
        if c.is_whitespace() || c == '-' || c == '_' {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('-');
        }
        pending_sep = false;
        out.push(c);
    }
    out
}

/// True when `segment` is the slug of `name`.
pub fn matches(name: &str, segment: &str) -> bool {
    slug(name) == segment
}
