//! Server-relative path rules.
//!
//! Remote paths are slash-separated strings. Two prefix tokens let callers
//! write paths relative to the session instead of hard-coding roots:
//!
//! | token              | resolves against            |
//! |--------------------|-----------------------------|
//! | `~site/`           | the current web root        |
//! | `~sitecollection/` | the site collection root    |
//!
//! Token matching is case-insensitive. Paths without a token pass through
//! unchanged.

/// Token resolved against the current web root.
pub const SITE_TOKEN: &str = "~site/";

/// Token resolved against the site collection root.
pub const SITE_COLLECTION_TOKEN: &str = "~sitecollection/";

/// Joins two path segments with a single separator.
///
/// Empty segments are passed through; a trailing `/` (or `\`) on the first
/// segment is not doubled.
pub fn combine(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return base.to_string();
    }
    if base.is_empty() {
        return relative.to_string();
    }
    let mut combined = base.to_string();
    if !combined.ends_with('/') && !combined.ends_with('\\') {
        combined.push('/');
    }
    combined.push_str(relative);
    combined
}

/// Resolves an optionally prefixed path to a server-relative path.
pub fn resolve(prefixed: &str, site_path: &str, web_path: &str) -> String {
    if let Some(rest) = strip_token(prefixed, SITE_TOKEN) {
        combine(web_path, rest)
    } else if let Some(rest) = strip_token(prefixed, SITE_COLLECTION_TOKEN) {
        combine(site_path, rest)
    } else {
        prefixed.to_string()
    }
}

/// Case-insensitive prefix strip.
fn strip_token<'a>(path: &'a str, token: &str) -> Option<&'a str> {
    if path.len() >= token.len() && path[..token.len()].eq_ignore_ascii_case(token) {
        Some(&path[token.len()..])
    } else {
        None
    }
}

/// Appends a trailing `/` when one is missing.
pub fn ensure_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Strips the web root from a server-relative path, dropping any leading `/`.
///
/// Used for hash-store keys, so stored hashes survive relocating the web.
/// A path outside the web root is returned unchanged.
pub fn web_relative(path: &str, web_path: &str) -> String {
    if !is_under(path, web_path) {
        return path.to_string();
    }
    path[web_path.len()..].trim_start_matches('/').to_string()
}

/// Splits a path into parent and leaf name at the last separator.
///
/// Returns `None` when there is no separator or the leaf is empty.
pub fn parent_and_name(path: &str) -> Option<(&str, &str)> {
    let trimmed = path.trim_end_matches('/');
    let split = trimmed.rfind('/')?;
    let name = &trimmed[split + 1..];
    if name.is_empty() {
        return None;
    }
    // Keep "/" as the parent of a top-level entry.
    let parent = if split == 0 { "/" } else { &trimmed[..split] };
    Some((parent, name))
}

/// True when `path` is the web root or sits beneath it (case-insensitive).
pub fn is_under(path: &str, web_path: &str) -> bool {
    if path.len() < web_path.len() {
        return false;
    }
    if !path[..web_path.len()].eq_ignore_ascii_case(web_path) {
        return false;
    }
    let rest = &path[web_path.len()..];
    web_path.ends_with('/') || rest.is_empty() || rest.starts_with('/')
}
