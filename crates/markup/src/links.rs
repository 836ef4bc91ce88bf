use url::{ParseError, Url};

/// Replacement target for links whose scheme could run script.
pub const BLOCKED_LINK_TARGET: &str = "#";

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Relative references and http/https/mailto URLs are safe to emit as `href`.
pub fn is_safe_link(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => ALLOWED_SCHEMES.contains(&url.scheme()),
        Err(ParseError::RelativeUrlWithoutBase) => true,
        Err(_) => false,
    }
}

pub fn safe_link_target(raw: &str) -> &str {
    if is_safe_link(raw) {
        raw
    } else {
        BLOCKED_LINK_TARGET
    }
}
