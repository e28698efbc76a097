//! Tweet URL normalization and validation.
//!
//! Every component that touches a post URL goes through [`normalize_post_url`]
//! first, so cache keys and validity checks always agree on one spelling.
//!
//! # Example
//!
//! ```rust
//! use tweetframe::normalize::{normalize_post_url, is_likely_post_url};
//!
//! let canonical = normalize_post_url("x.com/naval/status/1234567890");
//! assert_eq!(canonical, "https://twitter.com/naval/status/1234567890");
//! assert!(is_likely_post_url(&canonical));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// The single host all accepted spellings collapse to.
pub const CANONICAL_HOST: &str = "twitter.com";

/// Alternate host spellings rewritten to the canonical form.
///
/// Trailing slash is part of the match: a bare host with no path is left alone.
const ALTERNATE_HOSTS: [&str; 4] = ["x.com/", "www.x.com/", "twitter.com/", "www.twitter.com/"];

static STATUS_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/status/\d+").expect("status path pattern compiles"));

/// Rewrite any accepted spelling of a tweet URL to the canonical
/// `https://twitter.com/...` form.
///
/// Pure and total: input with no recognizable host comes back trimmed but
/// otherwise unchanged. Rejection of junk is the caller's job (see
/// [`is_likely_post_url`]).
#[must_use]
pub fn normalize_post_url(raw: &str) -> String {
    let trimmed = raw.trim();

    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);

    for host in ALTERNATE_HOSTS {
        if let Some(path) = without_scheme.strip_prefix(host) {
            return format!("https://{CANONICAL_HOST}/{path}");
        }
    }

    trimmed.to_string()
}

/// Check whether a URL looks like a real tweet permalink.
///
/// True iff the URL parses, uses `https`, sits exactly on the canonical host,
/// and its path contains a numeric `/status/<id>` segment. This is the only
/// input gate in front of the proxy endpoint and must run before any outbound
/// request, otherwise the endpoint degenerates into an open proxy.
#[must_use]
pub fn is_likely_post_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    parsed.scheme() == "https"
        && parsed.host_str() == Some(CANONICAL_HOST)
        && STATUS_PATH_RE.is_match(parsed.path())
}
