//! HTML rendering of embed states.
//!
//! Markup mirrors the site's embed widget: a skeleton while loading, the
//! provider's own snippet once available, a compact "unavailable" card on
//! total failure. Whatever the state, a plain link to the original post is
//! part of the output, so the user always has somewhere to click.

use tracing::warn;

use crate::normalize::{is_likely_post_url, normalize_post_url};
use crate::proxy::OembedUpstream;
use crate::state::EmbedState;

/// Minimal attribute escaping for URLs interpolated into `href`.
fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// The provider-recognized fallback: a bare blockquote the widget script
/// knows how to upgrade. Shown whenever no oEmbed snippet exists.
#[must_use]
pub fn fallback_blockquote(canonical_url: &str) -> String {
    let href = escape_attr(canonical_url);
    format!(r#"<blockquote class="twitter-tweet"><a href="{href}"></a></blockquote>"#)
}

/// Skeleton shown while the embed is still settling.
#[must_use]
pub fn loading_markup(canonical_url: &str) -> String {
    let href = escape_attr(canonical_url);
    format!(
        concat!(
            r#"<div class="tweet-loading">"#,
            r#"<div class="tweet-loading-header">"#,
            r#"<span>Ładowanie tweeta...</span>"#,
            r#" <a href="{href}" target="_blank" rel="noreferrer">Otwórz w nowej karcie</a>"#,
            "</div>",
            r#"<div class="tweet-skeleton long"></div>"#,
            r#"<div class="tweet-skeleton medium"></div>"#,
            r#"<div class="tweet-skeleton short"></div>"#,
            "</div>"
        ),
        href = href
    )
}

/// Compact notice for the only user-visible failure: nothing readable was
/// obtained within budget. The external link still works.
#[must_use]
pub fn error_markup(canonical_url: &str) -> String {
    let href = escape_attr(canonical_url);
    format!(
        concat!(
            r#"<div class="tweet-error">"#,
            "<div>Tweet niedostępny</div>",
            "<p>Jeśli masz adblocka lub X blokuje embedy, otwórz link w nowej karcie.</p>",
            r#"<a href="{href}" target="_blank" rel="noreferrer">Otwórz tweeta</a>"#,
            "</div>"
        ),
        href = href
    )
}

/// The embed's content region: the provider snippet when one exists,
/// otherwise the upgradeable blockquote fallback.
#[must_use]
pub fn embed_region(canonical_url: &str, html: &str) -> String {
    let content = if html.is_empty() {
        fallback_blockquote(canonical_url)
    } else {
        html.to_string()
    };
    format!(r#"<div class="tweet-embed">{content}</div>"#)
}

/// Render the full region for a given lifecycle state.
#[must_use]
pub fn render_state(state: EmbedState, canonical_url: &str, html: &str) -> String {
    let overlay = match state {
        EmbedState::Idle | EmbedState::Loading => loading_markup(canonical_url),
        EmbedState::Error => error_markup(canonical_url),
        EmbedState::Ready => String::new(),
    };

    let content = if html.is_empty() {
        fallback_blockquote(canonical_url)
    } else {
        html.to_string()
    };

    format!(r#"<div class="tweet-embed">{overlay}{content}</div>"#)
}

/// Server-render-time decision for targets with no widget runtime: fetch the
/// snippet once, ship whatever came back, skip the enhancement step entirely.
///
/// Never fails — a bad URL or a failed upstream degrades to the blockquote
/// fallback with its working link.
pub async fn render_static(upstream: &dyn OembedUpstream, raw_url: &str) -> String {
    let canonical = normalize_post_url(raw_url);
    if !is_likely_post_url(&canonical) {
        warn!(url = %canonical, "not a recognizable tweet URL; rendering bare fallback");
        return embed_region(&canonical, "");
    }

    match upstream.fetch_oembed(&canonical).await {
        Ok(reply) if reply.status.is_success() => embed_region(&canonical, &reply.html),
        Ok(reply) => {
            warn!(status = %reply.status, "oEmbed upstream returned non-success");
            embed_region(&canonical, "")
        }
        Err(e) => {
            warn!(error = %e, "oEmbed upstream unreachable");
            embed_region(&canonical, "")
        }
    }
}
