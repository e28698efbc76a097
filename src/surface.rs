//! Embed surface seam.
//!
//! The controller never touches a rendering target directly; it talks to an
//! [`EmbedSurface`]. In the browser that would be the instance's DOM region.
//! Here the concrete implementation is an HTML buffer, which is what the
//! server-side renderer and the tests use.

use std::sync::Mutex;

use scraper::{Html, Selector};

/// One embed instance's private rendering region.
///
/// Implementations must tolerate concurrent reads from the enhancement poll
/// while content is being injected.
pub trait EmbedSurface: Send + Sync {
    /// Replace the region's content with new markup.
    fn inject_html(&self, html: &str);

    /// Whether an embedded interactive frame is present — the evidence that
    /// the widget script successfully upgraded this region.
    fn has_interactive_frame(&self) -> bool;
}

/// Buffer-backed surface for server-side rendering and tests.
#[derive(Debug, Default)]
pub struct HtmlSurface {
    content: Mutex<String>,
}

impl HtmlSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current markup of the region.
    pub fn content(&self) -> String {
        self.content.lock().expect("surface lock poisoned").clone()
    }
}

impl EmbedSurface for HtmlSurface {
    fn inject_html(&self, html: &str) {
        *self.content.lock().expect("surface lock poisoned") = html.to_string();
    }

    fn has_interactive_frame(&self) -> bool {
        let content = self.content.lock().expect("surface lock poisoned").clone();
        if content.is_empty() {
            return false;
        }

        // Parse rather than substring-match, so commented-out or escaped
        // markup does not count as evidence.
        let fragment = Html::parse_fragment(&content);
        let Ok(iframe) = Selector::parse("iframe") else {
            return false;
        };
        fragment.select(&iframe).next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_surface_has_no_frame() {
        let surface = HtmlSurface::new();
        assert!(!surface.has_interactive_frame());
        assert_eq!(surface.content(), "");
    }

    #[test]
    fn injected_markup_replaces_previous_content() {
        let surface = HtmlSurface::new();
        surface.inject_html("<blockquote>first</blockquote>");
        surface.inject_html("<p>second</p>");
        assert_eq!(surface.content(), "<p>second</p>");
    }

    #[test]
    fn iframe_element_counts_as_enhancement_evidence() {
        let surface = HtmlSurface::new();
        surface.inject_html(r#"<div><iframe src="https://platform.twitter.com/embed/x"></iframe></div>"#);
        assert!(surface.has_interactive_frame());
    }

    #[test]
    fn blockquote_fallback_is_not_enhancement_evidence() {
        let surface = HtmlSurface::new();
        surface.inject_html(r#"<blockquote class="twitter-tweet"><a href="https://twitter.com/u/status/1"></a></blockquote>"#);
        assert!(!surface.has_interactive_frame());
    }

    #[test]
    fn escaped_iframe_text_is_not_evidence() {
        let surface = HtmlSurface::new();
        surface.inject_html("<p>&lt;iframe&gt; is mentioned, not present</p>");
        assert!(!surface.has_interactive_frame());
    }
}
