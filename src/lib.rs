//! `tweetframe` - Auto-upgrading tweet embeds
//!
//! # Features
//!
//! - **URL normalization**: every `x.com`/`twitter.com` spelling collapses to
//!   one canonical form, shared by cache keys, validity checks, and links
//! - **oEmbed proxy**: validated, client-cacheable `/twitter-oembed/` endpoint
//!   in front of the provider
//! - **Single-flight script loader**: the widget script is requested at most
//!   once per process, with a bounded wait that never fails
//! - **Graceful degradation**: an explicit state machine settles each embed
//!   into `Ready` or `Error`, and a plain external link survives every outcome
//!
//! # Example
//!
//! ```rust
//! use tweetframe::normalize::normalize_post_url;
//! use tweetframe::state::{step, EmbedEvent, EmbedState};
//!
//! let canonical = normalize_post_url("x.com/naval/status/1234567890");
//! assert_eq!(canonical, "https://twitter.com/naval/status/1234567890");
//!
//! let state = step(EmbedState::Idle, EmbedEvent::LoadRequested);
//! assert_eq!(state, EmbedState::Loading);
//! ```

pub mod controller;
pub mod loader;
pub mod normalize;
pub mod oembed;
pub mod poll;
pub mod proxy;
pub mod render;
pub mod state;
pub mod surface;
pub mod visibility;

pub use controller::{EmbedController, EmbedInstance, EmbedTiming};
pub use loader::{enhance_page, ScriptLoader, WidgetPlatform};
pub use normalize::{is_likely_post_url, normalize_post_url};
pub use oembed::{FetchOutcome, HttpTransport, OEmbedCache, OEmbedFetcher, OEmbedTransport};
pub use poll::{poll_until, CancelFlag, PollVerdict};
pub use proxy::{build_router, HttpUpstream, OembedUpstream, ProxyError};
pub use render::render_static;
pub use state::{step, EmbedEvent, EmbedState};
pub use surface::{EmbedSurface, HtmlSurface};
pub use visibility::VisibilityGate;

/// Version of tweetframe
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
