//! Embed controller: orchestrates oEmbed fetch, script load, and enhancement
//! into the lifecycle of one mounted embed.
//!
//! The controller renders a readable fallback as soon as it has one and
//! upgrades to a live widget when the third party cooperates, never blocking
//! on network failure. A failing embed degrades alone; the page and the other
//! instances are unaffected.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::loader::{ScriptLoader, WidgetPlatform};
use crate::normalize::normalize_post_url;
use crate::oembed::OEmbedFetcher;
use crate::poll::{poll_until, CancelFlag, PollVerdict};
use crate::state::{step, EmbedEvent, EmbedState};
use crate::surface::EmbedSurface;
use crate::visibility::VisibilityGate;

/// How often to look for enhancement evidence.
pub const ENHANCEMENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long to keep looking before settling ready-or-error.
pub const ENHANCEMENT_BUDGET: Duration = Duration::from_millis(4500);

/// Timing knobs for the enhancement wait, overridable in tests.
#[derive(Debug, Clone, Copy)]
pub struct EmbedTiming {
    pub poll_interval: Duration,
    pub budget: Duration,
}

impl Default for EmbedTiming {
    fn default() -> Self {
        Self {
            poll_interval: ENHANCEMENT_POLL_INTERVAL,
            budget: ENHANCEMENT_BUDGET,
        }
    }
}

/// One mounted occurrence of an embed: one post URL, one surface, one
/// lifecycle. Re-mounting means constructing a fresh instance.
pub struct EmbedInstance {
    id: Uuid,
    url: String,
    surface: Arc<dyn EmbedSurface>,
    gate: VisibilityGate,
    cancel: CancelFlag,
    state: Mutex<EmbedState>,
}

impl EmbedInstance {
    /// Create an instance for a raw post URL. The URL is normalized here so
    /// the cache key and the rendered link always agree.
    #[must_use]
    pub fn new(raw_url: &str, surface: Arc<dyn EmbedSurface>, lazy: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: normalize_post_url(raw_url),
            surface,
            gate: if lazy {
                VisibilityGate::deferred()
            } else {
                VisibilityGate::eager()
            },
            cancel: CancelFlag::new(),
            state: Mutex::new(EmbedState::Idle),
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Canonical post URL. Always reachable to the user as a raw link,
    /// whatever state the embed is in.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn gate(&self) -> &VisibilityGate {
        &self.gate
    }

    pub fn state(&self) -> EmbedState {
        *self.state.lock().expect("state lock poisoned")
    }

    /// Tear the instance down. Pending waits are abandoned and no state
    /// update lands afterwards; shared caches are untouched.
    pub fn unmount(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_unmounted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Apply an event, unless the instance was unmounted in the meantime.
    fn apply(&self, event: EmbedEvent) -> EmbedState {
        let mut state = self.state.lock().expect("state lock poisoned");
        if self.cancel.is_cancelled() {
            return *state;
        }
        *state = step(*state, event);
        *state
    }
}

/// Drives embed instances through their lifecycle.
///
/// Holds the process-wide collaborators (fetcher with its cache, the
/// single-flight script loader, the widget platform); instances stay fully
/// independent of each other.
pub struct EmbedController {
    fetcher: OEmbedFetcher,
    loader: Arc<ScriptLoader>,
    platform: Arc<dyn WidgetPlatform>,
    timing: EmbedTiming,
}

impl EmbedController {
    #[must_use]
    pub fn new(
        fetcher: OEmbedFetcher,
        loader: Arc<ScriptLoader>,
        platform: Arc<dyn WidgetPlatform>,
    ) -> Self {
        Self::with_timing(fetcher, loader, platform, EmbedTiming::default())
    }

    #[must_use]
    pub fn with_timing(
        fetcher: OEmbedFetcher,
        loader: Arc<ScriptLoader>,
        platform: Arc<dyn WidgetPlatform>,
        timing: EmbedTiming,
    ) -> Self {
        Self {
            fetcher,
            loader,
            platform,
            timing,
        }
    }

    #[must_use]
    pub fn fetcher(&self) -> &OEmbedFetcher {
        &self.fetcher
    }

    /// Run one instance to a settled state.
    ///
    /// Waits for the visibility gate, fetches the oEmbed snippet, injects it
    /// if non-empty, then asks the widget platform to enhance the surface and
    /// polls for evidence. Dropping the returned future abandons all pending
    /// work; [`EmbedInstance::unmount`] additionally fences off any state
    /// update from a driver that is still running.
    #[instrument(skip_all, fields(id = %instance.id(), url = %instance.url()))]
    pub async fn run(&self, instance: &EmbedInstance) -> EmbedState {
        instance.gate.wait().await;
        if instance.is_unmounted() {
            return instance.state();
        }

        instance.apply(EmbedEvent::LoadRequested);

        let outcome = self.fetcher.fetch(&instance.url).await;
        if instance.is_unmounted() {
            return instance.state();
        }

        let has_html = !outcome.html.is_empty();
        if has_html {
            // Best-available content goes up immediately; the state stays
            // `Loading` until the upgrade settles one way or the other.
            instance.surface.inject_html(&outcome.html);
        }
        instance.apply(EmbedEvent::OembedResolved { has_html });
        debug!(has_html, from_cache = outcome.from_cache, "oEmbed resolved");

        self.loader.ensure_loaded().await;
        if instance.is_unmounted() {
            return instance.state();
        }

        self.platform.enhance(instance.surface.as_ref());

        let verdict = poll_until(
            || instance.surface.has_interactive_frame(),
            self.timing.poll_interval,
            self.timing.budget,
            &instance.cancel,
        )
        .await;

        match verdict {
            PollVerdict::Satisfied => instance.apply(EmbedEvent::EnhancementDetected),
            PollVerdict::Expired => instance.apply(EmbedEvent::BudgetExpired { has_html }),
            PollVerdict::Cancelled => instance.state(),
        }
    }

    /// Drive several instances concurrently — a page render with many
    /// embeds. Instances remain fully independent; one failing embed does
    /// not affect the others.
    pub async fn run_all(&self, instances: &[Arc<EmbedInstance>]) -> Vec<EmbedState> {
        futures::future::join_all(instances.iter().map(|instance| self.run(instance))).await
    }
}
