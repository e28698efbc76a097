//! Single-flight widget script loader.
//!
//! Many embed instances on one page all need the same third-party script.
//! This loader guarantees the script is requested at most once per process,
//! that every caller observes the same completion, and that nobody waits
//! longer than a fixed budget for a resource that may be blocked by the
//! network, an ad blocker, or the third party itself.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::poll::{poll_until, CancelFlag, PollVerdict};
use crate::surface::EmbedSurface;

/// The widget bootstrap script requested exactly once per page lifetime.
pub const WIDGET_SCRIPT_URL: &str = "https://platform.twitter.com/widgets.js";

/// Fixed element id, so repeated mounts detect and reuse an existing tag.
pub const WIDGET_SCRIPT_ELEMENT_ID: &str = "twitter-wjs";

/// Upper bound on waiting for the script to become ready.
pub const SCRIPT_WAIT_BUDGET: Duration = Duration::from_millis(3000);

/// Interval of the readiness poll that covers a script element which already
/// existed from a prior mount, whose load event will never refire.
pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Seam to the third-party widget runtime.
///
/// In the browser this is the script tag plus the global widget object; in a
/// server-side or test target it is whatever stands in for them.
pub trait WidgetPlatform: Send + Sync {
    /// Whether the runtime already exposes a usable enhancement entry point.
    fn is_ready(&self) -> bool;

    /// Request the bootstrap script. Implementations must be idempotent:
    /// if an element with [`WIDGET_SCRIPT_ELEMENT_ID`] already exists it is
    /// reused, not duplicated.
    fn inject_script(&self);

    /// Ask the runtime to upgrade one embed's region.
    fn enhance(&self, surface: &dyn EmbedSurface);

    /// Ask the runtime to sweep every embed region on the page.
    fn enhance_all(&self);
}

/// Idempotent, concurrency-safe loader for the widget script.
///
/// `ensure_loaded` never fails: resolution means "the script is ready, or we
/// have definitively stopped waiting", and it is sticky for the lifetime of
/// the loader.
pub struct ScriptLoader {
    platform: Arc<dyn WidgetPlatform>,
    settled: OnceCell<()>,
    wait_budget: Duration,
    poll_interval: Duration,
}

impl ScriptLoader {
    #[must_use]
    pub fn new(platform: Arc<dyn WidgetPlatform>) -> Self {
        Self::with_timing(platform, SCRIPT_WAIT_BUDGET, READY_POLL_INTERVAL)
    }

    /// Override the wait budget and poll interval (tests).
    #[must_use]
    pub fn with_timing(
        platform: Arc<dyn WidgetPlatform>,
        wait_budget: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            platform,
            settled: OnceCell::new(),
            wait_budget,
            poll_interval,
        }
    }

    /// Wait until the widget script is ready or the budget elapses.
    ///
    /// Safe to call concurrently from any number of instances: the first
    /// caller injects the script, everyone else awaits the same shared
    /// completion. Once settled, all future calls return immediately.
    pub async fn ensure_loaded(&self) {
        if self.platform.is_ready() {
            return;
        }

        self.settled
            .get_or_init(|| async {
                self.platform.inject_script();

                let verdict = poll_until(
                    || self.platform.is_ready(),
                    self.poll_interval,
                    self.wait_budget,
                    &CancelFlag::new(),
                )
                .await;

                match verdict {
                    PollVerdict::Satisfied => debug!("widget script ready"),
                    // Resolve anyway so the UI never hangs on a blocked or
                    // slow third-party resource.
                    PollVerdict::Expired => {
                        warn!(budget = ?self.wait_budget, "widget script not ready within budget; resolving anyway");
                    }
                    PollVerdict::Cancelled => {}
                }
            })
            .await;
    }
}

/// Page-level sweep: make sure the script is present, then enhance every
/// embed region at once. Used by list pages that render many static
/// fallbacks in one go.
pub async fn enhance_page(loader: &ScriptLoader, platform: &dyn WidgetPlatform) {
    loader.ensure_loaded().await;
    platform.enhance_all();
}
