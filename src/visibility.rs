//! Visibility gating for lazy embeds.
//!
//! An embed configured as lazy does nothing until its container is reported
//! near the viewport; one configured as eager is released synchronously at
//! mount. Either way the gate fires exactly once.

use tokio::sync::watch;

/// Lookahead margin observers should apply when deciding "near-visible",
/// so embeds start loading just before they scroll into view.
pub const LOOKAHEAD_MARGIN_PX: u32 = 250;

/// One-shot "may load" signal for a single embed instance.
#[derive(Debug)]
pub struct VisibilityGate {
    deferred: bool,
    fired: watch::Sender<bool>,
}

impl VisibilityGate {
    /// Gate that releases waiters only once visibility is reported.
    #[must_use]
    pub fn deferred() -> Self {
        let (fired, _) = watch::channel(false);
        Self {
            deferred: true,
            fired,
        }
    }

    /// Gate that is open from the start (non-lazy mount).
    #[must_use]
    pub fn eager() -> Self {
        let (fired, _) = watch::channel(true);
        Self {
            deferred: false,
            fired,
        }
    }

    /// Observer callback: the container was deemed near-visible.
    ///
    /// Returns true the first time, telling the observer to stop observing.
    /// Later reports are ignored.
    pub fn report_visible(&self) -> bool {
        self.fired.send_if_modified(|fired| {
            if *fired {
                false
            } else {
                *fired = true;
                true
            }
        })
    }

    #[must_use]
    pub fn has_fired(&self) -> bool {
        *self.fired.borrow()
    }

    /// Wait until the instance may load. Returns immediately for eager gates
    /// and for gates that already fired.
    pub async fn wait(&self) {
        if !self.deferred {
            return;
        }
        let mut rx = self.fired.subscribe();
        // The sender lives in `self`, so this cannot fail while we wait.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}
