//! Cancellable poll-with-timeout primitive.
//!
//! Both bounded waits in this crate (script readiness, enhancement evidence)
//! are the same shape: check a predicate on a short interval until it holds,
//! a budget runs out, or the owning instance goes away. This module is that
//! shape, once, instead of ad hoc interval timers at each call site.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};

/// Shared cancellation flag for one embed instance.
///
/// Cloned handles observe the same flag. Checked before every state update so
/// an unmounted instance never writes again.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// How a [`poll_until`] wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollVerdict {
    /// The predicate returned true within the budget.
    Satisfied,
    /// The budget elapsed with the predicate still false.
    Expired,
    /// The cancel flag was set; the caller must not act on the outcome.
    Cancelled,
}

/// Run `predicate` every `every` until it holds or `budget` elapses.
///
/// The predicate is checked once immediately, so an already-true condition
/// resolves without sleeping. Cancellation wins over both other outcomes.
pub async fn poll_until<F>(
    mut predicate: F,
    every: Duration,
    budget: Duration,
    cancel: &CancelFlag,
) -> PollVerdict
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + budget;

    loop {
        if cancel.is_cancelled() {
            return PollVerdict::Cancelled;
        }
        if predicate() {
            return PollVerdict::Satisfied;
        }
        if Instant::now() >= deadline {
            return PollVerdict::Expired;
        }
        sleep(every).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[tokio::test]
    async fn already_true_predicate_resolves_immediately() {
        let verdict = poll_until(
            || true,
            Duration::from_millis(5),
            Duration::from_millis(50),
            &CancelFlag::new(),
        )
        .await;
        assert_eq!(verdict, PollVerdict::Satisfied);
    }

    #[tokio::test]
    async fn predicate_turning_true_is_detected() {
        let calls = AtomicUsize::new(0);
        let verdict = poll_until(
            || calls.fetch_add(1, Ordering::SeqCst) >= 3,
            Duration::from_millis(2),
            Duration::from_secs(5),
            &CancelFlag::new(),
        )
        .await;
        assert_eq!(verdict, PollVerdict::Satisfied);
    }

    #[tokio::test]
    async fn budget_expiry_wins_over_never_true_predicate() {
        let verdict = poll_until(
            || false,
            Duration::from_millis(2),
            Duration::from_millis(20),
            &CancelFlag::new(),
        )
        .await;
        assert_eq!(verdict, PollVerdict::Expired);
    }

    #[test]
    fn cancellation_wins_over_satisfied_and_expired() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let verdict = tokio_test::block_on(poll_until(
            || true,
            Duration::from_millis(2),
            Duration::from_millis(20),
            &cancel,
        ));
        assert_eq!(verdict, PollVerdict::Cancelled);
    }

    #[tokio::test]
    async fn cancel_mid_poll_stops_waiting() {
        let cancel = CancelFlag::new();
        let flagged = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(10)).await;
            flagged.cancel();
        });
        let verdict = poll_until(
            || false,
            Duration::from_millis(2),
            Duration::from_secs(10),
            &cancel,
        )
        .await;
        assert_eq!(verdict, PollVerdict::Cancelled);
    }

    #[test]
    fn cloned_flags_share_state() {
        let a = CancelFlag::new();
        let b = a.clone();
        b.cancel();
        assert!(a.is_cancelled());
    }
}
