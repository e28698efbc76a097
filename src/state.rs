//! Embed lifecycle state machine.
//!
//! The original race — oEmbed HTML and widget enhancement arriving in either
//! order — is resolved here by a single reducer over named events instead of
//! callback ordering. Whichever content arrives first renders first, but
//! `Ready` is only declared once a terminal condition holds: enhancement
//! evidence appeared, or the budget expired with readable HTML on screen.

/// Lifecycle of one mounted embed instance.
///
/// `Ready` and `Error` are terminal; they absorb all further events.
/// Re-mounting creates a fresh instance starting at `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedState {
    /// Mounted but not yet eligible to load (waiting on visibility).
    Idle,
    /// Eligible; fetches and enhancement may be in flight.
    Loading,
    /// Settled with something worth showing: a live widget, or static HTML.
    Ready,
    /// Settled with nothing readable; only the external link remains.
    Error,
}

impl EmbedState {
    /// True once no further transitions are possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }
}

/// Events the controller feeds into the reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedEvent {
    /// The instance became eligible to load (visibility fired, or eager mount).
    LoadRequested,
    /// The oEmbed fetch settled. `has_html` is whether non-empty markup was
    /// obtained and injected.
    OembedResolved { has_html: bool },
    /// An interactive frame appeared in the instance's surface.
    EnhancementDetected,
    /// The enhancement budget elapsed. `has_html` is whether static oEmbed
    /// markup is already displayed.
    BudgetExpired { has_html: bool },
}

/// Advance the state machine by one event.
///
/// `OembedResolved` deliberately does not reach `Ready`: content availability
/// and readiness are decoupled, since the widget script is still expected to
/// upgrade the static markup. Events arriving in a terminal state are ignored.
#[must_use]
pub fn step(state: EmbedState, event: EmbedEvent) -> EmbedState {
    if state.is_terminal() {
        return state;
    }

    match (state, event) {
        (EmbedState::Idle, EmbedEvent::LoadRequested) => EmbedState::Loading,
        // Events before eligibility are ignored.
        (EmbedState::Idle, _) => EmbedState::Idle,

        (EmbedState::Loading, EmbedEvent::OembedResolved { .. } | EmbedEvent::LoadRequested) => {
            EmbedState::Loading
        }
        (EmbedState::Loading, EmbedEvent::EnhancementDetected) => EmbedState::Ready,
        (EmbedState::Loading, EmbedEvent::BudgetExpired { has_html }) => {
            if has_html {
                // Degrade gracefully to the static fallback; the user sees
                // readable content, so this still counts as success.
                EmbedState::Ready
            } else {
                EmbedState::Error
            }
        }

        (terminal, _) => terminal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_request_moves_idle_to_loading() {
        assert_eq!(step(EmbedState::Idle, EmbedEvent::LoadRequested), EmbedState::Loading);
    }

    #[test]
    fn oembed_alone_does_not_reach_ready() {
        let state = step(EmbedState::Loading, EmbedEvent::OembedResolved { has_html: true });
        assert_eq!(state, EmbedState::Loading);
    }

    #[test]
    fn enhancement_evidence_settles_ready() {
        assert_eq!(
            step(EmbedState::Loading, EmbedEvent::EnhancementDetected),
            EmbedState::Ready
        );
    }

    #[test]
    fn budget_expiry_with_html_degrades_to_ready() {
        assert_eq!(
            step(EmbedState::Loading, EmbedEvent::BudgetExpired { has_html: true }),
            EmbedState::Ready
        );
    }

    #[test]
    fn budget_expiry_without_html_is_the_only_error_path() {
        assert_eq!(
            step(EmbedState::Loading, EmbedEvent::BudgetExpired { has_html: false }),
            EmbedState::Error
        );
    }

    #[test]
    fn terminal_states_absorb_all_events() {
        for terminal in [EmbedState::Ready, EmbedState::Error] {
            for event in [
                EmbedEvent::LoadRequested,
                EmbedEvent::OembedResolved { has_html: true },
                EmbedEvent::EnhancementDetected,
                EmbedEvent::BudgetExpired { has_html: false },
            ] {
                assert_eq!(step(terminal, event), terminal);
            }
        }
    }

    #[test]
    fn events_before_eligibility_are_ignored() {
        assert_eq!(
            step(EmbedState::Idle, EmbedEvent::EnhancementDetected),
            EmbedState::Idle
        );
        assert_eq!(
            step(EmbedState::Idle, EmbedEvent::BudgetExpired { has_html: false }),
            EmbedState::Idle
        );
    }

    #[test]
    fn arrival_order_is_commutative_for_the_terminal_outcome() {
        // oEmbed first, then enhancement.
        let mut state = EmbedState::Idle;
        for event in [
            EmbedEvent::LoadRequested,
            EmbedEvent::OembedResolved { has_html: true },
            EmbedEvent::EnhancementDetected,
        ] {
            state = step(state, event);
        }
        assert_eq!(state, EmbedState::Ready);

        // Enhancement first, then oEmbed.
        let mut state = EmbedState::Idle;
        for event in [
            EmbedEvent::LoadRequested,
            EmbedEvent::EnhancementDetected,
            EmbedEvent::OembedResolved { has_html: true },
        ] {
            state = step(state, event);
        }
        assert_eq!(state, EmbedState::Ready);
    }
}
