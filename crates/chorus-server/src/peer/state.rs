//! Peer lifecycle.

use crate::errors::InvalidTransition;

/// Lifecycle of one peer: `Connecting → Active → Closing → Closed`.
///
/// A peer the hub refuses to admit goes straight from `Connecting` to
/// `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerState {
    /// Transport attached, not yet handed to the hub.
    Connecting,
    /// Admitted; both loops running.
    Active,
    /// One loop has exited (read failure or queue closed by removal).
    Closing,
    /// Both loops exited and the transport is closed. Terminal.
    Closed,
}

impl PeerState {
    /// Whether `self → next` is a legal step.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Active | Self::Closed)
                | (Self::Active, Self::Closing)
                | (Self::Closing, Self::Closed)
        )
    }

    /// Step to `next`, rejecting illegal transitions.
    pub fn transition(self, next: Self) -> Result<Self, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        self == Self::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const ALL: [PeerState; 4] = [
        PeerState::Connecting,
        PeerState::Active,
        PeerState::Closing,
        PeerState::Closed,
    ];

    #[test]
    fn happy_path() {
        let state = PeerState::Connecting
            .transition(PeerState::Active)
            .and_then(|s| s.transition(PeerState::Closing))
            .and_then(|s| s.transition(PeerState::Closed))
            .unwrap();
        assert!(state.is_terminal());
    }

    #[test]
    fn closed_is_terminal() {
        for next in ALL {
            assert!(!PeerState::Closed.can_transition_to(next));
        }
    }

    #[test]
    fn no_skipping_or_going_back() {
        assert_matches!(
            PeerState::Connecting.transition(PeerState::Closing),
            Err(InvalidTransition { from: PeerState::Connecting, to: PeerState::Closing })
        );
        assert!(!PeerState::Active.can_transition_to(PeerState::Connecting));
        assert!(!PeerState::Closing.can_transition_to(PeerState::Active));
        assert!(!PeerState::Active.can_transition_to(PeerState::Active));
    }

    #[test]
    fn refused_peer_closes_without_activating() {
        assert_eq!(
            PeerState::Connecting.transition(PeerState::Closed),
            Ok(PeerState::Closed)
        );
    }

    #[test]
    fn exactly_four_legal_steps() {
        let legal = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .count();
        assert_eq!(legal, 4);
    }
}
