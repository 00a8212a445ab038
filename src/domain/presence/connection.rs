//! Connection lifecycle status.

use serde::Serialize;

use crate::domain::foundation::StateMachine;

/// Lifecycle of a persistent client connection.
///
/// ```text
/// Open ──► Closing ──► Closed
/// ```
///
/// `Closing` is held while disconnect reconciliation unwinds room
/// memberships. `Closed` is terminal; the registry drops the record on
/// entering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Open,
    Closing,
    Closed,
}

impl ConnectionStatus {
    /// Whether `join`/`leave` requests from the client are honoured.
    pub fn accepts_membership_changes(&self) -> bool {
        matches!(self, ConnectionStatus::Open)
    }
}

impl StateMachine for ConnectionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionStatus::*;
        matches!((self, target), (Open, Closing) | (Closing, Closed))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionStatus::*;
        match self {
            Open => vec![Closing],
            Closing => vec![Closed],
            Closed => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_moves_to_closing() {
        assert_eq!(
            ConnectionStatus::Open.transition_to(ConnectionStatus::Closing),
            Ok(ConnectionStatus::Closing)
        );
    }

    #[test]
    fn open_cannot_skip_closing() {
        assert!(ConnectionStatus::Open
            .transition_to(ConnectionStatus::Closed)
            .is_err());
    }

    #[test]
    fn closed_is_terminal() {
        assert!(ConnectionStatus::Closed.is_terminal());
        assert!(ConnectionStatus::Closed
            .transition_to(ConnectionStatus::Open)
            .is_err());
    }

    #[test]
    fn only_open_accepts_membership_changes() {
        assert!(ConnectionStatus::Open.accepts_membership_changes());
        assert!(!ConnectionStatus::Closing.accepts_membership_changes());
        assert!(!ConnectionStatus::Closed.accepts_membership_changes());
    }
}
