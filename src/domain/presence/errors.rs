//! Presence error types.

use thiserror::Error;

use crate::domain::foundation::{ConnectionId, DomainError, ErrorCode};

use super::ConnectionStatus;

/// Errors raised by membership changes.
///
/// Leaving, publishing and lookups never fail; only a join can be refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenceError {
    #[error("Connection {0} is not registered")]
    UnknownConnection(ConnectionId),

    #[error("Connection {connection_id} is {status:?} and cannot join rooms")]
    NotOpen {
        connection_id: ConnectionId,
        status: ConnectionStatus,
    },
}

impl From<PresenceError> for DomainError {
    fn from(err: PresenceError) -> Self {
        let code = match err {
            PresenceError::UnknownConnection(_) => ErrorCode::ConnectionNotFound,
            PresenceError::NotOpen { .. } => ErrorCode::ConnectionClosing,
        };
        DomainError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_open_maps_to_connection_closing() {
        let err = PresenceError::NotOpen {
            connection_id: ConnectionId::new(),
            status: ConnectionStatus::Closing,
        };
        let domain: DomainError = err.into();
        assert_eq!(domain.code, ErrorCode::ConnectionClosing);
    }
}
