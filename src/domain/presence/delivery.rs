//! Per-connection delivery outcomes of a publish.

use crate::domain::foundation::ConnectionId;

/// Why an event did not reach one member of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// The connection's outbound buffer is full; the event was dropped for it.
    Lagging,
    /// The connection's writer has gone away.
    Disconnected,
    /// The member is no longer known to the registry.
    Unknown,
}

/// Outcome of delivering one event to a room.
///
/// One dead peer never aborts delivery to the rest of the room; failures
/// are collected here instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: Vec<(ConnectionId, DeliveryFailure)>,
}

impl DeliveryReport {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self) {
        self.delivered += 1;
    }

    pub fn record_failure(&mut self, connection_id: ConnectionId, failure: DeliveryFailure) {
        self.failed.push((connection_id, failure));
    }

    /// Number of members the event was addressed to.
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
