//! Presence layer configuration

use serde::Deserialize;

use super::error::ValidationError;

const MAX_OUTBOUND_BUFFER: usize = 65_536;

/// Presence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceConfig {
    /// Undelivered events buffered per connection before new ones are dropped
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,

    /// Keep rooms in memory after their last viewer leaves
    #[serde(default)]
    pub retain_empty_rooms: bool,
}

impl PresenceConfig {
    /// Validate presence configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.outbound_buffer == 0 || self.outbound_buffer > MAX_OUTBOUND_BUFFER {
            return Err(ValidationError::InvalidOutboundBuffer);
        }
        Ok(())
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            outbound_buffer: default_outbound_buffer(),
            retain_empty_rooms: false,
        }
    }
}

fn default_outbound_buffer() -> usize {
    64
}
