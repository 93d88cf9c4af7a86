//! Signaling error types

use contracts::ContractError;
use thiserror::Error;

use crate::session::SignalingState;

#[derive(Debug, Error)]
pub enum SignalingError {
    /// Local description could not be created
    #[error("failed to create offer: {message}")]
    OfferFailed { message: String },

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: SignalingState,
        action: &'static str,
    },

    /// Peer connection rejected a description or candidate
    #[error("peer error: {message}")]
    Peer { message: String },

    #[error("channel '{channel}' is closed")]
    ChannelClosed { channel: String },

    #[error("channel '{channel}' outbound queue full")]
    QueueFull { channel: String },

    #[error("failed to connect to {endpoint}: {message}")]
    Connect { endpoint: String, message: String },
}

impl SignalingError {
    pub fn peer(message: impl Into<String>) -> Self {
        Self::Peer {
            message: message.into(),
        }
    }

    pub fn connect(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connect {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Errors that mean the channel is gone and a reconnect is due
    pub fn is_channel_failure(&self) -> bool {
        matches!(self, Self::ChannelClosed { .. } | Self::Connect { .. })
    }
}

impl From<SignalingError> for ContractError {
    fn from(e: SignalingError) -> Self {
        match &e {
            SignalingError::ChannelClosed { channel } | SignalingError::QueueFull { channel } => {
                ContractError::channel(channel.clone(), e.to_string())
            }
            SignalingError::Connect { endpoint, .. } => {
                ContractError::channel(endpoint.clone(), e.to_string())
            }
            SignalingError::InvalidTransition { state, .. } => {
                ContractError::signaling(state.as_str(), e.to_string())
            }
            SignalingError::OfferFailed { .. } | SignalingError::Peer { .. } => {
                ContractError::signaling("-", e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_and_conversion() {
        let err = SignalingError::InvalidTransition {
            state: SignalingState::Connected,
            action: "begin offer",
        };
        assert_eq!(err.to_string(), "cannot begin offer while connected");

        let closed = SignalingError::ChannelClosed {
            channel: "relay".into(),
        };
        assert!(closed.is_channel_failure());
        assert!(ContractError::from(closed).is_channel());
    }
}
