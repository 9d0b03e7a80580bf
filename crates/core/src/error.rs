// Error handling for the playback core

use crate::state::PlaybackState;
use std::fmt;
use thiserror::Error;

/// Where a playback exception originated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionKind {
    /// Loading or parsing the media source failed
    Source,
    /// A renderer/decoder component failed
    Renderer,
    /// Anything else, including failures inside the core itself
    Unexpected,
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExceptionKind::Source => write!(f, "source"),
            ExceptionKind::Renderer => write!(f, "renderer"),
            ExceptionKind::Unexpected => write!(f, "unexpected"),
        }
    }
}

/// Failure reported by a loader/decoder collaborator while handling a message.
/// Delivered to listeners through `on_player_error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct PlaybackException {
    pub kind: ExceptionKind,
    pub message: String,
}

impl PlaybackException {
    pub fn new(kind: ExceptionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn source(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::Source, message)
    }

    pub fn renderer(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::Renderer, message)
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::Unexpected, message)
    }
}

/// Player error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlayerError {
    /// Requested transition is not in the transition table
    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: PlaybackState,
        to: PlaybackState,
    },

    /// Operation not allowed in the current lifecycle stage (e.g. after release)
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// Seek target lies outside the current timeline
    #[error("Illegal seek position {position_ms} ms (duration {duration_ms} ms)")]
    IllegalSeekPosition { position_ms: u64, duration_ms: u64 },

    /// Track groups and selections do not line up
    #[error("Invalid tracks: {0}")]
    InvalidTracks(String),

    /// Playback parameters out of range
    #[error("Invalid playback parameters: {0}")]
    InvalidParameters(String),

    /// Configuration rejected by validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Message bus failure
    #[error("Message bus error: {0}")]
    Bus(String),
}

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlayerError::InvalidTransition {
            from: PlaybackState::Idle,
            to: PlaybackState::Ready,
        };
        assert_eq!(
            err.to_string(),
            "Invalid state transition from Idle to Ready"
        );

        let err = PlaybackException::source("404");
        assert_eq!(err.to_string(), "source error: 404");
    }
}
