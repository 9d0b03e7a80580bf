// Typed messages exchanged between player components

use frc_core::{Manifest, PlaybackException, PlaybackParameters, Timeline, Tracks};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

pub const MSG_TIMELINE_REFRESHED: i32 = 1;
pub const MSG_TRACKS_CHANGED: i32 = 2;
pub const MSG_LOADING_CHANGED: i32 = 3;
pub const MSG_BUFFER_STATE: i32 = 4;
pub const MSG_BUFFERED_POSITION: i32 = 5;
pub const MSG_PLAYBACK_POSITION: i32 = 6;
pub const MSG_PARAMETERS_CHANGED: i32 = 7;
pub const MSG_ERROR: i32 = 8;

/// Tags at or above this value are free for collaborator-defined messages
pub const MSG_CUSTOM_BASE: i32 = 10_000;

/// Identity of a message target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u32);

impl ComponentId {
    /// The player's own state machine
    pub const PLAYER: ComponentId = ComponentId(0);
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if *self == ComponentId::PLAYER {
            write!(f, "player")
        } else {
            write!(f, "component#{}", self.0)
        }
    }
}

/// Loader/decoder signals that drive state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferSignal {
    /// Ran out of data while ready
    Underrun,
    /// Enough data buffered to play from the current position
    EnoughData,
    /// Source has no more data
    EndOfStream,
}

/// Message payload, one variant per known message kind
pub enum MessagePayload {
    TimelineRefreshed {
        timeline: Arc<Timeline>,
        manifest: Option<Manifest>,
    },
    TracksChanged(Tracks),
    LoadingChanged(bool),
    Buffer(BufferSignal),
    /// Position up to which media is buffered
    BufferedPosition(u64),
    /// Current playout position reported by the renderer
    PlaybackPosition(u64),
    ParametersChanged(PlaybackParameters),
    Error(PlaybackException),
    /// Collaborator-defined message the core does not interpret
    Opaque {
        message_type: i32,
        payload: Box<dyn Any + Send>,
    },
}

impl MessagePayload {
    pub fn opaque<T: Any + Send>(message_type: i32, payload: T) -> Self {
        MessagePayload::Opaque {
            message_type,
            payload: Box::new(payload),
        }
    }

    /// Integer tag of this payload
    pub fn message_type(&self) -> i32 {
        match self {
            MessagePayload::TimelineRefreshed { .. } => MSG_TIMELINE_REFRESHED,
            MessagePayload::TracksChanged(_) => MSG_TRACKS_CHANGED,
            MessagePayload::LoadingChanged(_) => MSG_LOADING_CHANGED,
            MessagePayload::Buffer(_) => MSG_BUFFER_STATE,
            MessagePayload::BufferedPosition(_) => MSG_BUFFERED_POSITION,
            MessagePayload::PlaybackPosition(_) => MSG_PLAYBACK_POSITION,
            MessagePayload::ParametersChanged(_) => MSG_PARAMETERS_CHANGED,
            MessagePayload::Error(_) => MSG_ERROR,
            MessagePayload::Opaque { message_type, .. } => *message_type,
        }
    }

    /// Borrow the opaque payload as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            MessagePayload::Opaque { payload, .. } => payload.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for MessagePayload {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MessagePayload::TimelineRefreshed { timeline, manifest } => f
                .debug_struct("TimelineRefreshed")
                .field("windows", &timeline.window_count())
                .field("has_manifest", &manifest.is_some())
                .finish(),
            MessagePayload::TracksChanged(tracks) => f
                .debug_tuple("TracksChanged")
                .field(&tracks.groups().len())
                .finish(),
            MessagePayload::LoadingChanged(v) => f.debug_tuple("LoadingChanged").field(v).finish(),
            MessagePayload::Buffer(s) => f.debug_tuple("Buffer").field(s).finish(),
            MessagePayload::BufferedPosition(ms) => {
                f.debug_tuple("BufferedPosition").field(ms).finish()
            }
            MessagePayload::PlaybackPosition(ms) => {
                f.debug_tuple("PlaybackPosition").field(ms).finish()
            }
            MessagePayload::ParametersChanged(p) => {
                f.debug_tuple("ParametersChanged").field(p).finish()
            }
            MessagePayload::Error(e) => f.debug_tuple("Error").field(e).finish(),
            MessagePayload::Opaque { message_type, .. } => f
                .debug_struct("Opaque")
                .field("message_type", message_type)
                .finish_non_exhaustive(),
        }
    }
}

/// A message addressed to one component. Immutable once built; carries no
/// reference back to its sender.
#[derive(Debug)]
pub struct PlayerMessage {
    target: ComponentId,
    payload: MessagePayload,
}

impl PlayerMessage {
    pub fn new(target: ComponentId, payload: MessagePayload) -> Self {
        Self { target, payload }
    }

    pub fn target(&self) -> ComponentId {
        self.target
    }

    pub fn message_type(&self) -> i32 {
        self.payload.message_type()
    }

    pub fn payload(&self) -> &MessagePayload {
        &self.payload
    }

    pub fn into_parts(self) -> (ComponentId, MessagePayload) {
        (self.target, self.payload)
    }
}
