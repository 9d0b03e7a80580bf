// Core types and traits for the FRC playback core

pub mod buffer;
pub mod error;
pub mod listener;
pub mod parameters;
pub mod state;
pub mod timeline;
pub mod tracks;

// Re-export commonly used types
pub use buffer::BufferPolicy;
pub use error::{ExceptionKind, PlaybackException, PlayerError, Result};
pub use listener::{EventDispatcher, EventListener, ListenerId, PlayerEvent};
pub use parameters::PlaybackParameters;
pub use state::{PlaybackSnapshot, PlaybackState, StateMachine, StateReader};
pub use timeline::{Manifest, Timeline, TimelineWindow};
pub use tracks::{TrackFormat, TrackGroup, TrackGroupArray, TrackSelection, TrackSelectionArray, Tracks};
