// Playback state machine and published state snapshot

use crate::error::{PlayerError, Result};
use crate::parameters::PlaybackParameters;
use crate::timeline::{Manifest, Timeline};
use crate::tracks::Tracks;
use parking_lot::RwLock;
use std::sync::Arc;

/// Integer code of [`PlaybackState::Idle`]
pub const STATE_IDLE: i32 = 1;
/// Integer code of [`PlaybackState::Buffering`]
pub const STATE_BUFFERING: i32 = 2;
/// Integer code of [`PlaybackState::Ready`]
pub const STATE_READY: i32 = 3;
/// Integer code of [`PlaybackState::Ended`]
pub const STATE_ENDED: i32 = 4;

/// Player readiness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackState {
    /// Nothing to play (initial state, after stop or a fatal error)
    #[default]
    Idle,
    /// Cannot play from the current position yet, more data is needed
    Buffering,
    /// Can play immediately from the current position
    Ready,
    /// Finished playing the media
    Ended,
}

impl PlaybackState {
    pub fn code(self) -> i32 {
        match self {
            PlaybackState::Idle => STATE_IDLE,
            PlaybackState::Buffering => STATE_BUFFERING,
            PlaybackState::Ready => STATE_READY,
            PlaybackState::Ended => STATE_ENDED,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            STATE_IDLE => Some(PlaybackState::Idle),
            STATE_BUFFERING => Some(PlaybackState::Buffering),
            STATE_READY => Some(PlaybackState::Ready),
            STATE_ENDED => Some(PlaybackState::Ended),
            _ => None,
        }
    }
}

/// Check a transition against the transition table.
///
/// Same-state pairs are accepted; callers treat them as no-ops.
pub fn validate_transition(from: PlaybackState, to: PlaybackState) -> Result<()> {
    use PlaybackState::*;

    match (from, to) {
        (a, b) if a == b => Ok(()),

        // Stop/reset from anywhere
        (_, Idle) => Ok(()),

        // From Idle
        (Idle, Buffering) => Ok(()),

        // Buffering <-> Ready
        (Buffering, Ready) => Ok(()),
        (Ready, Buffering) => Ok(()),

        // Source completion
        (Buffering, Ended) => Ok(()),
        (Ready, Ended) => Ok(()),

        _ => Err(PlayerError::InvalidTransition { from, to }),
    }
}

/// Owns the playback state and the play-when-ready intent flag.
///
/// Not synchronized: the single owning context is the only writer.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    state: PlaybackState,
    play_when_ready: bool,
    rebuffering: bool,
}

impl StateMachine {
    pub fn new(play_when_ready: bool) -> Self {
        Self {
            state: PlaybackState::Idle,
            play_when_ready,
            rebuffering: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn play_when_ready(&self) -> bool {
        self.play_when_ready
    }

    /// True while waiting for data after an underrun in `Ready`
    pub fn is_rebuffering(&self) -> bool {
        self.rebuffering
    }

    pub fn is_actively_playing(&self) -> bool {
        self.state == PlaybackState::Ready && self.play_when_ready
    }

    /// The pair reported through `on_player_state_changed`
    pub fn observable(&self) -> (bool, PlaybackState) {
        (self.play_when_ready, self.state)
    }

    /// Returns whether the flag changed
    pub fn set_play_when_ready(&mut self, play_when_ready: bool) -> bool {
        let changed = self.play_when_ready != play_when_ready;
        self.play_when_ready = play_when_ready;
        changed
    }

    /// Apply a table-checked transition. `Ok(false)` means the state was
    /// already `to`. On error the state is left untouched.
    pub fn transition(&mut self, to: PlaybackState) -> Result<bool> {
        let from = self.state;
        validate_transition(from, to)?;
        if from == to {
            return Ok(false);
        }

        self.rebuffering = from == PlaybackState::Ready && to == PlaybackState::Buffering;
        self.state = to;
        log::debug!("Playback state changed: {:?} -> {:?}", from, to);
        Ok(true)
    }

    /// Unconditional return to `Idle`, used by stop and error handling
    pub fn reset(&mut self) -> bool {
        self.rebuffering = false;
        let changed = self.state != PlaybackState::Idle;
        self.state = PlaybackState::Idle;
        changed
    }

    /// Seeking flushes buffered data: the next wait is a fresh buffer, not a rebuffer
    pub fn clear_rebuffering(&mut self) {
        self.rebuffering = false;
    }
}

/// Everything a caller can observe about the player at one point in time
#[derive(Clone)]
pub struct PlaybackSnapshot {
    pub playback_state: PlaybackState,
    pub play_when_ready: bool,
    pub is_loading: bool,
    pub position_ms: u64,
    pub buffered_position_ms: u64,
    pub timeline: Arc<Timeline>,
    pub manifest: Option<Manifest>,
    pub tracks: Arc<Tracks>,
    pub parameters: PlaybackParameters,
}

impl PlaybackSnapshot {
    pub fn is_actively_playing(&self) -> bool {
        self.playback_state == PlaybackState::Ready && self.play_when_ready
    }
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            playback_state: PlaybackState::Idle,
            play_when_ready: false,
            is_loading: false,
            position_ms: 0,
            buffered_position_ms: 0,
            timeline: Arc::new(Timeline::empty()),
            manifest: None,
            tracks: Arc::new(Tracks::empty()),
            parameters: PlaybackParameters::DEFAULT,
        }
    }
}

impl std::fmt::Debug for PlaybackSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSnapshot")
            .field("playback_state", &self.playback_state)
            .field("play_when_ready", &self.play_when_ready)
            .field("is_loading", &self.is_loading)
            .field("position_ms", &self.position_ms)
            .field("buffered_position_ms", &self.buffered_position_ms)
            .field("timeline_windows", &self.timeline.window_count())
            .field("has_manifest", &self.manifest.is_some())
            .field("track_groups", &self.tracks.groups().len())
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Thread-safe read handle on the last published snapshot.
///
/// The owner publishes a whole snapshot at once, so readers never see a
/// half-applied update.
#[derive(Clone, Default)]
pub struct StateReader {
    snapshot: Arc<RwLock<PlaybackSnapshot>>,
}

impl StateReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.read().clone()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.snapshot.read().playback_state
    }

    pub fn play_when_ready(&self) -> bool {
        self.snapshot.read().play_when_ready
    }

    pub fn is_actively_playing(&self) -> bool {
        self.snapshot.read().is_actively_playing()
    }

    pub fn publish(&self, snapshot: PlaybackSnapshot) {
        *self.snapshot.write() = snapshot;
    }
}
