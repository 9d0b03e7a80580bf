// Immutable timeline snapshots

use std::any::Any;
use std::sync::Arc;

/// Opaque manifest delivered alongside a timeline (e.g. a parsed playlist).
/// Only the source that produced it knows its concrete type.
pub type Manifest = Arc<dyn Any + Send + Sync>;

/// One playable window of a media source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineWindow {
    /// `None` while the duration is unknown (e.g. live streams)
    pub duration_ms: Option<u64>,
    /// Position playback starts from when no explicit seek was made
    pub default_position_ms: u64,
    pub is_seekable: bool,
    /// Window may still change (live edge moving, playlist growing)
    pub is_dynamic: bool,
}

impl TimelineWindow {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms: Some(duration_ms),
            default_position_ms: 0,
            is_seekable: true,
            is_dynamic: false,
        }
    }

    /// Unbounded, non-seekable window of a live stream
    pub fn live() -> Self {
        Self {
            duration_ms: None,
            default_position_ms: 0,
            is_seekable: false,
            is_dynamic: true,
        }
    }

    pub fn with_default_position(mut self, position_ms: u64) -> Self {
        self.default_position_ms = position_ms;
        self
    }
}

/// Structural description of the media being played.
///
/// Never mutated after construction; a refresh installs a new `Arc<Timeline>`
/// and holders of the old one keep a consistent view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Timeline {
    windows: Vec<TimelineWindow>,
}

impl Timeline {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(windows: Vec<TimelineWindow>) -> Self {
        Self { windows }
    }

    /// Single seekable window of known duration
    pub fn single(duration_ms: u64) -> Self {
        Self::new(vec![TimelineWindow::new(duration_ms)])
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn window(&self, index: usize) -> Option<&TimelineWindow> {
        self.windows.get(index)
    }

    pub fn windows(&self) -> &[TimelineWindow] {
        &self.windows
    }

    /// Total duration, `None` if empty or any window is unbounded
    pub fn duration_ms(&self) -> Option<u64> {
        if self.windows.is_empty() {
            return None;
        }
        self.windows
            .iter()
            .try_fold(0u64, |total, w| w.duration_ms.map(|d| total.saturating_add(d)))
    }

    /// Where playback starts when no seek was requested
    pub fn default_position_ms(&self) -> u64 {
        self.windows
            .first()
            .map(|w| w.default_position_ms)
            .unwrap_or(0)
    }
}
