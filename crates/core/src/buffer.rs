// Buffering thresholds and loading backpressure

use crate::error::{PlayerError, Result};

/// Keep loading until at least this much media is buffered ahead
pub const DEFAULT_MIN_BUFFER_MS: u64 = 15_000;

/// Stop loading once this much media is buffered ahead
pub const DEFAULT_MAX_BUFFER_MS: u64 = 30_000;

/// Buffered media required to leave the initial/post-seek buffering state
pub const DEFAULT_BUFFER_FOR_PLAYBACK_MS: u64 = 2_500;

/// Buffered media required to resume after an underrun
pub const DEFAULT_BUFFER_FOR_PLAYBACK_AFTER_REBUFFER_MS: u64 = 5_000;

/// Decides when enough data is buffered to play and when the loader
/// should pause to let the buffer drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPolicy {
    pub min_buffer_ms: u64,
    pub max_buffer_ms: u64,
    pub buffer_for_playback_ms: u64,
    pub buffer_for_playback_after_rebuffer_ms: u64,
}

impl Default for BufferPolicy {
    fn default() -> Self {
        Self {
            min_buffer_ms: DEFAULT_MIN_BUFFER_MS,
            max_buffer_ms: DEFAULT_MAX_BUFFER_MS,
            buffer_for_playback_ms: DEFAULT_BUFFER_FOR_PLAYBACK_MS,
            buffer_for_playback_after_rebuffer_ms: DEFAULT_BUFFER_FOR_PLAYBACK_AFTER_REBUFFER_MS,
        }
    }
}

impl BufferPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.min_buffer_ms > self.max_buffer_ms {
            return Err(PlayerError::InvalidConfig(format!(
                "min_buffer_ms ({}) exceeds max_buffer_ms ({})",
                self.min_buffer_ms, self.max_buffer_ms
            )));
        }
        if self.buffer_for_playback_ms > self.max_buffer_ms
            || self.buffer_for_playback_after_rebuffer_ms > self.max_buffer_ms
        {
            return Err(PlayerError::InvalidConfig(
                "playback thresholds cannot exceed max_buffer_ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `buffered_ahead_ms` is enough to move from buffering to ready
    pub fn should_start_playback(&self, buffered_ahead_ms: u64, rebuffering: bool) -> bool {
        let required = if rebuffering {
            self.buffer_for_playback_after_rebuffer_ms
        } else {
            self.buffer_for_playback_ms
        };
        buffered_ahead_ms >= required
    }

    /// Loader backpressure with hysteresis between min and max
    pub fn should_continue_loading(&self, buffered_ahead_ms: u64, currently_loading: bool) -> bool {
        if buffered_ahead_ms < self.min_buffer_ms {
            true
        } else if buffered_ahead_ms >= self.max_buffer_ms {
            false
        } else {
            currently_loading
        }
    }
}
