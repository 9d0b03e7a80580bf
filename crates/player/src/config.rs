// Player configuration

use frc_core::{BufferPolicy, PlayerError, Result};

/// Unbounded message queue unless configured otherwise
pub const DEFAULT_BUS_CAPACITY: Option<usize> = None;

/// Initial value of the play-when-ready flag
pub const DEFAULT_PLAY_WHEN_READY: bool = false;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Re-buffering thresholds and loader backpressure
    pub buffer_policy: BufferPolicy,
    /// Capacity of the component message queue (`None` = unbounded).
    /// When full, collaborators get `BusError::Full` from `post`.
    pub bus_capacity: Option<usize>,
    pub play_when_ready: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            buffer_policy: BufferPolicy::default(),
            bus_capacity: DEFAULT_BUS_CAPACITY,
            play_when_ready: DEFAULT_PLAY_WHEN_READY,
        }
    }
}

impl PlayerConfig {
    pub fn with_buffer_policy(mut self, buffer_policy: BufferPolicy) -> Self {
        self.buffer_policy = buffer_policy;
        self
    }

    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = Some(capacity);
        self
    }

    pub fn with_play_when_ready(mut self, play_when_ready: bool) -> Self {
        self.play_when_ready = play_when_ready;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.buffer_policy.validate()?;
        if self.bus_capacity == Some(0) {
            return Err(PlayerError::InvalidConfig(
                "bus_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
