// Playback speed/pitch

use crate::error::{PlayerError, Result};

/// Immutable speed and pitch multipliers. Always replaced as a whole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackParameters {
    speed: f32,
    pitch: f32,
}

impl PlaybackParameters {
    pub const DEFAULT: PlaybackParameters = PlaybackParameters {
        speed: 1.0,
        pitch: 1.0,
    };

    pub fn new(speed: f32, pitch: f32) -> Result<Self> {
        for (name, value) in [("speed", speed), ("pitch", pitch)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PlayerError::InvalidParameters(format!(
                    "{} must be > 0, got {}",
                    name, value
                )));
            }
        }
        Ok(Self { speed, pitch })
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }
}

impl Default for PlaybackParameters {
    fn default() -> Self {
        Self::DEFAULT
    }
}
