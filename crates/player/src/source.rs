// Media source collaborator

use frc_core::PlaybackException;
use frc_message_bus::BusHandle;

/// External loader that feeds the player through the message bus.
///
/// Sources run on their own threads if they need to; the player only calls
/// these hooks from its owning context and never shares state with them.
pub trait MediaSource: Send {
    /// Start loading. Timeline, tracks and buffering progress are reported
    /// by posting messages on `bus`, usually to `ComponentId::PLAYER`.
    fn prepare(&mut self, bus: BusHandle) -> Result<(), PlaybackException>;

    /// Playback position jumped; buffered data before this point is stale
    fn on_seek(&mut self, _position_ms: u64) {}

    /// Stop loading and free resources. Called once per prepared source.
    fn release(&mut self);
}
