// Playback core facade: state machine, component messages and listener events
//
// Loader/decoder collaborators post to the message bus from any thread; the
// player delivers those messages on its owning context, applies the changes
// and notifies listeners.

pub mod component;
pub mod config;
pub mod player;
pub mod source;

use std::sync::Once;

// Re-exports
pub use component::{ComponentContext, PlayerComponent};
pub use config::PlayerConfig;
pub use frc_core::{
    BufferPolicy, EventDispatcher, EventListener, ExceptionKind, ListenerId, Manifest,
    PlaybackException, PlaybackParameters, PlaybackSnapshot, PlaybackState, PlayerError, Result,
    StateReader, Timeline, TimelineWindow, TrackFormat, TrackGroup, TrackGroupArray,
    TrackSelection, TrackSelectionArray, Tracks,
};
pub use frc_message_bus::{
    BufferSignal, BusError, BusHandle, ComponentId, MessagePayload, PlayerMessage,
};
pub use player::{Diagnostics, MediaPlayer, Player};
pub use source::MediaSource;

static INIT_LOGGER: Once = Once::new();

/// Install `env_logger` at `info` level. Safe to call more than once.
pub fn init_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::builder()
            .is_test(false)
            .filter_level(log::LevelFilter::Info)
            .try_init();
    });
}

/// Create a player with the default configuration
pub fn create_player() -> Result<Player> {
    init_logging();
    log::info!("Creating playback core player");
    Player::new(PlayerConfig::default())
}
