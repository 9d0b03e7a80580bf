// Player event listeners and ordered dispatch
// Listener failures are isolated so one bad listener cannot starve the rest

use crate::error::PlaybackException;
use crate::parameters::PlaybackParameters;
use crate::state::PlaybackState;
use crate::timeline::{Manifest, Timeline};
use crate::tracks::Tracks;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Player event types, declared in dispatch precedence order
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// Timeline or manifest refreshed
    TimelineChanged {
        timeline: Arc<Timeline>,
        manifest: Option<Manifest>,
    },

    /// Available or selected tracks changed
    TracksChanged(Arc<Tracks>),

    /// Source started or stopped loading
    LoadingChanged(bool),

    /// `(play_when_ready, playback_state)` changed
    StateChanged {
        play_when_ready: bool,
        playback_state: PlaybackState,
    },

    /// Playback failed
    Error(PlaybackException),

    /// Position jumped (seek, source change)
    PositionDiscontinuity,

    /// Speed/pitch changed
    ParametersChanged(PlaybackParameters),
}

impl PlayerEvent {
    /// Lower values are dispatched first within one update cycle
    pub fn precedence(&self) -> u8 {
        match self {
            PlayerEvent::TimelineChanged { .. } => 0,
            PlayerEvent::TracksChanged(_) => 1,
            PlayerEvent::LoadingChanged(_) => 2,
            PlayerEvent::StateChanged { .. } => 3,
            PlayerEvent::Error(_) => 4,
            PlayerEvent::PositionDiscontinuity => 5,
            PlayerEvent::ParametersChanged(_) => 6,
        }
    }

    fn deliver(&self, listener: &dyn EventListener) {
        match self {
            PlayerEvent::TimelineChanged { timeline, manifest } => {
                listener.on_timeline_changed(timeline, manifest.as_ref())
            }
            PlayerEvent::TracksChanged(tracks) => listener.on_tracks_changed(tracks),
            PlayerEvent::LoadingChanged(is_loading) => listener.on_loading_changed(*is_loading),
            PlayerEvent::StateChanged {
                play_when_ready,
                playback_state,
            } => listener.on_player_state_changed(*play_when_ready, *playback_state),
            PlayerEvent::Error(error) => listener.on_player_error(error),
            PlayerEvent::PositionDiscontinuity => listener.on_position_discontinuity(),
            PlayerEvent::ParametersChanged(params) => {
                listener.on_playback_parameters_changed(*params)
            }
        }
    }
}

/// Receives player notifications on the player's owning context.
/// Implementations should return quickly: a slow listener delays every
/// listener after it.
#[allow(unused_variables)]
pub trait EventListener: Send + Sync {
    /// Timeline is never empty-by-absence, but may have no windows.
    /// `manifest` is `None` when the source has none.
    fn on_timeline_changed(&self, timeline: &Arc<Timeline>, manifest: Option<&Manifest>) {}

    fn on_tracks_changed(&self, tracks: &Tracks) {}

    fn on_loading_changed(&self, is_loading: bool) {}

    fn on_player_state_changed(&self, play_when_ready: bool, playback_state: PlaybackState) {}

    fn on_player_error(&self, error: &PlaybackException) {}

    fn on_position_discontinuity(&self) {}

    fn on_playback_parameters_changed(&self, params: PlaybackParameters) {}
}

/// Registration handle returned by [`EventDispatcher::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registry {
    next_id: u64,
    entries: Vec<(ListenerId, Arc<dyn EventListener>)>,
}

/// Fans events out to registered listeners in insertion order.
///
/// The listener list is copied before each event is delivered, so a
/// listener may add or remove listeners (itself included) from inside a
/// callback without affecting the event in progress. The copy is per event,
/// not per [`dispatch`](Self::dispatch) call: a listener added while one
/// event of a batch is delivered receives the remaining events of that batch.
#[derive(Clone)]
pub struct EventDispatcher {
    registry: Arc<Mutex<Registry>>,
    failures: Arc<AtomicU64>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 1,
                entries: Vec::new(),
            })),
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Registering the same `Arc` twice returns the existing id
    pub fn add_listener(&self, listener: Arc<dyn EventListener>) -> ListenerId {
        let mut registry = self.registry.lock();
        let ptr = Arc::as_ptr(&listener) as *const ();
        if let Some((id, _)) = registry
            .entries
            .iter()
            .find(|(_, l)| Arc::as_ptr(l) as *const () == ptr)
        {
            return *id;
        }

        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.entries.push((id, listener));
        log::debug!("Listener {:?} added ({} total)", id, registry.entries.len());
        id
    }

    /// Returns whether the listener was registered. Removing twice is harmless.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.lock();
        let before = registry.entries.len();
        registry.entries.retain(|(entry_id, _)| *entry_id != id);
        registry.entries.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.registry.lock().entries.len()
    }

    pub fn clear(&self) {
        self.registry.lock().entries.clear();
    }

    /// Number of listener callbacks that panicked so far
    pub fn listener_failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Deliver one update cycle's events in precedence order
    pub fn dispatch(&self, mut events: Vec<PlayerEvent>) {
        events.sort_by_key(PlayerEvent::precedence);
        for event in &events {
            self.dispatch_event(event);
        }
    }

    pub fn dispatch_event(&self, event: &PlayerEvent) {
        let listeners: Vec<(ListenerId, Arc<dyn EventListener>)> =
            self.registry.lock().entries.clone();

        for (id, listener) in listeners {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| event.deliver(listener.as_ref())));
            if let Err(payload) = outcome {
                self.failures.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "Listener {:?} failed handling {:?}: {}",
                    id,
                    event,
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

/// Simple listener implementation for testing
#[cfg(test)]
pub struct TestListener {
    events: Mutex<Vec<String>>,
}

#[cfg(test)]
impl TestListener {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn get_events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

#[cfg(test)]
impl EventListener for TestListener {
    fn on_timeline_changed(&self, timeline: &Arc<Timeline>, _manifest: Option<&Manifest>) {
        self.events
            .lock()
            .push(format!("timeline:{}", timeline.window_count()));
    }

    fn on_tracks_changed(&self, tracks: &Tracks) {
        self.events.lock().push(format!("tracks:{}", tracks.groups().len()));
    }

    fn on_loading_changed(&self, is_loading: bool) {
        self.events.lock().push(format!("loading:{}", is_loading));
    }

    fn on_player_state_changed(&self, play_when_ready: bool, playback_state: PlaybackState) {
        self.events
            .lock()
            .push(format!("state:{}:{:?}", play_when_ready, playback_state));
    }

    fn on_player_error(&self, error: &PlaybackException) {
        self.events.lock().push(format!("error:{}", error.message));
    }

    fn on_position_discontinuity(&self) {
        self.events.lock().push("discontinuity".to_string());
    }

    fn on_playback_parameters_changed(&self, params: PlaybackParameters) {
        self.events.lock().push(format!("params:{}", params.speed()));
    }
}
