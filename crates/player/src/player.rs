// Player facade: owns the state machine, delivers bus messages and emits events

use crate::component::{ComponentContext, Mutation, PlayerComponent, PlayerTarget};
use crate::config::PlayerConfig;
use crate::source::MediaSource;
use frc_core::{
    EventDispatcher, EventListener, ListenerId, Manifest, PlaybackException, PlaybackParameters,
    PlaybackSnapshot, PlaybackState, PlayerError, PlayerEvent, Result, StateMachine, StateReader,
    Timeline, Tracks,
};
use frc_message_bus::{BufferSignal, BusHandle, ComponentId, Envelope, MessageBus, PlayerMessage};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Public player contract.
/// Implementations own their state on a single context; collaborators talk
/// to them only through posted messages.
pub trait MediaPlayer: Send {
    /// Start playing `source` from the beginning
    fn prepare(&mut self, source: Box<dyn MediaSource>) -> Result<()>;

    /// Play as soon as the state is `Ready`, or pause when `false`
    fn set_play_when_ready(&mut self, play_when_ready: bool) -> Result<()>;

    fn play_when_ready(&self) -> bool;

    fn playback_state(&self) -> PlaybackState;

    /// Seek to a position in milliseconds
    fn seek_to(&mut self, position_ms: u64) -> Result<()>;

    /// Stop playback and release the source. The player can be prepared again.
    fn stop(&mut self) -> Result<()>;

    fn set_playback_parameters(&mut self, params: PlaybackParameters) -> Result<()>;

    fn add_listener(&mut self, listener: Arc<dyn EventListener>) -> Result<ListenerId>;

    fn remove_listener(&mut self, id: ListenerId) -> Result<bool>;

    /// Queue messages for delivery on the player's context
    fn send_messages(&mut self, messages: Vec<PlayerMessage>) -> Result<()>;

    /// Deliver messages before returning
    fn blocking_send_messages(&mut self, messages: Vec<PlayerMessage>) -> Result<()>;

    /// Release all resources. Every later call fails except `release` itself.
    fn release(&mut self) -> Result<()>;
}

/// Counters for conditions that are logged rather than surfaced as errors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub delivered_messages: u64,
    /// Addressed to a missing or unregistered component
    pub dropped_messages: u64,
    /// Still queued when the player was released
    pub discarded_on_release: u64,
    pub rejected_transitions: u64,
    pub playback_errors: u64,
    pub listener_failures: u64,
}

/// What callers could observe when an update cycle began
struct UpdateCycle {
    observable: (bool, PlaybackState),
    is_loading: bool,
    timeline_changed: bool,
    tracks_changed: bool,
    parameters_changed: bool,
    discontinuity: bool,
    errors: Vec<PlaybackException>,
}

pub struct Player {
    config: PlayerConfig,
    machine: StateMachine,
    bus: Option<MessageBus>,
    bus_handle: BusHandle,
    dispatcher: EventDispatcher,
    reader: StateReader,
    components: HashMap<ComponentId, Box<dyn PlayerComponent>>,
    next_component_id: u32,
    source: Option<Box<dyn MediaSource>>,
    timeline: Arc<Timeline>,
    manifest: Option<Manifest>,
    tracks: Arc<Tracks>,
    parameters: PlaybackParameters,
    position_ms: u64,
    buffered_position_ms: u64,
    // Set once the source reports buffered positions; enables underrun detection
    buffer_tracked: bool,
    stream_ended: bool,
    is_loading: bool,
    released: bool,
    diagnostics: Diagnostics,
}

impl Player {
    pub fn new(config: PlayerConfig) -> Result<Self> {
        config.validate()?;
        log::info!("Creating player: {:?}", config);

        let bus = MessageBus::new(config.bus_capacity);
        let bus_handle = bus.handle();
        let player = Self {
            machine: StateMachine::new(config.play_when_ready),
            config,
            bus: Some(bus),
            bus_handle,
            dispatcher: EventDispatcher::new(),
            reader: StateReader::new(),
            components: HashMap::new(),
            next_component_id: 1,
            source: None,
            timeline: Arc::new(Timeline::empty()),
            manifest: None,
            tracks: Arc::new(Tracks::empty()),
            parameters: PlaybackParameters::DEFAULT,
            position_ms: 0,
            buffered_position_ms: 0,
            buffer_tracked: false,
            stream_ended: false,
            is_loading: false,
            released: false,
            diagnostics: Diagnostics::default(),
        };
        player.publish();
        Ok(player)
    }

    fn ensure_not_released(&self) -> Result<()> {
        if self.released {
            Err(PlayerError::IllegalState("Player has been released".to_string()))
        } else {
            Ok(())
        }
    }

    // -------------------------------------------------------------------------
    // Control
    // -------------------------------------------------------------------------

    pub fn prepare(&mut self, mut source: Box<dyn MediaSource>) -> Result<()> {
        self.ensure_not_released()?;
        log::info!("prepare called");

        let mut cycle = self.begin_cycle();
        self.release_source();
        self.machine.reset();

        if self.position_ms != 0 {
            cycle.discontinuity = true;
        }
        self.position_ms = 0;
        self.buffered_position_ms = 0;
        self.buffer_tracked = false;
        self.stream_ended = false;

        if !self.timeline.is_empty() || self.manifest.is_some() {
            self.timeline = Arc::new(Timeline::empty());
            self.manifest = None;
            cycle.timeline_changed = true;
        }
        if !self.tracks.is_empty() {
            self.tracks = Arc::new(Tracks::empty());
            cycle.tracks_changed = true;
        }

        self.try_transition(PlaybackState::Buffering);
        self.is_loading = true;

        let result = source.prepare(self.bus_handle.clone());
        self.source = Some(source);
        if let Err(error) = result {
            self.fail_playback(&mut cycle, error);
        }

        self.finish_cycle(cycle);
        Ok(())
    }

    pub fn set_play_when_ready(&mut self, play_when_ready: bool) -> Result<()> {
        self.ensure_not_released()?;
        log::info!("set_play_when_ready called -> {}", play_when_ready);

        let cycle = self.begin_cycle();
        self.machine.set_play_when_ready(play_when_ready);
        self.finish_cycle(cycle);
        Ok(())
    }

    pub fn seek_to(&mut self, position_ms: u64) -> Result<()> {
        self.ensure_not_released()?;
        log::info!("seek_to called -> {} ms", position_ms);

        if let Some(duration_ms) = self.timeline.duration_ms() {
            if position_ms > duration_ms {
                return Err(PlayerError::IllegalSeekPosition {
                    position_ms,
                    duration_ms,
                });
            }
        }

        let mut cycle = self.begin_cycle();
        self.position_ms = position_ms;
        self.buffered_position_ms = position_ms;

        match self.machine.state() {
            PlaybackState::Buffering | PlaybackState::Ready => {
                self.try_transition(PlaybackState::Buffering);
                self.machine.clear_rebuffering();
                self.stream_ended = false;
                if let Some(source) = self.source.as_mut() {
                    source.on_seek(position_ms);
                }
                self.update_loading();
            }
            PlaybackState::Idle | PlaybackState::Ended => {}
        }

        cycle.discontinuity = true;
        self.finish_cycle(cycle);
        Ok(())
    }

    pub fn seek_to_default_position(&mut self) -> Result<()> {
        self.ensure_not_released()?;
        let position_ms = self.timeline.default_position_ms();
        self.seek_to(position_ms)
    }

    pub fn stop(&mut self) -> Result<()> {
        self.ensure_not_released()?;
        log::info!("stop called");

        let cycle = self.begin_cycle();
        self.release_source();
        self.machine.reset();
        self.is_loading = false;
        self.stream_ended = false;
        self.finish_cycle(cycle);
        Ok(())
    }

    pub fn set_playback_parameters(&mut self, params: PlaybackParameters) -> Result<()> {
        self.ensure_not_released()?;
        log::info!("set_playback_parameters called -> {:?}", params);

        let mut cycle = self.begin_cycle();
        self.replace_parameters(&mut cycle, params);
        self.finish_cycle(cycle);
        Ok(())
    }

    /// Terminal. A second call is a no-op.
    pub fn release(&mut self) -> Result<()> {
        if self.released {
            log::debug!("release called on released player, ignoring");
            return Ok(());
        }
        log::info!("release called");

        self.released = true;
        self.release_source();
        if let Some(bus) = self.bus.take() {
            let discarded = bus.close();
            self.diagnostics.discarded_on_release += discarded as u64;
            if discarded > 0 {
                log::info!("Discarded {} pending messages on release", discarded);
            }
        }
        self.components.clear();
        self.dispatcher.clear();
        // Nothing can play any more; no listener is told
        self.machine.reset();
        self.is_loading = false;
        self.stream_ended = false;
        self.publish();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Listeners, components and messages
    // -------------------------------------------------------------------------

    pub fn add_listener(&mut self, listener: Arc<dyn EventListener>) -> Result<ListenerId> {
        self.ensure_not_released()?;
        Ok(self.dispatcher.add_listener(listener))
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> Result<bool> {
        self.ensure_not_released()?;
        Ok(self.dispatcher.remove_listener(id))
    }

    /// Handle to the listener registry, usable from inside callbacks
    pub fn event_dispatcher(&self) -> Result<EventDispatcher> {
        self.ensure_not_released()?;
        Ok(self.dispatcher.clone())
    }

    pub fn register_component(&mut self, component: Box<dyn PlayerComponent>) -> Result<ComponentId> {
        self.ensure_not_released()?;
        let id = ComponentId(self.next_component_id);
        self.next_component_id += 1;
        self.components.insert(id, component);
        log::debug!("Registered {}", id);
        Ok(id)
    }

    /// Messages still queued for a removed component are dropped on delivery
    pub fn unregister_component(&mut self, id: ComponentId) -> Result<bool> {
        self.ensure_not_released()?;
        Ok(self.components.remove(&id).is_some())
    }

    pub fn bus_handle(&self) -> Result<BusHandle> {
        self.ensure_not_released()?;
        Ok(self.bus_handle.clone())
    }

    /// Queue the whole batch or nothing: on a bounded bus without room for
    /// every message this fails with `Bus` and no message is queued.
    pub fn send_messages(&mut self, messages: Vec<PlayerMessage>) -> Result<()> {
        self.ensure_not_released()?;
        self.bus_handle.post_all(messages)?;
        Ok(())
    }

    /// Post and deliver before returning. Messages already queued by other
    /// contexts are delivered first, preserving FIFO order. A rejected batch
    /// delivers nothing.
    pub fn blocking_send_messages(&mut self, messages: Vec<PlayerMessage>) -> Result<()> {
        self.send_messages(messages)?;
        self.pump()?;
        Ok(())
    }

    /// Deliver every message queued at the time of the call. Messages posted
    /// by handlers during the pump wait for the next one.
    pub fn pump(&mut self) -> Result<usize> {
        self.ensure_not_released()?;
        let pending = self.bus.as_ref().map_or(0, MessageBus::pending);

        let mut delivered = 0;
        while delivered < pending {
            let Some(envelope) = self.bus.as_ref().and_then(MessageBus::try_next) else {
                break;
            };
            self.deliver(envelope);
            delivered += 1;
        }
        Ok(delivered)
    }

    /// Wait up to `timeout` for a message, then deliver everything queued
    pub fn pump_timeout(&mut self, timeout: Duration) -> Result<usize> {
        self.ensure_not_released()?;
        let first = self.bus.as_ref().and_then(|bus| bus.next_timeout(timeout));
        match first {
            Some(envelope) => {
                self.deliver(envelope);
                Ok(1 + self.pump()?)
            }
            None => Ok(0),
        }
    }

    fn deliver(&mut self, envelope: Envelope) {
        let Envelope {
            sequence,
            message,
            ack,
        } = envelope;
        let (target, payload) = message.into_parts();
        log::debug!("Delivering message #{} to {}: {:?}", sequence, target, payload);

        let mut ctx = ComponentContext::new(
            self.machine.state(),
            self.machine.play_when_ready(),
            self.position_ms,
            self.buffered_position_ms,
            self.timeline.clone(),
            self.bus_handle.clone(),
        );

        let result = if target == ComponentId::PLAYER {
            PlayerTarget.handle_message(payload, &mut ctx)
        } else if let Some(component) = self.components.get_mut(&target) {
            component.handle_message(payload, &mut ctx)
        } else {
            self.diagnostics.dropped_messages += 1;
            log::warn!("Dropping message #{} for unknown target {}", sequence, target);
            ack.complete();
            return;
        };

        let mut cycle = self.begin_cycle();
        match result {
            Ok(()) => {
                for mutation in ctx.into_mutations() {
                    self.apply(&mut cycle, mutation);
                }
            }
            Err(error) => self.fail_playback(&mut cycle, error),
        }
        self.finish_cycle(cycle);

        self.diagnostics.delivered_messages += 1;
        ack.complete();
    }

    // -------------------------------------------------------------------------
    // State changes
    // -------------------------------------------------------------------------

    fn apply(&mut self, cycle: &mut UpdateCycle, mutation: Mutation) {
        match mutation {
            Mutation::Timeline { timeline, manifest } => {
                self.timeline = timeline;
                self.manifest = manifest;
                cycle.timeline_changed = true;
            }
            Mutation::Tracks(tracks) => {
                self.tracks = Arc::new(tracks);
                cycle.tracks_changed = true;
            }
            Mutation::Loading(is_loading) => self.is_loading = is_loading,
            Mutation::Buffer(signal) => self.apply_buffer_signal(signal),
            Mutation::BufferedPosition(position_ms) => {
                self.buffered_position_ms = position_ms;
                self.buffer_tracked = true;
                self.evaluate_buffer();
            }
            Mutation::Position(position_ms) => {
                self.position_ms = position_ms;
                self.evaluate_buffer();
            }
            Mutation::Parameters(params) => self.replace_parameters(cycle, params),
            Mutation::Discontinuity => cycle.discontinuity = true,
        }
    }

    fn apply_buffer_signal(&mut self, signal: BufferSignal) {
        let state = self.machine.state();
        match signal {
            BufferSignal::Underrun => {
                if matches!(state, PlaybackState::Ready | PlaybackState::Buffering) {
                    self.try_transition(PlaybackState::Buffering);
                } else {
                    self.reject_transition(PlayerError::InvalidTransition {
                        from: state,
                        to: PlaybackState::Buffering,
                    });
                }
            }
            BufferSignal::EnoughData => {
                self.try_transition(PlaybackState::Ready);
            }
            BufferSignal::EndOfStream => {
                if self.try_transition(PlaybackState::Ended) || state == PlaybackState::Ended {
                    self.stream_ended = true;
                    self.is_loading = false;
                }
            }
        }
    }

    /// Re-check thresholds after the position or buffered position moved
    fn evaluate_buffer(&mut self) {
        let ahead = self.buffered_position_ms.saturating_sub(self.position_ms);
        match self.machine.state() {
            PlaybackState::Buffering => {
                let policy = &self.config.buffer_policy;
                if policy.should_start_playback(ahead, self.machine.is_rebuffering()) {
                    self.try_transition(PlaybackState::Ready);
                }
            }
            PlaybackState::Ready => {
                if self.buffer_tracked && !self.stream_ended && ahead == 0 {
                    log::debug!("Buffer drained at {} ms", self.position_ms);
                    self.try_transition(PlaybackState::Buffering);
                }
            }
            PlaybackState::Idle | PlaybackState::Ended => return,
        }
        self.update_loading();
    }

    fn update_loading(&mut self) {
        if self.stream_ended {
            return;
        }
        let ahead = self.buffered_position_ms.saturating_sub(self.position_ms);
        self.is_loading = self
            .config
            .buffer_policy
            .should_continue_loading(ahead, self.is_loading);
    }

    fn replace_parameters(&mut self, cycle: &mut UpdateCycle, params: PlaybackParameters) {
        if self.parameters != params {
            self.parameters = params;
            cycle.parameters_changed = true;
        }
    }

    /// Returns whether the state changed
    fn try_transition(&mut self, to: PlaybackState) -> bool {
        match self.machine.transition(to) {
            Ok(changed) => changed,
            Err(err) => {
                self.reject_transition(err);
                false
            }
        }
    }

    fn reject_transition(&mut self, err: PlayerError) {
        self.diagnostics.rejected_transitions += 1;
        log::warn!("Rejected transition: {}", err);
    }

    fn fail_playback(&mut self, cycle: &mut UpdateCycle, error: PlaybackException) {
        log::error!("Playback error: {}", error);
        self.diagnostics.playback_errors += 1;
        self.release_source();
        self.machine.reset();
        self.is_loading = false;
        self.stream_ended = false;
        cycle.errors.push(error);
    }

    fn release_source(&mut self) {
        if let Some(mut source) = self.source.take() {
            log::debug!("Releasing media source");
            source.release();
        }
    }

    fn begin_cycle(&self) -> UpdateCycle {
        UpdateCycle {
            observable: self.machine.observable(),
            is_loading: self.is_loading,
            timeline_changed: false,
            tracks_changed: false,
            parameters_changed: false,
            discontinuity: false,
            errors: Vec::new(),
        }
    }

    /// Publish the new snapshot, then notify listeners
    fn finish_cycle(&mut self, cycle: UpdateCycle) {
        self.publish();

        let mut events = Vec::new();
        if cycle.timeline_changed {
            events.push(PlayerEvent::TimelineChanged {
                timeline: self.timeline.clone(),
                manifest: self.manifest.clone(),
            });
        }
        if cycle.tracks_changed {
            events.push(PlayerEvent::TracksChanged(self.tracks.clone()));
        }
        if cycle.is_loading != self.is_loading {
            events.push(PlayerEvent::LoadingChanged(self.is_loading));
        }
        let (play_when_ready, playback_state) = self.machine.observable();
        if cycle.observable != (play_when_ready, playback_state) {
            events.push(PlayerEvent::StateChanged {
                play_when_ready,
                playback_state,
            });
        }
        events.extend(cycle.errors.into_iter().map(PlayerEvent::Error));
        if cycle.discontinuity {
            events.push(PlayerEvent::PositionDiscontinuity);
        }
        if cycle.parameters_changed {
            events.push(PlayerEvent::ParametersChanged(self.parameters));
        }

        if !events.is_empty() {
            self.dispatcher.dispatch(events);
        }
    }

    fn publish(&self) {
        self.reader.publish(PlaybackSnapshot {
            playback_state: self.machine.state(),
            play_when_ready: self.machine.play_when_ready(),
            is_loading: self.is_loading,
            position_ms: self.position_ms,
            buffered_position_ms: self.buffered_position_ms,
            timeline: self.timeline.clone(),
            manifest: self.manifest.clone(),
            tracks: self.tracks.clone(),
            parameters: self.parameters,
        });
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn playback_state(&self) -> PlaybackState {
        self.machine.state()
    }

    pub fn play_when_ready(&self) -> bool {
        self.machine.play_when_ready()
    }

    pub fn is_actively_playing(&self) -> bool {
        self.machine.is_actively_playing()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Backpressure hint for loaders: keep fetching while this is true
    pub fn should_continue_loading(&self) -> bool {
        self.is_loading
    }

    pub fn current_position_ms(&self) -> u64 {
        self.position_ms
    }

    pub fn buffered_position_ms(&self) -> u64 {
        self.buffered_position_ms
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.timeline.duration_ms()
    }

    pub fn current_timeline(&self) -> Arc<Timeline> {
        self.timeline.clone()
    }

    pub fn current_manifest(&self) -> Option<Manifest> {
        self.manifest.clone()
    }

    pub fn current_tracks(&self) -> Arc<Tracks> {
        self.tracks.clone()
    }

    pub fn playback_parameters(&self) -> PlaybackParameters {
        self.parameters
    }

    /// Snapshot handle other threads can read without touching the player
    pub fn state_reader(&self) -> StateReader {
        self.reader.clone()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            listener_failures: self.dispatcher.listener_failures(),
            ..self.diagnostics
        }
    }
}

impl MediaPlayer for Player {
    fn prepare(&mut self, source: Box<dyn MediaSource>) -> Result<()> {
        Player::prepare(self, source)
    }

    fn set_play_when_ready(&mut self, play_when_ready: bool) -> Result<()> {
        Player::set_play_when_ready(self, play_when_ready)
    }

    fn play_when_ready(&self) -> bool {
        Player::play_when_ready(self)
    }

    fn playback_state(&self) -> PlaybackState {
        Player::playback_state(self)
    }

    fn seek_to(&mut self, position_ms: u64) -> Result<()> {
        Player::seek_to(self, position_ms)
    }

    fn stop(&mut self) -> Result<()> {
        Player::stop(self)
    }

    fn set_playback_parameters(&mut self, params: PlaybackParameters) -> Result<()> {
        Player::set_playback_parameters(self, params)
    }

    fn add_listener(&mut self, listener: Arc<dyn EventListener>) -> Result<ListenerId> {
        Player::add_listener(self, listener)
    }

    fn remove_listener(&mut self, id: ListenerId) -> Result<bool> {
        Player::remove_listener(self, id)
    }

    fn send_messages(&mut self, messages: Vec<PlayerMessage>) -> Result<()> {
        Player::send_messages(self, messages)
    }

    fn blocking_send_messages(&mut self, messages: Vec<PlayerMessage>) -> Result<()> {
        Player::blocking_send_messages(self, messages)
    }

    fn release(&mut self) -> Result<()> {
        Player::release(self)
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.release();
        }
    }
}
