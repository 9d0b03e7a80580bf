// Shared helpers for player integration tests
#![allow(dead_code)]

use frc_player::{
    BufferSignal, BusHandle, ComponentContext, ComponentId, EventListener, Manifest, MediaSource,
    MessagePayload, PlaybackException, PlaybackParameters, PlaybackState, Player, PlayerComponent,
    PlayerConfig, StateReader, Timeline, Tracks,
};
use parking_lot::Mutex;
use std::sync::Arc;

pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Timeline(usize),
    Tracks(usize),
    Loading(bool),
    State(bool, PlaybackState),
    Error(String),
    Discontinuity,
    Params(f32),
}

/// Records every callback in arrival order
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Recorded>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<Recorded> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn states(&self) -> Vec<(bool, PlaybackState)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::State(pwr, state) => Some((pwr, state)),
                _ => None,
            })
            .collect()
    }
}

impl EventListener for RecordingListener {
    fn on_timeline_changed(&self, timeline: &Arc<Timeline>, _manifest: Option<&Manifest>) {
        self.events.lock().push(Recorded::Timeline(timeline.window_count()));
    }

    fn on_tracks_changed(&self, tracks: &Tracks) {
        self.events.lock().push(Recorded::Tracks(tracks.groups().len()));
    }

    fn on_loading_changed(&self, is_loading: bool) {
        self.events.lock().push(Recorded::Loading(is_loading));
    }

    fn on_player_state_changed(&self, play_when_ready: bool, playback_state: PlaybackState) {
        self.events
            .lock()
            .push(Recorded::State(play_when_ready, playback_state));
    }

    fn on_player_error(&self, error: &PlaybackException) {
        self.events.lock().push(Recorded::Error(error.message.clone()));
    }

    fn on_position_discontinuity(&self) {
        self.events.lock().push(Recorded::Discontinuity);
    }

    fn on_playback_parameters_changed(&self, params: PlaybackParameters) {
        self.events.lock().push(Recorded::Params(params.speed()));
    }
}

/// Fails on every state change
pub struct PanickingListener;

impl EventListener for PanickingListener {
    fn on_player_state_changed(&self, _play_when_ready: bool, _state: PlaybackState) {
        panic!("listener failure");
    }
}

/// Checks the published snapshot agrees with each state event
pub struct SnapshotCheckingListener {
    pub reader: StateReader,
    pub mismatches: Mutex<u32>,
}

impl EventListener for SnapshotCheckingListener {
    fn on_player_state_changed(&self, play_when_ready: bool, playback_state: PlaybackState) {
        let snapshot = self.reader.snapshot();
        if snapshot.playback_state != playback_state || snapshot.play_when_ready != play_when_ready {
            *self.mismatches.lock() += 1;
        }
    }
}

/// Calls made on a [`ScriptedSource`]
#[derive(Debug, Default, Clone)]
pub struct SourceLog {
    pub prepared: u32,
    pub seeks: Vec<u64>,
    pub released: u32,
}

/// Media source that records hooks and optionally fails or posts on prepare
pub struct ScriptedSource {
    log: Arc<Mutex<SourceLog>>,
    fail_prepare: Option<PlaybackException>,
    timeline_on_prepare: Option<Timeline>,
    bus: Option<BusHandle>,
}

impl ScriptedSource {
    pub fn new() -> (Box<Self>, Arc<Mutex<SourceLog>>) {
        let log = Arc::new(Mutex::new(SourceLog::default()));
        let source = Box::new(Self {
            log: log.clone(),
            fail_prepare: None,
            timeline_on_prepare: None,
            bus: None,
        });
        (source, log)
    }

    pub fn failing(error: PlaybackException) -> (Box<Self>, Arc<Mutex<SourceLog>>) {
        let (mut source, log) = Self::new();
        source.fail_prepare = Some(error);
        (source, log)
    }

    pub fn with_timeline(timeline: Timeline) -> (Box<Self>, Arc<Mutex<SourceLog>>) {
        let (mut source, log) = Self::new();
        source.timeline_on_prepare = Some(timeline);
        (source, log)
    }
}

impl MediaSource for ScriptedSource {
    fn prepare(&mut self, bus: BusHandle) -> Result<(), PlaybackException> {
        self.log.lock().prepared += 1;
        if let Some(error) = self.fail_prepare.take() {
            return Err(error);
        }
        if let Some(timeline) = self.timeline_on_prepare.take() {
            bus.post(
                ComponentId::PLAYER,
                MessagePayload::TimelineRefreshed {
                    timeline: Arc::new(timeline),
                    manifest: None,
                },
            )
            .map_err(|e| PlaybackException::source(e.to_string()))?;
        }
        self.bus = Some(bus);
        Ok(())
    }

    fn on_seek(&mut self, position_ms: u64) {
        self.log.lock().seeks.push(position_ms);
    }

    fn release(&mut self) {
        self.log.lock().released += 1;
        self.bus = None;
    }
}

/// Records `(component tag, message type)` into a log shared between components
pub struct RecordingComponent {
    pub tag: u32,
    pub log: Arc<Mutex<Vec<(u32, i32)>>>,
}

impl PlayerComponent for RecordingComponent {
    fn handle_message(
        &mut self,
        payload: MessagePayload,
        _ctx: &mut ComponentContext,
    ) -> Result<(), PlaybackException> {
        self.log.lock().push((self.tag, payload.message_type()));
        Ok(())
    }
}

pub fn new_player(listener: &Arc<RecordingListener>) -> Player {
    init_test_logging();
    let mut player = Player::new(PlayerConfig::default()).unwrap();
    player.add_listener(listener.clone()).unwrap();
    player
}

pub fn post(player: &Player, payload: MessagePayload) {
    player
        .bus_handle()
        .unwrap()
        .post(ComponentId::PLAYER, payload)
        .unwrap();
}

pub fn signal(player: &mut Player, signal: BufferSignal) {
    post(player, MessagePayload::Buffer(signal));
    player.pump().unwrap();
}

/// Prepared, `Ready`, playWhenReady = true, events cleared
pub fn ready_player() -> (Player, Arc<RecordingListener>, Arc<Mutex<SourceLog>>) {
    let listener = RecordingListener::new();
    let mut player = new_player(&listener);
    let (source, log) = ScriptedSource::new();
    player.set_play_when_ready(true).unwrap();
    player.prepare(source).unwrap();
    signal(&mut player, BufferSignal::EnoughData);
    assert_eq!(player.playback_state(), PlaybackState::Ready);
    listener.take();
    (player, listener, log)
}
