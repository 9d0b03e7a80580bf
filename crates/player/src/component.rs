// Message targets and the changes they may request

use frc_core::{
    Manifest, PlaybackException, PlaybackParameters, PlaybackState, Timeline, Tracks,
};
use frc_message_bus::{BufferSignal, BusHandle, MessagePayload};
use std::sync::Arc;

/// A named participant that receives bus messages on the player's context.
pub trait PlayerComponent: Send {
    /// Handle one message. Changes requested through `ctx` are applied only
    /// if this returns `Ok`; an `Err` is reported through `on_player_error`.
    fn handle_message(
        &mut self,
        payload: MessagePayload,
        ctx: &mut ComponentContext,
    ) -> Result<(), PlaybackException>;
}

/// State change requested by a component
#[derive(Debug)]
pub(crate) enum Mutation {
    Timeline {
        timeline: Arc<Timeline>,
        manifest: Option<Manifest>,
    },
    Tracks(Tracks),
    Loading(bool),
    Buffer(BufferSignal),
    BufferedPosition(u64),
    Position(u64),
    Parameters(PlaybackParameters),
    Discontinuity,
}

/// Read-only view of the player plus a log of requested changes
pub struct ComponentContext {
    state: PlaybackState,
    play_when_ready: bool,
    position_ms: u64,
    buffered_position_ms: u64,
    timeline: Arc<Timeline>,
    bus: BusHandle,
    mutations: Vec<Mutation>,
}

impl ComponentContext {
    pub(crate) fn new(
        state: PlaybackState,
        play_when_ready: bool,
        position_ms: u64,
        buffered_position_ms: u64,
        timeline: Arc<Timeline>,
        bus: BusHandle,
    ) -> Self {
        Self {
            state,
            play_when_ready,
            position_ms,
            buffered_position_ms,
            timeline,
            bus,
            mutations: Vec::new(),
        }
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.state
    }

    pub fn play_when_ready(&self) -> bool {
        self.play_when_ready
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    pub fn buffered_position_ms(&self) -> u64 {
        self.buffered_position_ms
    }

    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    /// For follow-up messages; they are delivered after the current one
    pub fn bus(&self) -> &BusHandle {
        &self.bus
    }

    pub fn replace_timeline(&mut self, timeline: Arc<Timeline>, manifest: Option<Manifest>) {
        self.mutations.push(Mutation::Timeline { timeline, manifest });
    }

    pub fn replace_tracks(&mut self, tracks: Tracks) {
        self.mutations.push(Mutation::Tracks(tracks));
    }

    pub fn set_loading(&mut self, is_loading: bool) {
        self.mutations.push(Mutation::Loading(is_loading));
    }

    pub fn signal_buffer(&mut self, signal: BufferSignal) {
        self.mutations.push(Mutation::Buffer(signal));
    }

    pub fn set_buffered_position(&mut self, position_ms: u64) {
        self.mutations.push(Mutation::BufferedPosition(position_ms));
    }

    pub fn set_position(&mut self, position_ms: u64) {
        self.mutations.push(Mutation::Position(position_ms));
    }

    pub fn set_playback_parameters(&mut self, params: PlaybackParameters) {
        self.mutations.push(Mutation::Parameters(params));
    }

    pub fn report_discontinuity(&mut self) {
        self.mutations.push(Mutation::Discontinuity);
    }

    pub(crate) fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }
}

/// Built-in target for `ComponentId::PLAYER`: maps each known payload onto
/// the matching state change.
pub(crate) struct PlayerTarget;

impl PlayerComponent for PlayerTarget {
    fn handle_message(
        &mut self,
        payload: MessagePayload,
        ctx: &mut ComponentContext,
    ) -> Result<(), PlaybackException> {
        match payload {
            MessagePayload::TimelineRefreshed { timeline, manifest } => {
                ctx.replace_timeline(timeline, manifest)
            }
            MessagePayload::TracksChanged(tracks) => ctx.replace_tracks(tracks),
            MessagePayload::LoadingChanged(is_loading) => ctx.set_loading(is_loading),
            MessagePayload::Buffer(signal) => ctx.signal_buffer(signal),
            MessagePayload::BufferedPosition(ms) => ctx.set_buffered_position(ms),
            MessagePayload::PlaybackPosition(ms) => ctx.set_position(ms),
            MessagePayload::ParametersChanged(params) => ctx.set_playback_parameters(params),
            MessagePayload::Error(error) => return Err(error),
            MessagePayload::Opaque { message_type, .. } => {
                log::debug!("Player ignoring opaque message type {}", message_type);
            }
        }
        Ok(())
    }
}
