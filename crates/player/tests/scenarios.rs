mod common;

use common::{new_player, post, ready_player, signal, Recorded, RecordingListener, ScriptedSource};
use frc_player::{BufferSignal, MessagePayload, PlaybackState, PlayerError};

#[test]
fn test_play_when_ready_in_idle_only_reports_flag() {
    let listener = RecordingListener::new();
    let mut player = new_player(&listener);

    player.set_play_when_ready(true).unwrap();

    assert_eq!(player.playback_state(), PlaybackState::Idle);
    assert!(player.play_when_ready());
    assert!(!player.is_actively_playing());
    assert_eq!(listener.events(), vec![Recorded::State(true, PlaybackState::Idle)]);

    // Same value again: nothing observable changed
    player.set_play_when_ready(true).unwrap();
    assert_eq!(listener.events().len(), 1);
}

#[test]
fn test_enough_data_after_prepare_starts_playback() {
    let listener = RecordingListener::new();
    let mut player = new_player(&listener);
    player.set_play_when_ready(true).unwrap();

    let (source, log) = ScriptedSource::new();
    player.prepare(source).unwrap();
    assert_eq!(log.lock().prepared, 1);
    assert_eq!(player.playback_state(), PlaybackState::Buffering);

    post(&player, MessagePayload::Buffer(BufferSignal::EnoughData));
    assert_eq!(player.pump().unwrap(), 1);

    assert_eq!(player.playback_state(), PlaybackState::Ready);
    assert!(player.is_actively_playing());
    assert_eq!(
        listener.states(),
        vec![
            (true, PlaybackState::Idle),
            (true, PlaybackState::Buffering),
            (true, PlaybackState::Ready),
        ]
    );
}

#[test]
fn test_underrun_while_ready_rebuffers() {
    let (mut player, listener, _log) = ready_player();

    signal(&mut player, BufferSignal::Underrun);

    assert_eq!(player.playback_state(), PlaybackState::Buffering);
    assert!(!player.is_actively_playing());
    assert_eq!(listener.events(), vec![Recorded::State(true, PlaybackState::Buffering)]);
}

#[test]
fn test_end_of_stream_is_terminal_until_reset() {
    let (mut player, listener, _log) = ready_player();

    signal(&mut player, BufferSignal::EndOfStream);
    assert_eq!(player.playback_state(), PlaybackState::Ended);

    player.set_play_when_ready(false).unwrap();
    assert!(!player.play_when_ready());
    assert_eq!(player.playback_state(), PlaybackState::Ended);

    player.set_play_when_ready(true).unwrap();
    assert_eq!(player.playback_state(), PlaybackState::Ended);
    assert!(!player.is_actively_playing());

    // Data signals cannot leave Ended
    signal(&mut player, BufferSignal::EnoughData);
    signal(&mut player, BufferSignal::Underrun);
    assert_eq!(player.playback_state(), PlaybackState::Ended);
    assert_eq!(player.diagnostics().rejected_transitions, 2);

    assert_eq!(
        listener.states(),
        vec![
            (true, PlaybackState::Ended),
            (false, PlaybackState::Ended),
            (true, PlaybackState::Ended),
        ]
    );

    player.stop().unwrap();
    assert_eq!(player.playback_state(), PlaybackState::Idle);
}

#[test]
fn test_calls_after_release_fail() {
    let (mut player, listener, log) = ready_player();

    player.release().unwrap();
    assert!(player.is_released());
    assert_eq!(log.lock().released, 1);

    // Nothing can play any more
    let reader = player.state_reader();
    assert_eq!(player.playback_state(), PlaybackState::Idle);
    assert!(!player.is_actively_playing());
    assert!(!player.is_loading());
    assert_eq!(reader.playback_state(), PlaybackState::Idle);
    assert!(!reader.is_actively_playing());

    assert!(matches!(player.seek_to(5), Err(PlayerError::IllegalState(_))));
    assert!(matches!(
        player.set_play_when_ready(false),
        Err(PlayerError::IllegalState(_))
    ));
    assert!(matches!(player.stop(), Err(PlayerError::IllegalState(_))));
    assert!(matches!(player.pump(), Err(PlayerError::IllegalState(_))));
    assert!(matches!(player.bus_handle(), Err(PlayerError::IllegalState(_))));
    let (source, _) = ScriptedSource::new();
    assert!(matches!(player.prepare(source), Err(PlayerError::IllegalState(_))));

    // Second release is a no-op
    assert!(player.release().is_ok());
    assert_eq!(log.lock().released, 1);

    // Release emits nothing
    assert!(listener.events().is_empty());
}
