//! Controller scenario tests
//!
//! Drives the synchronization controller directly: every command it issues
//! is acknowledged (or failed) by hand, every player event injected in the
//! order under test.

use cadenza_core::{MediaRef, PlayerState, TrackDescriptor};
use cadenza_playback::{
    CommandAck, CommandError, PlayQueue, PlayerCommand, SessionNotice, SessionPhase,
    SkipDirection, SyncConfig, SyncController, UserIntent, ViewUpdate,
};

// ===== Helpers =====

fn catalog(ids: &[&str]) -> Vec<TrackDescriptor> {
    ids.iter()
        .map(|id| {
            TrackDescriptor::new(
                *id,
                format!("Title {}", id),
                "Popular",
                MediaRef::new(format!("artwork/{}.webp", id)),
                MediaRef::new(format!("audio/{}.mp3", id)),
            )
        })
        .collect()
}

fn numbered_catalog(len: usize) -> Vec<TrackDescriptor> {
    let ids: Vec<String> = (0..len).map(|i| format!("t{}", i)).collect();
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    catalog(&refs)
}

/// Controller with its queue loaded and the load notices drained
fn loaded(queue: PlayQueue) -> SyncController {
    let mut controller = SyncController::new(queue, SyncConfig::default());
    match controller.poll_command() {
        Some(PlayerCommand::Load(_)) => {}
        other => panic!("expected load command, got {:?}", other),
    }
    controller.on_command_completed(Ok(CommandAck::default()));
    controller.take_view_updates();
    controller.take_notices();
    controller
}

fn loaded_len(len: usize) -> SyncController {
    loaded(PlayQueue::build(&numbered_catalog(len), 0).unwrap())
}

fn drain_commands(controller: &mut SyncController) -> Vec<PlayerCommand> {
    let mut commands = Vec::new();
    while let Some(command) = controller.poll_command() {
        commands.push(command);
        controller.on_command_completed(Ok(CommandAck::default()));
    }
    commands
}

// ===== Initialization =====

#[test]
fn load_completion_enters_ready_at_first_track() {
    let queue = PlayQueue::build(&catalog(&["A", "B", "C", "D"]), 2).unwrap();
    let mut controller = SyncController::new(queue, SyncConfig::default());

    let Some(PlayerCommand::Load(tracks)) = controller.poll_command() else {
        panic!("expected load command");
    };
    let ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["C", "D", "A", "B"]);

    controller.on_command_completed(Ok(CommandAck::default()));

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Ready);
    assert_eq!(snapshot.session.active_index, 0);
    assert!(snapshot.session.is_playing);
    assert!(snapshot.is_settled());
    assert_eq!(snapshot.now_playing.unwrap().title, "Title C");
    assert_eq!(
        controller.take_notices(),
        vec![SessionNotice::Initialized]
    );
    assert_eq!(
        controller.take_view_updates(),
        vec![ViewUpdate::ScrollTo {
            index: 0,
            offset: 0.0,
            animated: false
        }]
    );
}

#[test]
fn failed_setup_stays_initializing_until_retry() {
    let queue = PlayQueue::build(&numbered_catalog(3), 0).unwrap();
    let mut controller = SyncController::new(queue, SyncConfig::default());

    assert!(matches!(
        controller.poll_command(),
        Some(PlayerCommand::Load(_))
    ));
    controller.on_command_completed(Err(CommandError::Failed("no audio session".into())));

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Initializing);
    assert_eq!(snapshot.init_error.as_deref(), Some("no audio session"));
    assert!(snapshot.now_playing.is_none());
    assert_eq!(
        controller.take_notices(),
        vec![SessionNotice::InitFailed {
            reason: "no audio session".into()
        }]
    );

    // Nothing is retried on its own
    assert!(controller.poll_command().is_none());

    controller.apply_intent(UserIntent::RetryInitialization);
    assert!(controller.snapshot().init_error.is_none());
    assert!(matches!(
        controller.poll_command(),
        Some(PlayerCommand::Load(_))
    ));
    controller.on_command_completed(Ok(CommandAck::default()));
    assert_eq!(controller.phase(), SessionPhase::Ready);
}

// ===== Tap skip =====

#[test]
fn tap_skip_wraps_in_rotated_queue() {
    let queue = PlayQueue::build(&catalog(&["A", "B", "C", "D"]), 2).unwrap();

    let mut controller = loaded(queue.clone());
    controller.on_user_tap_skip(SkipDirection::Next);
    assert_eq!(controller.session().active_index, 1);
    assert_eq!(
        controller.snapshot().now_playing.unwrap().title,
        "Title D"
    );
    assert_eq!(controller.poll_command(), Some(PlayerCommand::SkipTo(1)));

    let mut controller = loaded(queue);
    controller.on_user_tap_skip(SkipDirection::Previous);
    assert_eq!(controller.session().active_index, 3);
    assert_eq!(
        controller.snapshot().now_playing.unwrap().title,
        "Title B"
    );
    assert_eq!(controller.poll_command(), Some(PlayerCommand::SkipTo(3)));
}

#[test]
fn tap_skip_is_optimistic_and_scrolls_carousel() {
    let mut controller = loaded_len(4);
    controller.on_user_tap_skip(SkipDirection::Next);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Skipping);
    assert!(snapshot.unconfirmed);
    assert_eq!(snapshot.carousel.settled_index, 1);
    assert_eq!(
        controller.take_view_updates(),
        vec![ViewUpdate::ScrollTo {
            index: 1,
            offset: 1.0,
            animated: true
        }]
    );
}

#[test]
fn track_changed_event_wins_over_in_flight_skip() {
    let mut controller = loaded_len(8);

    controller.on_user_tap_skip(SkipDirection::Next);
    assert_eq!(controller.poll_command(), Some(PlayerCommand::SkipTo(1)));

    // Player reports a different track before the skip completes
    controller.on_player_track_changed(Some(5));
    assert_eq!(controller.session().active_index, 5);

    controller.on_command_completed(Ok(CommandAck {
        observed_index: Some(1),
    }));

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.session.active_index, 5);
    assert_eq!(snapshot.carousel.settled_index, 5);
    assert_eq!(snapshot.phase, SessionPhase::Ready);
    assert!(!snapshot.unconfirmed);
    assert!(controller
        .take_notices()
        .contains(&SessionNotice::EventRaceIgnored {
            optimistic: 1,
            authoritative: 5
        }));
}

#[test]
fn track_changed_event_discards_pending_skip() {
    let mut controller = loaded_len(8);

    controller.on_swipe_settle(3);
    controller.on_player_track_changed(Some(6));

    assert_eq!(controller.session().active_index, 6);
    assert!(controller.poll_command().is_none());
    assert!(controller
        .take_notices()
        .contains(&SessionNotice::EventRaceIgnored {
            optimistic: 3,
            authoritative: 6
        }));
}

// ===== Swipe =====

#[test]
fn rapid_swipes_issue_one_skip_to_latest_target() {
    let mut controller = loaded_len(10);

    controller.on_swipe_settle(3);
    controller.on_swipe_settle(7);

    assert_eq!(drain_commands(&mut controller), vec![PlayerCommand::SkipTo(7)]);
    assert!(controller
        .take_notices()
        .contains(&SessionNotice::SkipCoalesced {
            superseded: 3,
            target: 7
        }));
}

#[test]
fn swipes_during_in_flight_skip_coalesce_behind_it() {
    let mut controller = loaded_len(10);

    controller.on_swipe_settle(2);
    assert_eq!(controller.poll_command(), Some(PlayerCommand::SkipTo(2)));

    controller.on_swipe_settle(3);
    controller.on_swipe_settle(4);
    controller.on_swipe_settle(7);
    assert!(controller.poll_command().is_none(), "one command at a time");

    controller.on_command_completed(Ok(CommandAck {
        observed_index: Some(2),
    }));
    assert_eq!(controller.session().active_index, 7);
    assert_eq!(controller.poll_command(), Some(PlayerCommand::SkipTo(7)));
    controller.on_command_completed(Ok(CommandAck::default()));

    controller.on_player_track_changed(Some(7));
    assert!(controller.snapshot().is_settled());
}

#[test]
fn swipe_onto_active_page_is_a_bounce() {
    let mut controller = loaded_len(4);
    controller.on_swipe_settle(0);

    assert!(controller.poll_command().is_none());
    assert_eq!(controller.phase(), SessionPhase::Ready);
    assert!(controller.take_view_updates().is_empty());
}

#[test]
fn swipe_does_not_scroll_the_carousel_it_came_from() {
    let mut controller = loaded_len(4);
    controller.on_scroll(0.4);
    controller.on_scroll_end(0.8);

    assert_eq!(controller.session().active_index, 1);
    assert_eq!(controller.carousel().settled_index, 1);
    assert_eq!(controller.carousel().visual_offset, 1.0);
    assert!(controller.take_view_updates().is_empty());
}

#[test]
fn out_of_range_swipe_snaps_back() {
    let mut controller = loaded_len(3);
    controller.on_scroll(2.5);
    controller.on_scroll_end(3.2);

    assert!(controller.poll_command().is_none());
    assert_eq!(controller.session().active_index, 0);
    assert_eq!(
        controller.take_view_updates(),
        vec![ViewUpdate::ScrollTo {
            index: 0,
            offset: 0.0,
            animated: true
        }]
    );
}

#[test]
fn page_width_scales_offsets() {
    let queue = PlayQueue::build(&numbered_catalog(4), 0).unwrap();
    let config = SyncConfig {
        page_width: 320.0,
        ..SyncConfig::default()
    };
    let mut controller = SyncController::new(queue, config);
    controller.poll_command();
    controller.on_command_completed(Ok(CommandAck::default()));

    controller.on_scroll_end(700.0);
    assert_eq!(controller.session().active_index, 2);
    assert_eq!(controller.carousel().visual_offset, 640.0);
}

// ===== Progress and end of track =====

#[test]
fn end_of_track_stops_exactly_once() {
    let mut controller = loaded_len(3);

    controller.on_progress_tick(119.0, 120.0);
    assert!(controller.poll_command().is_none());

    controller.on_progress_tick(120.0, 120.0);
    assert_eq!(controller.poll_command(), Some(PlayerCommand::StopAtEnd));
    controller.on_command_completed(Ok(CommandAck::default()));

    // Further ticks at the end do not stop again
    controller.on_progress_tick(120.0, 120.0);
    controller.on_progress_tick(120.0, 120.0);
    assert!(controller.poll_command().is_none());

    assert!(!controller.session().is_playing);
    assert!(controller
        .take_notices()
        .contains(&SessionNotice::EndOfTrack { index: 0 }));
}

#[test]
fn end_of_track_rearms_after_rewind() {
    let mut controller = loaded_len(3);

    controller.on_progress_tick(30.0, 30.0);
    assert_eq!(drain_commands(&mut controller), vec![PlayerCommand::StopAtEnd]);

    controller.on_progress_tick(0.0, 30.0);
    controller.on_progress_tick(29.5, 30.0);
    assert_eq!(drain_commands(&mut controller), vec![PlayerCommand::StopAtEnd]);
}

#[test]
fn progress_updates_clock_labels() {
    let mut controller = loaded_len(2);
    controller.on_progress_tick(65.7, 200.0);

    let now_playing = controller.snapshot().now_playing.unwrap();
    assert_eq!(now_playing.elapsed, "01:05");
    assert_eq!(now_playing.remaining, "02:14");
}

#[test]
fn end_of_old_track_during_skip_is_ignored() {
    let mut controller = loaded_len(3);
    controller.on_user_tap_skip(SkipDirection::Next);
    controller.on_progress_tick(120.0, 120.0);

    assert_eq!(drain_commands(&mut controller), vec![PlayerCommand::SkipTo(1)]);
}

// ===== Scrub =====

#[test]
fn scrub_seeks_without_changing_track() {
    let mut controller = loaded_len(3);
    controller.on_progress_tick(10.0, 100.0);

    controller.on_scrub_release(42.0);
    assert_eq!(controller.phase(), SessionPhase::Seeking);
    assert_eq!(controller.session().position_seconds, 42.0);

    assert_eq!(controller.poll_command(), Some(PlayerCommand::Seek(42.0)));
    controller.on_command_completed(Ok(CommandAck::default()));

    assert_eq!(controller.phase(), SessionPhase::Ready);
    assert_eq!(controller.session().active_index, 0);
}

#[test]
fn seek_timeout_is_silent() {
    let mut controller = loaded_len(3);
    controller.on_progress_tick(10.0, 100.0);
    controller.on_scrub_release(50.0);

    controller.poll_command();
    controller.on_command_completed(Err(CommandError::TimedOut));

    assert_eq!(controller.phase(), SessionPhase::Ready);
    assert!(controller.take_notices().is_empty());
}

#[test]
fn scrub_clamps_to_track_length() {
    let mut controller = loaded_len(3);
    controller.on_progress_tick(10.0, 100.0);
    controller.on_scrub_release(250.0);

    assert_eq!(controller.poll_command(), Some(PlayerCommand::Seek(100.0)));
}

// ===== Toggle =====

#[test]
fn toggle_pauses_unless_paused() {
    let mut controller = loaded_len(3);

    controller.on_player_state_changed(PlayerState::Playing);
    controller.toggle_playback();
    assert_eq!(controller.poll_command(), Some(PlayerCommand::Pause));
    controller.on_command_completed(Ok(CommandAck::default()));

    controller.on_player_state_changed(PlayerState::Paused);
    controller.toggle_playback();
    assert_eq!(controller.poll_command(), Some(PlayerCommand::Play));
    controller.on_command_completed(Ok(CommandAck::default()));

    // Buffering and stopped both count as "not paused"
    controller.on_player_state_changed(PlayerState::Buffering);
    controller.toggle_playback();
    assert_eq!(controller.poll_command(), Some(PlayerCommand::Pause));
}

#[test]
fn double_toggle_uses_optimistic_state() {
    let mut controller = loaded_len(3);
    controller.on_player_state_changed(PlayerState::Playing);

    controller.toggle_playback();
    controller.toggle_playback();

    assert_eq!(
        drain_commands(&mut controller),
        vec![PlayerCommand::Pause, PlayerCommand::Play]
    );
}

#[test]
fn failed_toggle_restores_reported_state() {
    let mut controller = loaded_len(3);
    controller.on_player_state_changed(PlayerState::Playing);

    controller.toggle_playback();
    assert!(!controller.session().is_playing);
    controller.poll_command();
    controller.on_command_completed(Err(CommandError::Failed("busy".into())));

    assert!(controller.session().is_playing);
    assert_eq!(controller.player_state(), PlayerState::Playing);
}

#[test]
fn pause_after_skip_is_sent_after_the_skip() {
    let mut controller = loaded_len(4);
    controller.on_player_state_changed(PlayerState::Playing);

    controller.on_user_tap_skip(SkipDirection::Next);
    controller.toggle_playback();

    assert!(!controller.session().is_playing);
    assert_eq!(
        drain_commands(&mut controller),
        vec![PlayerCommand::SkipTo(1), PlayerCommand::Pause]
    );
}

#[test]
fn pause_before_skip_is_overridden_by_the_skip() {
    let mut controller = loaded_len(4);
    controller.on_player_state_changed(PlayerState::Playing);

    controller.toggle_playback();
    controller.on_user_tap_skip(SkipDirection::Next);

    // Skipping starts playback
    assert!(controller.session().is_playing);
    assert_eq!(controller.player_state(), PlayerState::Playing);
    assert_eq!(
        drain_commands(&mut controller),
        vec![PlayerCommand::Pause, PlayerCommand::SkipTo(1)]
    );
}

#[test]
fn skip_behind_in_flight_command_keeps_request_order() {
    let mut controller = loaded_len(4);
    controller.on_player_state_changed(PlayerState::Playing);

    controller.toggle_playback();
    assert_eq!(controller.poll_command(), Some(PlayerCommand::Pause));

    controller.on_user_tap_skip(SkipDirection::Next);
    controller.toggle_playback();
    controller.on_command_completed(Ok(CommandAck::default()));

    assert!(!controller.session().is_playing);
    assert_eq!(
        drain_commands(&mut controller),
        vec![PlayerCommand::SkipTo(1), PlayerCommand::Pause]
    );
}

#[test]
fn coalesced_skip_keeps_its_first_position() {
    let mut controller = loaded_len(5);
    controller.on_player_state_changed(PlayerState::Playing);

    controller.on_user_tap_skip(SkipDirection::Next);
    controller.toggle_playback();
    controller.on_user_tap_skip(SkipDirection::Next);

    assert_eq!(
        drain_commands(&mut controller),
        vec![PlayerCommand::SkipTo(2), PlayerCommand::Pause]
    );
}

#[test]
fn dropped_stop_does_not_delay_the_skip() {
    let mut controller = loaded_len(4);
    controller.on_player_state_changed(PlayerState::Playing);

    controller.on_progress_tick(30.0, 30.0);
    controller.on_user_tap_skip(SkipDirection::Next);
    controller.toggle_playback();

    assert_eq!(
        drain_commands(&mut controller),
        vec![PlayerCommand::SkipTo(1), PlayerCommand::Pause]
    );
}

// ===== Failures =====

#[test]
fn failed_skip_reverts_to_last_confirmed_track() {
    let mut controller = loaded_len(5);
    controller.on_player_track_changed(Some(2));
    controller.take_view_updates();

    controller.on_user_tap_skip(SkipDirection::Next);
    assert_eq!(controller.session().active_index, 3);
    controller.poll_command();
    controller.on_command_completed(Err(CommandError::Failed("index out of range".into())));

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.session.active_index, 2);
    assert_eq!(snapshot.carousel.settled_index, 2);
    assert_eq!(snapshot.phase, SessionPhase::Ready);
    assert!(controller
        .take_notices()
        .contains(&SessionNotice::CommandFailure {
            command: "skip".into(),
            reason: "index out of range".into()
        }));

    // The gesture can simply be repeated
    controller.on_user_tap_skip(SkipDirection::Next);
    assert_eq!(controller.poll_command(), Some(PlayerCommand::SkipTo(3)));
}

#[test]
fn failed_skip_with_newer_request_keeps_newer_target() {
    let mut controller = loaded_len(6);
    controller.on_swipe_settle(1);
    controller.poll_command();
    controller.on_swipe_settle(4);

    controller.on_command_completed(Err(CommandError::TimedOut));
    assert_eq!(controller.session().active_index, 4);
    assert_eq!(controller.poll_command(), Some(PlayerCommand::SkipTo(4)));
}

// ===== Player events =====

#[test]
fn queue_end_resets_carousel_to_first_page() {
    let mut controller = loaded_len(4);
    controller.on_player_track_changed(Some(3));
    controller.take_view_updates();

    controller.on_player_track_changed(None);
    assert_eq!(controller.session().active_index, 0);
    assert_eq!(
        controller.take_view_updates(),
        vec![ViewUpdate::ScrollTo {
            index: 0,
            offset: 0.0,
            animated: true
        }]
    );
}

#[test]
fn out_of_range_track_change_is_ignored() {
    let mut controller = loaded_len(3);
    controller.on_player_track_changed(Some(9));
    assert_eq!(controller.session().active_index, 0);
    assert!(controller.snapshot().is_settled());
}

#[test]
fn events_mid_gesture_do_not_fight_the_finger() {
    let mut controller = loaded_len(4);
    controller.on_scroll(0.3);
    controller.on_player_track_changed(Some(2));

    assert_eq!(controller.session().active_index, 2);
    assert!(controller.take_view_updates().is_empty());

    // Settling back on the active page needs no command
    controller.on_scroll_end(2.1);
    assert!(controller.poll_command().is_none());
    assert!(controller.snapshot().is_settled());
}

// ===== Teardown =====

#[test]
fn teardown_mid_skip_sends_nothing_to_player() {
    let mut controller = loaded_len(4);
    controller.on_user_tap_skip(SkipDirection::Next);
    assert_eq!(controller.poll_command(), Some(PlayerCommand::SkipTo(1)));
    controller.on_user_tap_skip(SkipDirection::Next);

    controller.teardown();
    controller.on_command_completed(Ok(CommandAck::default()));
    controller.on_player_track_changed(Some(1));
    controller.on_progress_tick(60.0, 60.0);
    controller.toggle_playback();

    assert_eq!(controller.phase(), SessionPhase::TornDown);
    assert!(controller.poll_command().is_none());
    assert!(controller.take_view_updates().is_empty());
}
