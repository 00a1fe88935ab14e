/// Screen flow tests against the simulated player
use cadenza_core::{CategoryId, NavigationRequest, PlayerAdapter, PlayerState, RepeatMode};
use cadenza_playback::{SessionPhase, SessionSnapshot, SkipDirection, UserIntent};
use cadenza_terminal::router::{CATEGORY_PARAM, NOW_PLAYING_SCREEN, SELECTED_INDEX_PARAM};
use cadenza_terminal::{AppConfig, AppContext, AppError, Library, Route, ScreenCommand, SimulatedPlayer};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

fn setup() -> (AppContext, Arc<SimulatedPlayer>) {
    let mut config = AppConfig::default();
    // Clock is driven by hand
    config.simulator.tick_ms = 3_600_000;

    let player = Arc::new(SimulatedPlayer::start(&config.simulator));
    let adapter: Arc<dyn PlayerAdapter> = Arc::clone(&player) as Arc<dyn PlayerAdapter>;
    let context = AppContext::new(config, Library::builtin().unwrap(), adapter);
    (context, player)
}

async fn wait_for<F>(context: &AppContext, predicate: F) -> SessionSnapshot
where
    F: FnMut(&SessionSnapshot) -> bool,
{
    let session = context.session().expect("now playing is open");
    tokio::time::timeout(WAIT, session.wait_until(predicate))
        .await
        .expect("session settles in time")
        .unwrap()
}

async fn wait_for_player_state(player: &SimulatedPlayer, expected: PlayerState) {
    tokio::time::timeout(WAIT, async {
        while player.state().await != expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("player reaches state in time");
}

fn title(snapshot: &SessionSnapshot) -> &str {
    snapshot
        .now_playing
        .as_ref()
        .map(|n| n.title.as_str())
        .unwrap_or_default()
}

#[tokio::test]
async fn selecting_a_track_plays_it_first() {
    let (mut context, player) = setup();

    context.open_category(&CategoryId::new("cancons")).await.unwrap();
    context.select_track(2).await.unwrap();

    let snapshot = wait_for(&context, SessionSnapshot::is_settled).await;
    assert_eq!(title(&snapshot), "La dama d'Aragó");
    assert_eq!(snapshot.queue_len, 5);
    assert_eq!(snapshot.session.active_index, 0);

    // Queue is rotated so the selected track comes first
    let queued: Vec<String> = player
        .queued_tracks()
        .await
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(
        queued,
        vec![
            "La dama d'Aragó",
            "El vaixell de Grècia",
            "La Muixeranga",
            "El cant dels ocells",
            "L'Empordà",
        ]
    );
    assert_eq!(player.current_index().await.unwrap(), Some(0));
    wait_for_player_state(&player, PlayerState::Playing).await;
}

#[tokio::test]
async fn leaving_now_playing_keeps_the_music_going() {
    let (mut context, player) = setup();

    context.open_category(&CategoryId::new("histories")).await.unwrap();
    context.select_track(0).await.unwrap();
    wait_for(&context, SessionSnapshot::is_settled).await;
    wait_for_player_state(&player, PlayerState::Playing).await;

    assert!(context.go_back().await.unwrap());

    assert!(context.session().is_none());
    assert_eq!(
        context.route(),
        &Route::TrackList {
            category: CategoryId::new("histories")
        }
    );
    assert_eq!(player.state().await, PlayerState::Playing);
}

#[tokio::test]
async fn list_on_top_of_the_player_keeps_its_session() {
    let (mut context, player) = setup();

    context.open_category(&CategoryId::new("cancons")).await.unwrap();
    context.select_track(2).await.unwrap();
    wait_for(&context, SessionSnapshot::is_settled).await;
    context
        .handle(ScreenCommand::Intent(UserIntent::TapSkip(SkipDirection::Next)))
        .await
        .unwrap();
    wait_for(&context, |s| s.is_settled() && s.session.active_index == 1).await;
    wait_for_player_state(&player, PlayerState::Playing).await;
    player.advance(7.0).await;

    context.handle(ScreenCommand::Open(CategoryId::new("all"))).await.unwrap();
    assert_eq!(context.route(), &Route::AllTracks);
    assert!(context.session().is_some());

    assert!(context.go_back().await.unwrap());

    assert!(matches!(context.route(), Route::NowPlaying { .. }));
    let snapshot = wait_for(&context, |s| s.session.position_seconds == 7.0).await;
    assert_eq!(snapshot.session.active_index, 1);
    assert_eq!(title(&snapshot), "El vaixell de Grècia");
    assert_eq!(player.current_index().await.unwrap(), Some(1));
    assert_eq!(player.position().await, 7.0);
    assert_eq!(player.queued_tracks().await.len(), 5);
}

#[tokio::test]
async fn home_from_a_list_over_the_player_ends_the_session() {
    let (mut context, player) = setup();

    context.open_category(&CategoryId::new("cancons")).await.unwrap();
    context.select_track(0).await.unwrap();
    wait_for(&context, SessionSnapshot::is_settled).await;
    wait_for_player_state(&player, PlayerState::Playing).await;

    context.handle(ScreenCommand::Open(CategoryId::new("histories"))).await.unwrap();
    assert!(context.session().is_some());

    context.handle(ScreenCommand::Home).await.unwrap();
    assert!(context.session().is_none());
    assert_eq!(player.state().await, PlayerState::Playing);
}

#[tokio::test]
async fn replaced_player_screen_reloads_its_queue_on_return() {
    let (mut context, player) = setup();

    context.open_category(&CategoryId::new("cancons")).await.unwrap();
    context.select_track(1).await.unwrap();
    wait_for(&context, SessionSnapshot::is_settled).await;

    context.handle(ScreenCommand::Open(CategoryId::new("all"))).await.unwrap();
    context.handle(ScreenCommand::Select(0)).await.unwrap();
    let snapshot = wait_for(&context, SessionSnapshot::is_settled).await;
    assert_eq!(snapshot.queue_len, 16);

    // Back to the list, then back to the first player screen
    assert!(context.go_back().await.unwrap());
    assert_eq!(context.route(), &Route::AllTracks);
    assert!(context.session().is_none());

    assert!(context.go_back().await.unwrap());
    let snapshot = wait_for(&context, |s| s.is_settled() && s.queue_len == 5).await;
    assert_eq!(title(&snapshot), "L'Empordà");
    assert_eq!(player.queued_tracks().await[0].title, "L'Empordà");
    assert_eq!(context.active_session().unwrap().selected_index, 1);
}

#[tokio::test]
async fn back_at_the_root_changes_nothing() {
    let (mut context, _player) = setup();

    assert!(!context.go_back().await.unwrap());
    assert_eq!(context.route(), &Route::Home);
    assert!(context.session().is_none());
}

#[tokio::test]
async fn normal_playback_reports_no_failures() {
    let (mut context, _player) = setup();
    assert!(context.take_failures().is_empty());

    context.open_category(&CategoryId::new("cancons")).await.unwrap();
    context.select_track(0).await.unwrap();
    wait_for(&context, SessionSnapshot::is_settled).await;

    assert!(context.take_failures().is_empty());
}

#[tokio::test]
async fn tap_skip_moves_the_player() {
    let (mut context, player) = setup();

    context.open_category(&CategoryId::new("llegendes")).await.unwrap();
    context.select_track(0).await.unwrap();
    wait_for(&context, SessionSnapshot::is_settled).await;

    context
        .handle(ScreenCommand::Intent(UserIntent::TapSkip(SkipDirection::Next)))
        .await
        .unwrap();

    let snapshot = wait_for(&context, |s| s.is_settled() && s.session.active_index == 1).await;
    assert_eq!(title(&snapshot), "El comte Arnau");
    assert_eq!(snapshot.carousel.settled_index, 1);
    assert_eq!(player.current_index().await.unwrap(), Some(1));
}

#[tokio::test]
async fn toggle_pauses_the_player() {
    let (mut context, player) = setup();

    context.open_category(&CategoryId::new("cancons")).await.unwrap();
    context.select_track(0).await.unwrap();
    wait_for(&context, SessionSnapshot::is_settled).await;
    wait_for_player_state(&player, PlayerState::Playing).await;

    context
        .handle(ScreenCommand::Intent(UserIntent::TogglePlayback))
        .await
        .unwrap();

    let snapshot = wait_for(&context, |s| !s.session.is_playing).await;
    assert_eq!(snapshot.phase, SessionPhase::Ready);
    wait_for_player_state(&player, PlayerState::Paused).await;

    let screen = context.render().unwrap();
    assert!(screen.starts_with("El cant dels ocells\n"));
}

#[tokio::test]
async fn dites_repeat_the_current_track() {
    let (mut context, player) = setup();

    context.open_category(&CategoryId::new("dites")).await.unwrap();
    context.select_track(1).await.unwrap();
    wait_for(&context, SessionSnapshot::is_settled).await;

    let options = player.options().await.unwrap();
    assert_eq!(options.repeat_mode, RepeatMode::Track);
}

#[tokio::test]
async fn all_tracks_list_can_be_played() {
    let (mut context, _player) = setup();

    context.handle(ScreenCommand::Open(CategoryId::new("all"))).await.unwrap();
    assert_eq!(context.route(), &Route::AllTracks);

    context.handle(ScreenCommand::Select(5)).await.unwrap();
    let snapshot = wait_for(&context, SessionSnapshot::is_settled).await;
    assert_eq!(title(&snapshot), "Jaume I i la conquesta de Mallorca");
    assert_eq!(snapshot.queue_len, 16);
}

#[tokio::test]
async fn missing_selected_index_is_rejected() {
    let (mut context, _player) = setup();

    let request = NavigationRequest::new(NOW_PLAYING_SCREEN).with_param(CATEGORY_PARAM, "cancons");
    assert!(matches!(
        context.navigate(request).await,
        Err(AppError::Core(_))
    ));

    let request = NavigationRequest::new(NOW_PLAYING_SCREEN)
        .with_param(CATEGORY_PARAM, "cancons")
        .with_param(SELECTED_INDEX_PARAM, json!(-1));
    assert!(context.navigate(request).await.is_err());

    assert_eq!(context.route(), &Route::Home);
    assert!(context.session().is_none());
}

#[tokio::test]
async fn out_of_range_selection_keeps_the_list_open() {
    let (mut context, player) = setup();

    context.open_category(&CategoryId::new("cancons")).await.unwrap();
    let result = context.select_track(5).await;

    assert!(matches!(result, Err(AppError::InvalidQueue(_))));
    assert_eq!(
        context.route(),
        &Route::TrackList {
            category: CategoryId::new("cancons")
        }
    );
    assert!(context.session().is_none());
    assert!(player.queued_tracks().await.is_empty());
}

#[tokio::test]
async fn gestures_need_an_open_player() {
    let (mut context, _player) = setup();

    let result = context
        .handle(ScreenCommand::Intent(UserIntent::TogglePlayback))
        .await;
    assert!(matches!(result, Err(AppError::NoSession)));

    // Selecting needs a track list
    assert!(matches!(
        context.select_track(0).await,
        Err(AppError::Navigation(_))
    ));
}

#[tokio::test]
async fn home_closes_the_session() {
    let (mut context, _player) = setup();

    context.open_category(&CategoryId::new("cancons")).await.unwrap();
    context.select_track(1).await.unwrap();
    wait_for(&context, SessionSnapshot::is_settled).await;

    context.handle(ScreenCommand::Home).await.unwrap();

    assert_eq!(context.route(), &Route::Home);
    assert_eq!(context.router().depth(), 1);
    assert!(context.session().is_none());
    assert!(context.render().unwrap().contains("cancons"));
}
