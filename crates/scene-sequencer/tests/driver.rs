// Driver task tests: commands in, snapshots and events out

use scene_sequencer::sequencer::*;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

fn spawn(config: SequencerConfig) -> (SequencerDriver, ManualClock) {
	init_tracing();
	let clock = ManualClock::new();
	let sequencer = SceneSequencer::new(SceneTable::default_presentation(), clock.clone());
	let driver = SequencerDriver::spawn(sequencer, config.with_tick_interval(1)).unwrap();
	(driver, clock)
}

async fn wait_until(rx: &mut watch::Receiver<PlaybackSnapshot>, f: impl FnMut(&PlaybackSnapshot) -> bool) -> PlaybackSnapshot {
	timeout(WAIT, rx.wait_for(f)).await.expect("timed out waiting for state").expect("driver stopped").clone()
}

/// Drain events up to and including the first match
async fn collect_until(rx: &mut broadcast::Receiver<SequencerEvent>, last: SequencerEvent) -> Vec<SequencerEvent> {
	let mut seen = Vec::new();
	loop {
		let event = timeout(WAIT, rx.recv()).await.expect("timed out waiting for event").unwrap();
		seen.push(event);
		if event == last {
			return seen;
		}
	}
}

#[tokio::test]
async fn spawn_initializes_without_playing() {
	let (driver, _clock) = spawn(SequencerConfig::default());
	let state = driver.current_state();
	assert!(state.initialized);
	assert!(!state.playing);
	assert_eq!(state.total_duration, 25.0);
	driver.shutdown().await;
}

#[tokio::test]
async fn plays_through_to_complete() {
	let (driver, clock) = spawn(SequencerConfig::default());
	let mut state = driver.subscribe();
	let mut events = driver.events();

	driver.play().unwrap();
	wait_until(&mut state, |s| s.playing).await;

	clock.advance(30.0);
	let done = wait_until(&mut state, |s| s.finished).await;
	assert_eq!(done.current_scene, 5);
	assert_eq!(done.progress, 1.0);
	assert!(!done.playing);

	let seen = collect_until(&mut events, SequencerEvent::Complete).await;
	let changes: Vec<_> = seen
		.iter()
		.filter_map(|e| match e {
			SequencerEvent::SceneChange(i) => Some(*i),
			_ => None,
		})
		.collect();
	assert_eq!(seen.first(), Some(&SequencerEvent::Play));
	assert_eq!(changes, vec![0, 1, 2, 3, 4, 5]);

	driver.shutdown().await;
}

#[tokio::test]
async fn autoplay_and_speed_come_from_config() {
	let (driver, clock) = spawn(SequencerConfig::new().with_autoplay(true).with_speed(2.0));
	let mut state = driver.subscribe();
	assert!(driver.current_state().playing);
	assert_eq!(driver.current_state().rate, 2.0);

	clock.advance(5.0);
	let s = wait_until(&mut state, |s| s.cursor >= 10.0).await;
	assert_eq!(s.current_scene, 3);

	driver.shutdown().await;
}

#[tokio::test]
async fn pause_stops_the_cursor() {
	let (driver, clock) = spawn(SequencerConfig::new().with_autoplay(true));
	let mut state = driver.subscribe();

	clock.advance(2.0);
	wait_until(&mut state, |s| s.cursor >= 2.0).await;

	driver.pause().unwrap();
	wait_until(&mut state, |s| s.paused).await;

	clock.advance(10.0);
	tokio::time::sleep(Duration::from_millis(20)).await;
	assert_eq!(driver.current_state().cursor, 2.0);

	driver.shutdown().await;
}

#[tokio::test]
async fn skip_commands_reach_the_sequencer() {
	let (driver, _clock) = spawn(SequencerConfig::default());
	let mut state = driver.subscribe();
	let mut events = driver.events();

	driver.skip_to_scene(3).unwrap();
	let s = wait_until(&mut state, |s| s.current_scene == 3).await;
	assert_eq!(s.cursor, 10.0);
	assert_eq!(s.progress, 0.4);

	driver.skip_to_end().unwrap();
	wait_until(&mut state, |s| s.finished).await;

	let seen = collect_until(&mut events, SequencerEvent::Skip).await;
	assert_eq!(
		seen,
		vec![SequencerEvent::SceneChange(3), SequencerEvent::SceneChange(5), SequencerEvent::Skip]
	);

	driver.shutdown().await;
}

#[tokio::test]
async fn seek_after_replaying_a_finished_run_starts_from_the_scene() {
	let (driver, clock) = spawn(SequencerConfig::new().with_autoplay(true));
	let mut state = driver.subscribe();
	clock.advance(30.0);
	wait_until(&mut state, |s| s.finished).await;

	let mut events = driver.events();
	driver.play().unwrap();
	collect_until(&mut events, SequencerEvent::Play).await;

	clock.advance(10.0);
	driver.skip_to_scene(1).unwrap();
	wait_until(&mut state, |s| s.current_scene == 1 && !s.finished).await;

	// let the driver run a few frames with no clock movement
	tokio::time::sleep(Duration::from_millis(20)).await;
	let s = driver.current_state();
	assert_eq!(s.cursor, 3.0);
	assert_eq!(s.current_scene, 1);
	assert!(s.playing);

	driver.shutdown().await;
}

#[tokio::test]
async fn shutdown_destroys_and_rejects_further_commands() {
	let (driver, _clock) = spawn(SequencerConfig::new().with_autoplay(true));
	driver.shutdown().await;

	let state = driver.current_state();
	assert!(!state.initialized);
	assert!(!state.playing);
	assert!(matches!(driver.play(), Err(SequencerError::Internal(_))));
}

#[tokio::test]
async fn invalid_config_is_rejected_before_spawning() {
	let sequencer = SceneSequencer::new(SceneTable::default_presentation(), ManualClock::new());
	let err = SequencerDriver::spawn(sequencer, SequencerConfig::new().with_tick_interval(0)).unwrap_err();
	assert!(matches!(err, SequencerError::InvalidConfig(_)));
}

#[tokio::test]
async fn empty_table_fails_to_spawn() {
	let sequencer = SceneSequencer::new(SceneTable::new(Vec::new()), ManualClock::new());
	let err = SequencerDriver::spawn(sequencer, SequencerConfig::default()).unwrap_err();
	assert!(matches!(err, SequencerError::EmptySceneTable));
}
