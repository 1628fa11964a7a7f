use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

use super::error::{panic_message, CallbackHook, Result, SequencerError};
use super::state::PlaybackState;
use super::{Clock, EventEmitter, EventKind, ListenerId, Mark, MarkCursor, MarkKind, SceneTable, SequencerEvent, Subscription, SystemClock, Timeline};
use super::{PerformanceInfo, PlaybackSnapshot, Seconds};

// ============================================================================
// SceneSequencer
// ============================================================================

/// Drives a fixed scene table along a master timeline.
///
/// Transport calls only mutate state; time moves in [`SceneSequencer::tick`],
/// which the host calls from its frame loop. Misuse before `initialize` is
/// logged and ignored.
pub struct SceneSequencer {
	scenes: SceneTable,
	timeline: Option<Timeline>,
	marks: MarkCursor,
	state: PlaybackState,
	emitter: EventEmitter,
	clock: Box<dyn Clock>,
}

impl SceneSequencer {
	pub fn new(scenes: SceneTable, clock: impl Clock + 'static) -> Self {
		Self {
			scenes,
			timeline: None,
			marks: MarkCursor::new(),
			state: PlaybackState::new(),
			emitter: EventEmitter::new(),
			clock: Box::new(clock),
		}
	}

	pub fn with_system_clock(scenes: SceneTable) -> Self {
		Self::new(scenes, SystemClock::new())
	}

	/// Build the master timeline. Idempotent; a failed validation installs nothing.
	pub fn initialize(&mut self) -> Result<()> {
		if self.state.initialized {
			debug!("SceneSequencer already initialized");
			return Ok(());
		}

		self.scenes.validate()?;

		let timeline = self.scenes.compile_timeline();
		info!(
			scenes = self.scenes.len(),
			marks = timeline.len(),
			total_duration = timeline.total_duration(),
			"SceneSequencer initialized"
		);

		self.marks = MarkCursor::new();
		self.timeline = Some(timeline);
		self.state = PlaybackState::new();
		self.state.initialized = true;
		Ok(())
	}

	// ------------------------------------------------------------------------
	// Transport
	// ------------------------------------------------------------------------

	pub fn play(&mut self) {
		if self.timeline.is_none() {
			return not_initialized("play");
		}

		self.state.paused = false;
		self.state.attach(self.clock.now());
		self.emitter.emit(SequencerEvent::Play);
		info!(cursor = self.state.cursor, "Playback started");
	}

	pub fn pause(&mut self) {
		if self.timeline.is_none() {
			return not_initialized("pause");
		}

		self.state.paused = true;
		self.state.detach();
		self.emitter.emit(SequencerEvent::Pause);
		info!(cursor = self.state.cursor, "Playback paused");
	}

	pub fn resume(&mut self) {
		if self.timeline.is_none() {
			return not_initialized("resume");
		}

		self.state.paused = false;
		self.state.attach(self.clock.now());
		self.emitter.emit(SequencerEvent::Resume);
		info!(cursor = self.state.cursor, "Playback resumed");
	}

	/// Rewind to scene 0 and play. Every mark fires again.
	pub fn restart(&mut self) {
		if self.timeline.is_none() {
			return not_initialized("restart");
		}

		self.state.cursor = 0.0;
		self.state.current_scene = 0;
		self.state.finished = false;
		self.state.paused = false;
		self.state.detach();
		self.state.attach(self.clock.now());
		self.marks.reset();
		self.emitter.emit(SequencerEvent::Restart);
		info!("Playback restarted");
	}

	/// Jump to the end and settle on the terminal scene. Callbacks of skipped
	/// scenes do not run and `Complete` is not emitted.
	pub fn skip_to_end(&mut self) {
		let Some(timeline) = self.timeline.as_ref() else {
			return not_initialized("skip_to_end");
		};

		let terminal = timeline.scene_count().saturating_sub(1);
		self.state.cursor = timeline.total_duration();
		self.state.current_scene = terminal;
		self.state.finished = true;
		self.state.detach();
		self.marks.exhaust(timeline);

		self.emitter.emit(SequencerEvent::SceneChange(terminal));
		self.emitter.emit(SequencerEvent::Skip);
		info!(scene = %self.scenes.label(terminal), "Skipped to end");
	}

	/// Seek to the start of a scene. Out of range is ignored without an event.
	pub fn skip_to_scene(&mut self, index: usize) {
		let Some(timeline) = self.timeline.as_ref() else {
			return not_initialized("skip_to_scene");
		};

		let (Some(start), Some(start_mark)) = (timeline.scene_start(index), timeline.start_mark(index)) else {
			warn!(scene = index, scenes = timeline.scene_count(), "Scene index out of range");
			return;
		};

		self.state.cursor = start;
		self.state.current_scene = index;
		self.state.finished = false;
		self.state.rebase(self.clock.now());
		self.marks.seek(timeline, start_mark + 1);

		self.emitter.emit(SequencerEvent::SceneChange(index));
		info!(scene = %self.scenes.label(index), cursor = start, "Skipped to scene");
	}

	pub fn set_playback_speed(&mut self, rate: f64) {
		if self.timeline.is_none() {
			return not_initialized("set_playback_speed");
		}
		if !(rate.is_finite() && rate > 0.0) {
			warn!(rate, "Ignoring non-positive playback speed");
			return;
		}

		self.state.rate = rate;
		info!(rate, "Playback speed set");
	}

	/// Release the timeline and all listeners. The sequencer reads as never
	/// initialized afterwards; `initialize` rebuilds from the scene table.
	pub fn destroy(&mut self) {
		self.state.detach();
		self.timeline = None;
		self.marks.reset();
		self.state = PlaybackState::new();
		self.emitter.clear();
		info!("SceneSequencer destroyed");
	}

	// ------------------------------------------------------------------------
	// Frame clock
	// ------------------------------------------------------------------------

	/// Advance by the clock time since the previous tick. Ignored unless
	/// attached (playing). Fires every crossed mark in order, then
	/// `Progress`, then `Complete` once when the end is reached.
	pub fn tick(&mut self) {
		let Some(timeline) = self.timeline.as_ref() else {
			return;
		};
		if !self.state.is_attached() {
			return;
		}

		let total = timeline.total_duration();
		let elapsed = self.state.advance(self.clock.now(), total);
		let cursor = self.state.cursor;

		let scenes = &mut self.scenes;
		let state = &mut self.state;
		let emitter = &self.emitter;
		self.marks.apply_until(timeline, cursor, |mark| cross_mark(mark, scenes, state, emitter));

		debug!(elapsed, cursor, scene = self.state.current_scene, "Tick");
		self.emitter.emit(SequencerEvent::Progress(self.state.progress(total)));

		if cursor < total {
			return;
		}

		if !self.state.finished {
			let terminal = timeline.scene_count().saturating_sub(1);
			if self.state.current_scene != terminal {
				self.state.current_scene = terminal;
				self.emitter.emit(SequencerEvent::SceneChange(terminal));
			}
			self.state.finished = true;
			self.emitter.emit(SequencerEvent::Complete);
			info!(scene = %self.scenes.label(terminal), "Scene sequence complete");
		}
		self.state.detach();
	}

	// ------------------------------------------------------------------------
	// Queries
	// ------------------------------------------------------------------------

	pub fn current_scene(&self) -> usize {
		self.state.current_scene
	}

	pub fn progress(&self) -> f64 {
		self.state.progress(self.total_duration())
	}

	pub fn total_duration(&self) -> Seconds {
		self.timeline.as_ref().map_or(0.0, Timeline::total_duration)
	}

	pub fn cursor(&self) -> Seconds {
		self.state.cursor
	}

	pub fn playback_speed(&self) -> f64 {
		self.state.rate
	}

	pub fn is_initialized(&self) -> bool {
		self.state.initialized
	}

	pub fn is_playing(&self) -> bool {
		self.state.is_playing()
	}

	pub fn is_finished(&self) -> bool {
		self.state.finished
	}

	pub fn snapshot(&self) -> PlaybackSnapshot {
		self.state.snapshot(self.total_duration())
	}

	pub fn performance_info(&self) -> PerformanceInfo {
		PerformanceInfo {
			is_playing: self.is_playing(),
			current_scene: self.current_scene(),
			progress: self.progress(),
			total_duration: self.total_duration(),
			timeline_length: self.timeline.as_ref().map_or(0, Timeline::len),
		}
	}

	// ------------------------------------------------------------------------
	// Events
	// ------------------------------------------------------------------------

	pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> Subscription
	where
		F: Fn(&SequencerEvent) + Send + Sync + 'static,
	{
		self.emitter.subscribe(kind, listener)
	}

	pub fn subscribe_all<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&SequencerEvent) + Send + Sync + 'static,
	{
		self.emitter.subscribe_all(listener)
	}

	pub fn unsubscribe(&self, id: ListenerId) -> bool {
		self.emitter.unsubscribe(id)
	}
}

impl std::fmt::Debug for SceneSequencer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SceneSequencer")
			.field("scenes", &self.scenes.len())
			.field("state", &self.state)
			.field("emitter", &self.emitter)
			.finish()
	}
}

fn not_initialized(operation: &'static str) {
	let err = SequencerError::NotInitialized { operation };
	warn!(error = %err, "Transport call ignored");
}

/// Apply one boundary mark to the state
fn cross_mark(mark: &Mark, scenes: &mut SceneTable, state: &mut PlaybackState, emitter: &EventEmitter) {
	match mark.kind {
		MarkKind::SceneStart => {
			state.current_scene = mark.scene;
			debug!(scene = %scenes.label(mark.scene), at = mark.at, "Entered scene");
			emitter.emit(SequencerEvent::SceneChange(mark.scene));
			run_callback(scenes, mark.scene, CallbackHook::OnStart);
		}
		MarkKind::SceneEnd => {
			debug!(scene = %scenes.label(mark.scene), at = mark.at, "Scene content finished");
			run_callback(scenes, mark.scene, CallbackHook::OnComplete);
		}
	}
}

/// Run a scene hook, containing both returned errors and panics
fn run_callback(scenes: &mut SceneTable, index: usize, hook: CallbackHook) {
	let Some(callback) = scenes.get_mut(index).and_then(|scene| scene.callback_mut(hook)) else {
		return;
	};

	let message = match panic::catch_unwind(AssertUnwindSafe(|| callback())) {
		Ok(Ok(())) => return,
		Ok(Err(e)) => format!("{e:#}"),
		Err(payload) => panic_message(payload.as_ref()),
	};

	let err = SequencerError::Callback { index, hook, message };
	error!(scene = index, error = %err, "Scene callback failed");
}
