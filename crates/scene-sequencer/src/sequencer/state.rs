use super::Seconds;
use serde::{Deserialize, Serialize};

/// Internal mutable state (owned by the sequencer)
#[derive(Debug, Clone)]
pub(crate) struct PlaybackState {
	// Observable state
	pub cursor: Seconds,
	pub rate: f64,
	pub current_scene: usize,
	pub initialized: bool,
	pub paused: bool,
	pub finished: bool,

	// Clock reading at the last tick; `Some` while attached to the frame clock
	pub last_tick: Option<Seconds>,
}

impl PlaybackState {
	pub fn new() -> Self {
		Self {
			cursor: 0.0,
			rate: 1.0,
			current_scene: 0,
			initialized: false,
			paused: false,
			finished: false,
			last_tick: None,
		}
	}

	pub fn is_attached(&self) -> bool {
		self.last_tick.is_some()
	}

	/// Start honoring ticks. Already attached keeps the running reading.
	pub fn attach(&mut self, now: Seconds) {
		if self.last_tick.is_none() {
			self.last_tick = Some(now);
		}
	}

	/// Restart the frame delta from `now` after the cursor was moved by hand.
	/// No effect while detached.
	pub fn rebase(&mut self, now: Seconds) {
		if self.last_tick.is_some() {
			self.last_tick = Some(now);
		}
	}

	pub fn detach(&mut self) {
		self.last_tick = None;
	}

	/// Advance the cursor by a clock delta scaled by rate, clamped to the end.
	/// Returns the clock delta that was consumed.
	pub fn advance(&mut self, now: Seconds, total_duration: Seconds) -> Seconds {
		let elapsed = self.last_tick.map_or(0.0, |last| (now - last).max(0.0));
		self.last_tick = Some(now);
		self.cursor = (self.cursor + elapsed * self.rate).min(total_duration);
		elapsed
	}

	pub fn progress(&self, total_duration: Seconds) -> f64 {
		if total_duration <= 0.0 {
			return 0.0;
		}
		(self.cursor / total_duration).clamp(0.0, 1.0)
	}

	pub fn is_playing(&self) -> bool {
		self.initialized && !self.paused && !self.finished && self.is_attached()
	}

	pub fn snapshot(&self, total_duration: Seconds) -> PlaybackSnapshot {
		PlaybackSnapshot {
			initialized: self.initialized,
			paused: self.paused,
			playing: self.is_playing(),
			finished: self.finished,
			current_scene: self.current_scene,
			cursor: self.cursor,
			total_duration,
			progress: self.progress(total_duration),
			rate: self.rate,
		}
	}
}

impl Default for PlaybackState {
	fn default() -> Self {
		Self::new()
	}
}

/// Copy of the observable playback state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
	pub initialized: bool,
	pub paused: bool,
	pub playing: bool,
	pub finished: bool,
	pub current_scene: usize,
	pub cursor: Seconds,
	pub total_duration: Seconds,
	pub progress: f64,
	pub rate: f64,
}

impl Default for PlaybackSnapshot {
	fn default() -> Self {
		PlaybackState::new().snapshot(0.0)
	}
}

/// Diagnostics summary of the sequencer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceInfo {
	pub is_playing: bool,
	pub current_scene: usize,
	pub progress: f64,
	pub total_duration: Seconds,
	pub timeline_length: usize,
}
