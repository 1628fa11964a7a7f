use super::error::{CallbackHook, Result, SequencerError};
use super::{Mark, MarkKind, Seconds, Timeline};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Zero-argument scene hook. Errors and panics are contained by the sequencer.
pub type SceneCallback = Box<dyn FnMut() -> anyhow::Result<()> + Send>;

/// One entry of the scene table
pub struct SceneDescriptor {
	pub name: Option<String>,
	pub duration: Seconds,
	pub delay: Seconds,
	on_start: Option<SceneCallback>,
	on_complete: Option<SceneCallback>,
}

impl SceneDescriptor {
	pub fn new(duration: Seconds) -> Self {
		Self {
			name: None,
			duration,
			delay: 0.0,
			on_start: None,
			on_complete: None,
		}
	}

	pub fn named(name: impl Into<String>, duration: Seconds) -> Self {
		Self {
			name: Some(name.into()),
			..Self::new(duration)
		}
	}

	pub fn with_delay(mut self, delay: Seconds) -> Self {
		self.delay = delay;
		self
	}

	pub fn on_start<F>(mut self, callback: F) -> Self
	where
		F: FnMut() -> anyhow::Result<()> + Send + 'static,
	{
		self.on_start = Some(Box::new(callback));
		self
	}

	pub fn on_complete<F>(mut self, callback: F) -> Self
	where
		F: FnMut() -> anyhow::Result<()> + Send + 'static,
	{
		self.on_complete = Some(Box::new(callback));
		self
	}

	/// Time from this scene's start to the next scene's start
	pub fn span(&self) -> Seconds {
		self.duration + self.delay
	}

	pub(crate) fn callback_mut(&mut self, hook: CallbackHook) -> Option<&mut SceneCallback> {
		match hook {
			CallbackHook::OnStart => self.on_start.as_mut(),
			CallbackHook::OnComplete => self.on_complete.as_mut(),
		}
	}

	fn validate(&self, index: usize) -> Result<()> {
		for (field, value) in [("duration", self.duration), ("delay", self.delay)] {
			if !value.is_finite() {
				return Err(SequencerError::InvalidScene {
					index,
					reason: format!("{field} must be finite, got {value}"),
				});
			}
			if value < 0.0 {
				return Err(SequencerError::InvalidScene {
					index,
					reason: format!("{field} must not be negative, got {value}"),
				});
			}
		}
		Ok(())
	}
}

impl std::fmt::Debug for SceneDescriptor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SceneDescriptor")
			.field("name", &self.name)
			.field("duration", &self.duration)
			.field("delay", &self.delay)
			.field("on_start", &self.on_start.is_some())
			.field("on_complete", &self.on_complete.is_some())
			.finish()
	}
}

/// Serializable scene entry, the data half of a [`SceneDescriptor`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneSpec {
	#[serde(default)]
	pub name: Option<String>,
	pub duration: Seconds,
	#[serde(default)]
	pub delay: Seconds,
}

/// Convert from data type to service type
impl From<SceneSpec> for SceneDescriptor {
	fn from(spec: SceneSpec) -> Self {
		Self {
			name: spec.name,
			duration: spec.duration,
			delay: spec.delay,
			on_start: None,
			on_complete: None,
		}
	}
}

/// Fixed, ordered scene table. Set once, never reordered.
#[derive(Debug, Default)]
pub struct SceneTable {
	scenes: Vec<SceneDescriptor>,
}

impl SceneTable {
	pub fn new(scenes: Vec<SceneDescriptor>) -> Self {
		Self { scenes }
	}

	pub fn from_specs(specs: Vec<SceneSpec>) -> Self {
		Self::new(specs.into_iter().map(SceneDescriptor::from).collect())
	}

	/// Parse a JSON array of [`SceneSpec`]
	pub fn from_json(json: &str) -> Result<Self> {
		let specs: Vec<SceneSpec> = serde_json::from_str(json)?;
		Ok(Self::from_specs(specs))
	}

	/// The six-scene landing presentation: hook, bleed, transform, chart build,
	/// comparison, then an open-ended call to action.
	pub fn default_presentation() -> Self {
		Self::new(vec![
			SceneDescriptor::named("Hook", 3.0),
			SceneDescriptor::named("Bleed", 3.0),
			SceneDescriptor::named("Transform", 4.0),
			SceneDescriptor::named("Chart Build", 10.0),
			SceneDescriptor::named("Comparison", 5.0),
			SceneDescriptor::named("CTA", 0.0),
		])
	}

	pub fn len(&self) -> usize {
		self.scenes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.scenes.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&SceneDescriptor> {
		self.scenes.get(index)
	}

	pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut SceneDescriptor> {
		self.scenes.get_mut(index)
	}

	pub fn iter(&self) -> impl Iterator<Item = &SceneDescriptor> {
		self.scenes.iter()
	}

	/// Display label for logs
	pub fn label(&self, index: usize) -> String {
		match self.get(index).and_then(|s| s.name.as_deref()) {
			Some(name) => format!("{index}:{name}"),
			None => index.to_string(),
		}
	}

	pub fn validate(&self) -> Result<()> {
		if self.scenes.is_empty() {
			return Err(SequencerError::EmptySceneTable);
		}
		for (index, scene) in self.scenes.iter().enumerate() {
			scene.validate(index)?;
		}
		Ok(())
	}

	/// Absolute start of each scene: the sum of the spans before it
	pub fn start_times(&self) -> Vec<Seconds> {
		let mut starts = Vec::with_capacity(self.scenes.len());
		let mut at = 0.0;
		for scene in &self.scenes {
			starts.push(at);
			at += scene.span();
		}
		starts
	}

	/// Sum of spans over non-terminal scenes. A zero-duration last scene is
	/// terminal and contributes only its start.
	pub fn total_duration(&self) -> Seconds {
		let Some((last, rest)) = self.scenes.split_last() else {
			return 0.0;
		};
		let head: Seconds = rest.iter().map(SceneDescriptor::span).sum();
		if last.duration > 0.0 {
			head + last.span()
		} else {
			head
		}
	}

	/// Compile scenes into boundary marks.
	/// Every scene gets a start mark; scenes with content also get an end mark.
	pub fn compile_timeline(&self) -> Timeline {
		let starts = self.start_times();
		let mut marks = Vec::with_capacity(self.scenes.len() * 2);

		for (index, (scene, &start)) in self.scenes.iter().zip(&starts).enumerate() {
			marks.push(Mark {
				at: start,
				scene: index,
				kind: MarkKind::SceneStart,
			});

			if scene.duration > 0.0 {
				marks.push(Mark {
					at: start + scene.duration,
					scene: index,
					kind: MarkKind::SceneEnd,
				});
			}
		}

		Timeline::new(marks, self.total_duration())
	}
}

/// Host-side settings for driving a sequencer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequencerConfig {
	pub tick_interval_ms: u64,
	pub playback_speed: f64,
	pub autoplay: bool,
}

impl SequencerConfig {
	pub fn new() -> Self {
		Self {
			tick_interval_ms: 16,
			playback_speed: 1.0,
			autoplay: false,
		}
	}

	pub fn with_tick_interval(mut self, ms: u64) -> Self {
		self.tick_interval_ms = ms;
		self
	}

	pub fn with_speed(mut self, speed: f64) -> Self {
		self.playback_speed = speed;
		self
	}

	pub fn with_autoplay(mut self, enable: bool) -> Self {
		self.autoplay = enable;
		self
	}

	pub fn tick_interval(&self) -> Duration {
		Duration::from_millis(self.tick_interval_ms)
	}

	pub fn validate(&self) -> Result<()> {
		if self.tick_interval_ms == 0 {
			return Err(SequencerError::InvalidConfig("tick_interval_ms must be greater than 0".to_string()));
		}
		if !(self.playback_speed.is_finite() && self.playback_speed > 0.0) {
			return Err(SequencerError::InvalidConfig(format!("playback_speed must be positive, got {}", self.playback_speed)));
		}
		Ok(())
	}
}

impl Default for SequencerConfig {
	fn default() -> Self {
		Self::new()
	}
}
