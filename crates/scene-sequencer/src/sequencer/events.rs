use serde::{Deserialize, Serialize};

/// Notifications broadcast by the sequencer. Payloads are plain copies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "camelCase")]
pub enum SequencerEvent {
	/// Entered the scene at this index
	SceneChange(usize),
	Play,
	Pause,
	Resume,
	Restart,
	Skip,
	/// Normalized position in `[0, 1]`
	Progress(f64),
	/// Reached the end; once per full traversal
	Complete,
}

impl SequencerEvent {
	pub fn kind(&self) -> EventKind {
		match self {
			Self::SceneChange(_) => EventKind::SceneChange,
			Self::Play => EventKind::Play,
			Self::Pause => EventKind::Pause,
			Self::Resume => EventKind::Resume,
			Self::Restart => EventKind::Restart,
			Self::Skip => EventKind::Skip,
			Self::Progress(_) => EventKind::Progress,
			Self::Complete => EventKind::Complete,
		}
	}
}

/// Subscription key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
	SceneChange,
	Play,
	Pause,
	Resume,
	Restart,
	Skip,
	Progress,
	Complete,
}

impl EventKind {
	pub const ALL: [EventKind; 8] = [
		EventKind::SceneChange,
		EventKind::Play,
		EventKind::Pause,
		EventKind::Resume,
		EventKind::Restart,
		EventKind::Skip,
		EventKind::Progress,
		EventKind::Complete,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::SceneChange => "sceneChange",
			Self::Play => "play",
			Self::Pause => "pause",
			Self::Resume => "resume",
			Self::Restart => "restart",
			Self::Skip => "skip",
			Self::Progress => "progress",
			Self::Complete => "complete",
		}
	}
}

impl std::fmt::Display for EventKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wire_shape_matches_dom_event_names() {
		let json = serde_json::to_value(SequencerEvent::SceneChange(3)).unwrap();
		assert_eq!(json, serde_json::json!({ "type": "sceneChange", "detail": 3 }));

		let json = serde_json::to_value(SequencerEvent::Complete).unwrap();
		assert_eq!(json, serde_json::json!({ "type": "complete" }));
	}

	#[test]
	fn every_kind_has_a_distinct_name() {
		let mut names: Vec<_> = EventKind::ALL.iter().map(EventKind::as_str).collect();
		names.sort_unstable();
		names.dedup();
		assert_eq!(names.len(), EventKind::ALL.len());
		assert_eq!(SequencerEvent::Progress(0.5).kind().to_string(), "progress");
	}
}
