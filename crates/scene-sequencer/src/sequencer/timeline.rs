use super::Seconds;

/// What happens when the playhead crosses a mark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
	/// Enter the scene: update the current index, emit, run `on_start`
	SceneStart,
	/// Scene content finished: run `on_complete`
	SceneEnd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mark {
	pub at: Seconds,
	pub scene: usize,
	pub kind: MarkKind,
}

/// An immutable, sorted list of boundary marks
#[derive(Debug, Clone)]
pub struct Timeline {
	marks: Box<[Mark]>,
	start_marks: Box<[usize]>,
	total_duration: Seconds,
}

impl Timeline {
	/// Create a new timeline from marks (stable-sorted by time, so equal
	/// times keep construction order)
	pub fn new(mut marks: Vec<Mark>, total_duration: Seconds) -> Self {
		marks.sort_by(|a, b| a.at.total_cmp(&b.at));

		let scene_count = marks.iter().map(|m| m.scene + 1).max().unwrap_or(0);
		let mut start_marks = vec![0; scene_count];
		for (position, mark) in marks.iter().enumerate() {
			if mark.kind == MarkKind::SceneStart {
				start_marks[mark.scene] = position;
			}
		}

		Self {
			marks: marks.into_boxed_slice(),
			start_marks: start_marks.into_boxed_slice(),
			total_duration,
		}
	}

	pub fn total_duration(&self) -> Seconds {
		self.total_duration
	}

	pub fn is_empty(&self) -> bool {
		self.marks.is_empty()
	}

	pub fn len(&self) -> usize {
		self.marks.len()
	}

	pub fn marks(&self) -> &[Mark] {
		&self.marks
	}

	pub fn scene_count(&self) -> usize {
		self.start_marks.len()
	}

	/// Position of the scene's start mark in [`Self::marks`]
	pub fn start_mark(&self, scene: usize) -> Option<usize> {
		self.start_marks.get(scene).copied()
	}

	pub fn scene_start(&self, scene: usize) -> Option<Seconds> {
		self.start_mark(scene).map(|i| self.marks[i].at)
	}
}

/// Tracks which marks have already fired
#[derive(Debug, Clone, Default)]
pub struct MarkCursor {
	frontier: usize,
}

impl MarkCursor {
	pub fn new() -> Self {
		Self { frontier: 0 }
	}

	pub fn reset(&mut self) {
		self.frontier = 0;
	}

	pub fn applied_frontier(&self) -> usize {
		self.frontier
	}

	/// Treat every mark before `position` as fired and re-arm the rest
	pub fn seek(&mut self, timeline: &Timeline, position: usize) {
		self.frontier = position.min(timeline.len());
	}

	/// Treat every mark as fired
	pub fn exhaust(&mut self, timeline: &Timeline) {
		self.frontier = timeline.len();
	}

	/// Apply marks up to (and including) the given time.
	/// Each mark fires once per pass; a wide step fires every mark it spans, in order.
	pub fn apply_until<F>(&mut self, timeline: &Timeline, time: Seconds, mut on_mark: F)
	where
		F: FnMut(&Mark),
	{
		let marks = timeline.marks();

		while self.frontier < marks.len() {
			let mark = &marks[self.frontier];

			if mark.at > time {
				break;
			}

			self.frontier += 1;
			on_mark(mark);
		}
	}
}
