use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::error;

use super::error::{panic_message, SequencerError};
use super::{EventKind, SequencerEvent};

pub type Listener = Arc<dyn Fn(&SequencerEvent) + Send + Sync>;

/// Handle identifying one registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
	next_id: u64,
	listeners: HashMap<EventKind, Vec<(ListenerId, Listener)>>,
}

impl Registry {
	fn register(&mut self, kinds: &[EventKind], listener: Listener) -> ListenerId {
		let id = ListenerId(self.next_id);
		self.next_id += 1;
		for kind in kinds {
			self.listeners.entry(*kind).or_default().push((id, Arc::clone(&listener)));
		}
		id
	}

	fn remove(&mut self, id: ListenerId) -> bool {
		let mut removed = false;
		for entries in self.listeners.values_mut() {
			let before = entries.len();
			entries.retain(|(entry_id, _)| *entry_id != id);
			removed |= entries.len() != before;
		}
		removed
	}
}

/// Typed publish/subscribe keyed by [`EventKind`]
#[derive(Clone, Default)]
pub struct EventEmitter {
	registry: Arc<Mutex<Registry>>,
}

impl EventEmitter {
	pub fn new() -> Self {
		Self::default()
	}

	fn registry(&self) -> MutexGuard<'_, Registry> {
		self.registry.lock().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> Subscription
	where
		F: Fn(&SequencerEvent) + Send + Sync + 'static,
	{
		let id = self.registry().register(&[kind], Arc::new(listener));
		Subscription {
			id,
			registry: Arc::downgrade(&self.registry),
		}
	}

	/// One listener for every event kind; a single unsubscribe removes it everywhere
	pub fn subscribe_all<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&SequencerEvent) + Send + Sync + 'static,
	{
		let id = self.registry().register(&EventKind::ALL, Arc::new(listener));
		Subscription {
			id,
			registry: Arc::downgrade(&self.registry),
		}
	}

	pub fn unsubscribe(&self, id: ListenerId) -> bool {
		self.registry().remove(id)
	}

	/// Remove every listener
	pub fn clear(&self) {
		self.registry().listeners.clear();
	}

	pub fn listener_count(&self, kind: EventKind) -> usize {
		self.registry().listeners.get(&kind).map_or(0, Vec::len)
	}

	/// Deliver to the listeners registered when the call starts. The registry
	/// lock is released before any listener runs, so listeners may subscribe
	/// or unsubscribe. A panicking listener is logged and skipped.
	pub fn emit(&self, event: SequencerEvent) {
		let listeners: Vec<Listener> = match self.registry().listeners.get(&event.kind()) {
			Some(entries) => entries.iter().map(|(_, l)| Arc::clone(l)).collect(),
			None => return,
		};

		for listener in listeners {
			if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener(&event))) {
				let err = SequencerError::Listener {
					event: event.kind(),
					message: panic_message(payload.as_ref()),
				};
				error!(error = %err, "Event listener panicked");
			}
		}
	}
}

impl std::fmt::Debug for EventEmitter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let registry = self.registry();
		let total: usize = registry.listeners.values().map(Vec::len).sum();
		f.debug_struct("EventEmitter").field("listeners", &total).finish()
	}
}

/// Disposer returned by `subscribe`. Dropping it keeps the listener registered.
#[derive(Debug, Clone)]
pub struct Subscription {
	id: ListenerId,
	registry: Weak<Mutex<Registry>>,
}

impl Subscription {
	pub fn id(&self) -> ListenerId {
		self.id
	}

	/// Remove the listener. Returns false if it was already gone or the
	/// emitter no longer exists.
	pub fn unsubscribe(self) -> bool {
		match self.registry.upgrade() {
			Some(registry) => registry.lock().unwrap_or_else(PoisonError::into_inner).remove(self.id),
			None => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn recorder() -> (Arc<Mutex<Vec<SequencerEvent>>>, impl Fn(&SequencerEvent) + Send + Sync + 'static) {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&seen);
		(seen, move |e: &SequencerEvent| sink.lock().unwrap().push(*e))
	}

	#[test]
	fn delivers_only_subscribed_kind() {
		let emitter = EventEmitter::new();
		let (seen, listener) = recorder();
		let _sub = emitter.subscribe(EventKind::SceneChange, listener);

		emitter.emit(SequencerEvent::Play);
		emitter.emit(SequencerEvent::SceneChange(2));

		assert_eq!(*seen.lock().unwrap(), vec![SequencerEvent::SceneChange(2)]);
	}

	#[test]
	fn unsubscribe_stops_delivery() {
		let emitter = EventEmitter::new();
		let (seen, listener) = recorder();
		let sub = emitter.subscribe_all(listener);
		assert_eq!(emitter.listener_count(EventKind::Complete), 1);

		emitter.emit(SequencerEvent::Pause);
		assert!(sub.clone().unsubscribe());
		assert!(!sub.unsubscribe(), "second removal is a no-op");
		emitter.emit(SequencerEvent::Resume);

		assert_eq!(*seen.lock().unwrap(), vec![SequencerEvent::Pause]);
		assert_eq!(emitter.listener_count(EventKind::Complete), 0);
	}

	#[test]
	fn clear_removes_everything() {
		let emitter = EventEmitter::new();
		let (seen, listener) = recorder();
		let _a = emitter.subscribe(EventKind::Play, listener);
		emitter.clear();
		emitter.emit(SequencerEvent::Play);
		assert!(seen.lock().unwrap().is_empty());
	}

	#[test]
	fn panicking_listener_does_not_block_others() {
		let emitter = EventEmitter::new();
		let _bad = emitter.subscribe(EventKind::Skip, |_| panic!("listener exploded"));
		let (seen, listener) = recorder();
		let _good = emitter.subscribe(EventKind::Skip, listener);

		emitter.emit(SequencerEvent::Skip);

		assert_eq!(*seen.lock().unwrap(), vec![SequencerEvent::Skip]);
	}

	#[test]
	fn listener_failure_names_the_event_not_a_scene() {
		let err = SequencerError::Listener {
			event: EventKind::Skip,
			message: "listener exploded".into(),
		};
		assert_eq!(err.to_string(), "skip listener failed: listener exploded");
	}

	#[test]
	fn subscription_outliving_emitter_is_harmless() {
		let emitter = EventEmitter::new();
		let sub = emitter.subscribe(EventKind::Play, |_| {});
		drop(emitter);
		assert!(!sub.unsubscribe());
	}
}
