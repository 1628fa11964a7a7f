use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::Seconds;

/// Source of frame time, in seconds since an arbitrary origin
pub trait Clock: Send {
	fn now(&self) -> Seconds;
}

/// Monotonic wall clock
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
	origin: Instant,
}

impl SystemClock {
	pub fn new() -> Self {
		Self { origin: Instant::now() }
	}
}

impl Default for SystemClock {
	fn default() -> Self {
		Self::new()
	}
}

impl Clock for SystemClock {
	fn now(&self) -> Seconds {
		self.origin.elapsed().as_secs_f64()
	}
}

/// Deterministic clock advanced by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
	nanos: Arc<AtomicU64>,
}

impl ManualClock {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn advance(&self, secs: Seconds) {
		self.nanos.fetch_add(to_nanos(secs), Ordering::SeqCst);
	}

	pub fn set(&self, secs: Seconds) {
		self.nanos.store(to_nanos(secs), Ordering::SeqCst);
	}
}

impl Clock for ManualClock {
	fn now(&self) -> Seconds {
		self.nanos.load(Ordering::SeqCst) as f64 / 1e9
	}
}

fn to_nanos(secs: Seconds) -> u64 {
	if secs.is_finite() && secs > 0.0 {
		(secs * 1e9).round() as u64
	} else {
		0
	}
}
