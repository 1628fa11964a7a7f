use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::collaborators::{CacheRouter, NotificationService, RateLimiter, Sanitizer};
use crate::sequencer::{Result, SceneSequencer, SceneTable, SequencerConfig, SequencerDriver};

/// Process-wide state of a presentation page.
///
/// Owns the running sequencer and shared handles to the services around it.
/// Build one per process with [`AppContext::new`], pass it by reference, and
/// call [`AppContext::shutdown`] before exit.
pub struct AppContext {
	driver: SequencerDriver,
	notifications: Option<Arc<dyn NotificationService>>,
	rate_limiter: Option<Arc<dyn RateLimiter>>,
	sanitizer: Option<Arc<dyn Sanitizer>>,
	cache: Option<Arc<dyn CacheRouter>>,
}

impl AppContext {
	/// Start a sequencer over `scenes` on the system clock. Requires a tokio runtime.
	pub fn new(scenes: SceneTable, config: SequencerConfig) -> Result<Self> {
		Self::with_sequencer(SceneSequencer::with_system_clock(scenes), config)
	}

	pub fn with_sequencer(sequencer: SceneSequencer, config: SequencerConfig) -> Result<Self> {
		let driver = SequencerDriver::spawn(sequencer, config)?;
		info!("AppContext ready");
		Ok(Self {
			driver,
			notifications: None,
			rate_limiter: None,
			sanitizer: None,
			cache: None,
		})
	}

	pub fn with_notifications(mut self, service: Arc<dyn NotificationService>) -> Self {
		self.notifications = Some(service);
		self
	}

	pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
		self.rate_limiter = Some(limiter);
		self
	}

	pub fn with_sanitizer(mut self, sanitizer: Arc<dyn Sanitizer>) -> Self {
		self.sanitizer = Some(sanitizer);
		self
	}

	pub fn with_cache(mut self, cache: Arc<dyn CacheRouter>) -> Self {
		self.cache = Some(cache);
		self
	}

	pub fn sequencer(&self) -> &SequencerDriver {
		&self.driver
	}

	pub fn notifications(&self) -> Option<&Arc<dyn NotificationService>> {
		self.notifications.as_ref()
	}

	pub fn rate_limiter(&self) -> Option<&Arc<dyn RateLimiter>> {
		self.rate_limiter.as_ref()
	}

	pub fn sanitizer(&self) -> Option<&Arc<dyn Sanitizer>> {
		self.sanitizer.as_ref()
	}

	pub fn cache(&self) -> Option<&Arc<dyn CacheRouter>> {
		self.cache.as_ref()
	}

	/// Stop the driver task. The sequencer is destroyed and its listeners dropped.
	pub async fn shutdown(&self) {
		self.driver.shutdown().await;
		info!("AppContext shut down");
	}
}

impl fmt::Debug for AppContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AppContext")
			.field("state", &self.driver.current_state())
			.field("notifications", &self.notifications.is_some())
			.field("rate_limiter", &self.rate_limiter.is_some())
			.field("sanitizer", &self.sanitizer.is_some())
			.field("cache", &self.cache.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::collaborators::{Ack, DeliveryError, LeadRecord};
	use crate::sequencer::ManualClock;
	use async_trait::async_trait;
	use chrono::{DateTime, Utc};
	use serde_json::json;

	struct TrimSanitizer;

	impl Sanitizer for TrimSanitizer {
		fn sanitize(&self, raw: serde_json::Value) -> serde_json::Value {
			match raw {
				serde_json::Value::String(s) => serde_json::Value::String(s.trim().to_owned()),
				other => other,
			}
		}
	}

	struct Unlimited;

	impl RateLimiter for Unlimited {
		fn is_allowed(&self, _client_key: &str) -> bool {
			true
		}
		fn remaining(&self, _client_key: &str) -> u32 {
			u32::MAX
		}
		fn reset_time(&self, _client_key: &str) -> DateTime<Utc> {
			DateTime::<Utc>::UNIX_EPOCH
		}
	}

	struct Offline;

	#[async_trait]
	impl NotificationService for Offline {
		async fn send(&self, _record: &LeadRecord) -> std::result::Result<Ack, DeliveryError> {
			Err(DeliveryError::Unreachable("offline".into()))
		}
	}

	fn context() -> AppContext {
		let sequencer = SceneSequencer::new(SceneTable::default_presentation(), ManualClock::new());
		AppContext::with_sequencer(sequencer, SequencerConfig::default()).unwrap()
	}

	#[tokio::test]
	async fn collaborators_are_reachable_through_the_context() {
		let ctx = context()
			.with_sanitizer(Arc::new(TrimSanitizer))
			.with_rate_limiter(Arc::new(Unlimited))
			.with_notifications(Arc::new(Offline));

		let sanitizer = ctx.sanitizer().unwrap();
		assert_eq!(sanitizer.sanitize(json!("  hi ")), json!("hi"));
		assert!(ctx.rate_limiter().unwrap().is_allowed("client"));
		assert!(ctx.cache().is_none());

		let sent = ctx.notifications().unwrap().send(&LeadRecord(json!({"email": "a@b.c"}))).await;
		assert_eq!(sent, Err(DeliveryError::Unreachable("offline".into())));

		ctx.shutdown().await;
	}

	#[tokio::test]
	async fn shutdown_tears_down_the_sequencer() {
		let ctx = context();
		assert!(ctx.sequencer().current_state().initialized);

		ctx.shutdown().await;
		assert!(!ctx.sequencer().current_state().initialized);
		// commands after shutdown find no task
		assert!(ctx.sequencer().play().is_err());
	}
}
