//! Contracts of the services a presentation page talks to besides the
//! sequencer. Only the interfaces live here; implementations belong to the
//! host application.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque lead payload; its schema is owned by the notification backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeadRecord(pub serde_json::Value);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ack {
	pub delivered_at: DateTime<Utc>,
	pub reference: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
	#[error("Delivery endpoint unreachable: {0}")]
	Unreachable(String),

	#[error("Delivery rejected ({status}): {reason}")]
	Rejected { status: u16, reason: String },

	#[error("Notification service not configured")]
	NotConfigured,
}

/// Outbound delivery. Callers retry and fall back to durable local storage
/// on `DeliveryError`.
#[async_trait]
pub trait NotificationService: Send + Sync {
	async fn send(&self, record: &LeadRecord) -> Result<Ack, DeliveryError>;
}

/// Per-client request budget
pub trait RateLimiter: Send + Sync {
	fn is_allowed(&self, client_key: &str) -> bool;
	fn remaining(&self, client_key: &str) -> u32;
	fn reset_time(&self, client_key: &str) -> DateTime<Utc>;
}

/// Best-effort cleanup of user input. Never fails.
pub trait Sanitizer: Send + Sync {
	fn sanitize(&self, raw: serde_json::Value) -> serde_json::Value;
}

/// Where an asset request points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OriginClass {
	SameOrigin,
	MapTiles,
	ThirdParty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStrategy {
	CacheFirst,
	NetworkFirst,
}

impl OriginClass {
	/// Static assets and map tiles rarely change; everything else prefers fresh data
	pub fn strategy(&self) -> CacheStrategy {
		match self {
			Self::SameOrigin | Self::MapTiles => CacheStrategy::CacheFirst,
			Self::ThirdParty => CacheStrategy::NetworkFirst,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
	pub url: String,
	pub origin: OriginClass,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
	pub status: u16,
	pub body: Vec<u8>,
	pub from_cache: bool,
}

/// Offline asset layer. Successful network responses are persisted.
#[async_trait]
pub trait CacheRouter: Send + Sync {
	async fn route(&self, request: &AssetRequest) -> AssetResponse;
}
