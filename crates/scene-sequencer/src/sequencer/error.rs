use std::any::Any;
use thiserror::Error;

use super::EventKind;

pub type Result<T> = std::result::Result<T, SequencerError>;

#[derive(Error, Debug)]
pub enum SequencerError {
	#[error("Scene table is empty")]
	EmptySceneTable,

	#[error("Invalid scene {index}: {reason}")]
	InvalidScene { index: usize, reason: String },

	#[error("Scene table parse error: {0}")]
	Parse(#[from] serde_json::Error),

	#[error("Invalid sequencer config: {0}")]
	InvalidConfig(String),

	#[error("Sequencer not initialized, ignoring {operation}")]
	NotInitialized { operation: &'static str },

	#[error("Scene {index} {hook} callback failed: {message}")]
	Callback { index: usize, hook: CallbackHook, message: String },

	#[error("{event} listener failed: {message}")]
	Listener { event: EventKind, message: String },

	#[error("Internal error: {0}")]
	Internal(String),
}

/// Which user hook failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackHook {
	OnStart,
	OnComplete,
}

impl std::fmt::Display for CallbackHook {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::OnStart => write!(f, "on_start"),
			Self::OnComplete => write!(f, "on_complete"),
		}
	}
}

/// Best-effort text of a caught panic
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(msg) = payload.downcast_ref::<&str>() {
		(*msg).to_string()
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		msg.clone()
	} else {
		"panic with non-string payload".to_string()
	}
}
