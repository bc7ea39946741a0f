//! Error types for the toolport runtime.

use thiserror::Error;
use toolport_protocol::ErrorPayload;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur on a tool channel.
#[derive(Debug, Error)]
pub enum Error {
	/// The peer's method failed, or a local method reports a failure to the peer.
	#[error("{name}: {message}")]
	Remote {
		/// Error type name (e.g., "Error", "TypeError")
		name: String,
		/// Human-readable error message
		message: String,
		/// Stack trace from the peer (if available)
		stack: Option<String>,
	},

	/// The method was not advertised in the peer's handshake.
	#[error("Method not supported by peer: {0}")]
	UnknownMethod(String),

	/// The channel was destroyed before the call settled.
	#[error("Channel closed")]
	ChannelClosed,

	/// A method received arguments it cannot decode.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// The underlying port rejected a message.
	#[error("Transport error: {0}")]
	Transport(String),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// A plain failure with the generic `Error` name.
	pub fn failed(message: impl Into<String>) -> Self {
		Error::Remote {
			name: "Error".to_string(),
			message: message.into(),
			stack: None,
		}
	}

	/// Rebuilds an error from a `methodthrow` payload.
	pub fn from_payload(payload: ErrorPayload) -> Self {
		Error::Remote {
			name: payload.name.unwrap_or_else(|| "Error".to_string()),
			message: payload.message,
			stack: payload.stack,
		}
	}

	/// Serializes the error for a `methodthrow` message.
	pub fn to_payload(&self) -> ErrorPayload {
		match self {
			Error::Remote {
				name,
				message,
				stack,
			} => ErrorPayload {
				message: message.clone(),
				name: Some(name.clone()),
				stack: stack.clone(),
			},
			Error::UnknownMethod(_) | Error::InvalidArgument(_) => {
				ErrorPayload::new("TypeError", self.to_string())
			}
			_ => ErrorPayload::new("Error", self.to_string()),
		}
	}

	/// Message text without the name prefix for remote errors.
	pub fn message(&self) -> String {
		match self {
			Error::Remote { message, .. } => message.clone(),
			other => other.to_string(),
		}
	}

	/// Returns the error name if this is a Remote error.
	pub fn error_name(&self) -> Option<&str> {
		match self {
			Error::Remote { name, .. } => Some(name),
			_ => None,
		}
	}

	/// Returns the stack trace if this is a Remote error with a stack.
	pub fn stack_trace(&self) -> Option<&str> {
		match self {
			Error::Remote { stack, .. } => stack.as_deref(),
			_ => None,
		}
	}

	pub fn is_channel_closed(&self) -> bool {
		matches!(self, Error::ChannelClosed)
	}
}
