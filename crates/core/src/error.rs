//! Error types for tool embedding.

use thiserror::Error;

/// Result type alias for toolport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the connection manager and lifecycle controller.
#[derive(Debug, Error)]
pub enum Error {
	/// Channel-level failure (remote error, closed channel, unknown method).
	#[error(transparent)]
	Runtime(#[from] toolport_runtime::Error),

	/// The tool key is not in the loaded tool list.
	#[error("Unknown tool: {0}")]
	UnknownTool(String),

	/// The tool list has not been loaded yet.
	#[error("Tool list not loaded")]
	NotLoaded,

	/// The metadata source failed to deliver the tool list.
	#[error("Failed to load tools: {0}")]
	Catalog(String),

	/// Opening or addressing a browser window failed.
	#[error("Window error: {0}")]
	Window(String),

	/// Invalid bridge configuration.
	#[error("Invalid configuration: {0}")]
	Config(String),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns the underlying channel error, if any.
	pub fn as_runtime(&self) -> Option<&toolport_runtime::Error> {
		match self {
			Error::Runtime(err) => Some(err),
			_ => None,
		}
	}
}
