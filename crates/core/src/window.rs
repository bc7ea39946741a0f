//! Browser window seams.
//!
//! The host never touches browser globals directly; the platform adapter
//! implements these traits over whatever windowing primitive it has.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// Opaque identity of a browsing context, used to match connection requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "window#{}", self.0)
	}
}

/// A window (tab or iframe content window) a tool runs in.
pub trait ToolWindow: Send + Sync {
	fn id(&self) -> WindowId;

	/// Whether the window has been closed, by the user or by [`close`](Self::close).
	fn is_closed(&self) -> bool;

	fn focus(&self);

	fn close(&self);
}

/// Capability to open tool tabs and to bring the host window to front.
pub trait WindowHost: Send + Sync {
	/// Opens `url` in a new browser tab.
	fn open(&self, url: &str) -> Result<Arc<dyn ToolWindow>>;

	fn focus_host(&self);
}
