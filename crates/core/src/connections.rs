//! Channel connection manager.
//!
//! Tools connect by posting [`CONNECT_SENTINEL`] from their window together
//! with a transferred port. [`ConnectionManager::connect`] registers which
//! window is expected to do that for a tool; [`ConnectionManager::accept`]
//! receives every candidate message from the platform adapter and builds a
//! channel for the ones that match.
//!
//! # Lifecycle
//!
//! - An expectation stays registered until [`disconnect`](ConnectionManager::disconnect),
//!   so a reloaded tool window reconnects without help
//! - At most one live channel exists per tool; a new connection destroys the old one
//! - A window that never sends the sentinel leaves the expectation inert

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use toolport_protocol::CONNECT_SENTINEL;
use toolport_runtime::{CallObserver, Channel, PortParts, RemoteApi};
use tracing::{debug, trace, warn};

use crate::host_api::{HostApi, HostServices, ToolContext, ToolHooks};
use crate::window::WindowId;

/// A candidate connection message received by the host window.
#[derive(Debug)]
pub struct ConnectRequest {
	/// Window the message came from.
	pub source: WindowId,
	pub data: Value,
	pub port: PortParts,
}

/// Per-connection options.
#[derive(Clone, Default)]
pub struct ConnectOptions {
	/// Name used for the breadcrumb root; defaults to the tool key.
	pub display_name: Option<String>,
	/// Observes every inbound call on the tool's channel.
	pub observer: Option<CallObserver>,
}

impl std::fmt::Debug for ConnectOptions {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConnectOptions")
			.field("display_name", &self.display_name)
			.field("observer", &self.observer.is_some())
			.finish()
	}
}

struct Expectation {
	window: WindowId,
	options: ConnectOptions,
}

/// Owns the channels to all connected tools.
pub struct ConnectionManager {
	services: Arc<dyn HostServices>,
	hooks: Arc<dyn ToolHooks>,
	expected: Mutex<HashMap<String, Expectation>>,
	channels: Mutex<HashMap<String, Arc<Channel>>>,
}

impl ConnectionManager {
	pub fn new(services: Arc<dyn HostServices>, hooks: Arc<dyn ToolHooks>) -> Self {
		Self {
			services,
			hooks,
			expected: Mutex::new(HashMap::new()),
			channels: Mutex::new(HashMap::new()),
		}
	}

	/// Expects `window` to connect as tool `key`, replacing any earlier expectation.
	pub fn connect(&self, key: &str, window: WindowId, options: ConnectOptions) {
		debug!(tool = key, %window, "awaiting connection");
		self.expected
			.lock()
			.insert(key.to_string(), Expectation { window, options });
	}

	/// Handles a candidate connection message.
	///
	/// Returns `true` if it matched an expectation and a channel was created.
	pub fn accept(&self, request: ConnectRequest) -> bool {
		if request.data.as_str() != Some(CONNECT_SENTINEL) {
			trace!(source = %request.source, "ignoring message without connect sentinel");
			return false;
		}

		let matched = self
			.expected
			.lock()
			.iter()
			.find(|(_, expectation)| expectation.window == request.source)
			.map(|(key, expectation)| (key.clone(), expectation.options.clone()));
		let Some((key, options)) = matched else {
			debug!(source = %request.source, "ignoring connection from unexpected window");
			return false;
		};

		let api = HostApi::for_tool(
			Arc::clone(&self.services),
			ToolContext {
				key: key.clone(),
				display_name: options.display_name.unwrap_or_else(|| key.clone()),
				hooks: Arc::clone(&self.hooks),
			},
		);
		let mut builder = Channel::builder(request.port.port, Arc::new(api)).path(key.as_str());
		if let Some(observer) = options.observer {
			builder = builder.observer(observer);
		}
		let channel = match builder.open() {
			Ok(channel) => channel,
			Err(error) => {
				warn!(tool = %key, %error, "failed to open channel");
				return false;
			}
		};

		let previous = self
			.channels
			.lock()
			.insert(key.clone(), Arc::clone(&channel));
		if let Some(previous) = previous {
			debug!(tool = %key, "superseding previous channel");
			previous.destroy();
		}

		channel.spawn(request.port.inbound);
		debug!(tool = %key, source = %request.source, "tool connected");
		self.hooks.connected(&key, channel.remote());
		true
	}

	/// Remote proxy of the tool's live channel.
	pub fn api(&self, key: &str) -> Option<RemoteApi> {
		self.channels
			.lock()
			.get(key)
			.filter(|channel| !channel.is_destroyed())
			.map(|channel| channel.remote())
	}

	/// Drops the expectation and destroys the channel for `key`.
	pub fn disconnect(&self, key: &str) {
		let expected = self.expected.lock().remove(key).is_some();
		let channel = self.channels.lock().remove(key);
		if let Some(channel) = &channel {
			channel.destroy();
		}
		if expected || channel.is_some() {
			debug!(tool = key, "disconnected");
		}
	}

	pub fn is_expecting(&self, key: &str) -> bool {
		self.expected.lock().contains_key(key)
	}

	pub fn is_connected(&self, key: &str) -> bool {
		self.api(key).is_some()
	}
}

impl std::fmt::Debug for ConnectionManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConnectionManager")
			.field("expected", &self.expected.lock().keys().collect::<Vec<_>>())
			.field("channels", &self.channels.lock().keys().collect::<Vec<_>>())
			.finish()
	}
}
