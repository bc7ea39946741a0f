//! Bridge configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default route of the tools overview.
pub const DEFAULT_TOOLS_ROUTE: &str = "/tools";

/// Default interval between liveness checks of tab windows.
pub const DEFAULT_LIVENESS_INTERVAL_MS: u64 = 500;

/// Settings for the connection manager and lifecycle controller.
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
	/// Route of the tools overview; tool routes live beneath it.
	pub tools_route: String,
	/// How often tab windows are checked for having been closed.
	pub liveness_interval_ms: u64,
	/// Language used to pick tool display names.
	pub language: String,
	/// Whether inbound calls from a tab tool bring the host window to front.
	pub focus_host_on_call: bool,
}

impl Default for BridgeConfig {
	fn default() -> Self {
		Self {
			tools_route: DEFAULT_TOOLS_ROUTE.to_string(),
			liveness_interval_ms: DEFAULT_LIVENESS_INTERVAL_MS,
			language: "en".to_string(),
			focus_host_on_call: true,
		}
	}
}

impl BridgeConfig {
	/// Parses and validates a JSON configuration.
	pub fn from_json(json: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		if !self.tools_route.starts_with('/') {
			return Err(Error::Config(format!(
				"toolsRoute must be absolute, got '{}'",
				self.tools_route
			)));
		}
		if self.liveness_interval_ms == 0 {
			return Err(Error::Config(
				"livenessIntervalMs must be greater than zero".to_string(),
			));
		}
		Ok(())
	}

	pub fn liveness_interval(&self) -> Duration {
		Duration::from_millis(self.liveness_interval_ms)
	}

	/// Overview route without a trailing slash.
	pub fn overview_route(&self) -> &str {
		match self.tools_route.trim_end_matches('/') {
			"" => "/",
			route => route,
		}
	}

	/// Route of a tool, with its subpath appended when non-empty.
	pub fn tool_route(&self, key: &str, subpath: &str) -> String {
		let base = self.tools_route.trim_end_matches('/');
		let subpath = subpath.trim_start_matches('/');
		if subpath.is_empty() {
			format!("{base}/{key}")
		} else {
			format!("{base}/{key}/{subpath}")
		}
	}
}
