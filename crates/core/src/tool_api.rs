//! Typed access to the optional methods a tool may expose.

use futures_util::future::BoxFuture;
use serde_json::Value;
use toolport_protocol::methods::tool;
use toolport_runtime::{RemoteApi, Result};

/// Host-side proxy for one connected tool.
///
/// Every method is optional on the tool side; calls to a capability the tool
/// did not advertise report that instead of failing.
#[derive(Debug, Clone)]
pub struct ToolProxy {
	remote: RemoteApi,
}

impl ToolProxy {
	pub fn new(remote: RemoteApi) -> Self {
		Self { remote }
	}

	pub fn remote(&self) -> &RemoteApi {
		&self.remote
	}

	pub fn supports(&self, method: &str) -> bool {
		self.remote.supports(method)
	}

	/// [`None`] when the tool cannot report unsaved changes.
	///
	/// Any truthy answer (`true`, non-zero numbers, non-empty strings, arrays,
	/// objects) counts as unsaved changes.
	pub async fn has_unsaved_changes(&self) -> Result<Option<bool>> {
		if !self.supports(tool::HAS_UNSAVED_CHANGES) {
			return Ok(None);
		}
		let value = self.remote.call(tool::HAS_UNSAVED_CHANGES, Vec::new()).await?;
		Ok(Some(is_truthy(&value)))
	}

	/// Asks the tool to show `path`. Resolves to `false` if it cannot navigate.
	///
	/// The call is posted before this returns, so successive navigations
	/// reach the tool in order.
	pub fn navigate(&self, path: &str) -> BoxFuture<'static, Result<bool>> {
		if !self.supports(tool::NAVIGATE) {
			return Box::pin(async { Ok(false) });
		}
		let call = self
			.remote
			.send(tool::NAVIGATE, vec![Value::String(path.to_string())]);
		Box::pin(async move { call.await.map(|_| true) })
	}

	/// Opaque state blob, or [`None`] if the tool keeps no state.
	pub async fn save_state(&self) -> Result<Option<Value>> {
		if !self.supports(tool::SAVE_STATE) {
			return Ok(None);
		}
		self.remote.call(tool::SAVE_STATE, Vec::new()).await.map(Some)
	}

	pub async fn restore_state(&self, state: Value) -> Result<bool> {
		if !self.supports(tool::RESTORE_STATE) {
			return Ok(false);
		}
		self.remote.call(tool::RESTORE_STATE, vec![state]).await?;
		Ok(true)
	}
}

fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}
