//! Per-channel table of outstanding calls.
//!
//! Each outgoing `methodcall` registers a oneshot sender under its call id.
//! The matching `methodreturn`/`methodthrow` removes the entry and settles
//! the caller. Closing the table drops every sender, so the callers observe
//! [`Error::ChannelClosed`], and refuses entries registered afterwards.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use toolport_protocol::CallId;

use crate::error::{Error, Result};

type Settlement = oneshot::Sender<Result<Value>>;

#[derive(Default)]
struct Table {
	entries: HashMap<CallId, Settlement>,
	closed: bool,
}

/// Pending calls keyed by call id.
#[derive(Clone, Default)]
pub(crate) struct PendingCalls {
	inner: Arc<Mutex<Table>>,
}

impl PendingCalls {
	/// Registers `id` and returns the future that settles with its outcome.
	///
	/// Fails with [`Error::ChannelClosed`] once the table is closed.
	pub(crate) fn register(&self, id: CallId) -> Result<PendingCall> {
		let (tx, rx) = oneshot::channel();
		{
			let mut table = self.inner.lock();
			if table.closed {
				return Err(Error::ChannelClosed);
			}
			table.entries.insert(id.clone(), tx);
		}
		Ok(PendingCall {
			rx,
			guard: CallGuard {
				id,
				calls: self.clone(),
				completed: false,
			},
		})
	}

	/// Settles and removes the call. Returns `false` for unknown ids.
	pub(crate) fn settle(&self, id: &CallId, result: Result<Value>) -> bool {
		let entry = self.inner.lock().entries.remove(id);
		match entry {
			Some(tx) => {
				let _ = tx.send(result);
				true
			}
			None => false,
		}
	}

	/// Drops every pending entry, refuses new ones, and returns how many
	/// were dropped.
	pub(crate) fn close(&self) -> usize {
		let drained: Vec<_> = {
			let mut table = self.inner.lock();
			table.closed = true;
			table.entries.drain().collect()
		};
		drained.len()
	}

	pub(crate) fn len(&self) -> usize {
		self.inner.lock().entries.len()
	}

	fn forget(&self, id: &CallId) -> bool {
		self.inner.lock().entries.remove(id).is_some()
	}
}

/// RAII guard removing the entry when the caller stops waiting.
struct CallGuard {
	id: CallId,
	calls: PendingCalls,
	completed: bool,
}

impl Drop for CallGuard {
	fn drop(&mut self) {
		if !self.completed && self.calls.forget(&self.id) {
			tracing::debug!(callid = %self.id, "removed abandoned call");
		}
	}
}

/// Future returned for an outgoing call.
pub(crate) struct PendingCall {
	rx: oneshot::Receiver<Result<Value>>,
	guard: CallGuard,
}

impl PendingCall {
	pub(crate) fn id(&self) -> &CallId {
		&self.guard.id
	}
}

impl Future for PendingCall {
	type Output = Result<Value>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.completed = true;
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}
