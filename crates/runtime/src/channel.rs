//! Channel - RPC wrapper around one message port.
//!
//! A channel binds a port to a local [`ExposedApi`] and a [`RemoteApi`] for
//! the peer. It handles:
//! - Sending the handshake as soon as it is opened
//! - Installing the peer's advertised methods on the remote proxy
//! - Answering inbound method calls, started in arrival order
//! - Correlating returns and throws with outstanding outbound calls
//!
//! # Message Flow
//!
//! 1. Caller invokes [`RemoteApi::call`] with an advertised method name
//! 2. Channel generates a call id and registers a pending entry
//! 3. `methodcall` is posted to the port before the call future is returned
//! 4. The pump receives `methodreturn`/`methodthrow` with the same id
//! 5. The pending entry is removed and the caller's future settles
//!
//! # Ordering
//!
//! Inbound calls are polled once on the pump, in the order they arrived, and
//! only the remainder of a call that does not finish at once moves to its own
//! task. Everything a method does before its first suspension point therefore
//! happens in message order. Outbound calls are posted synchronously by
//! [`RemoteApi::send`], so calls sent one after another reach the peer in
//! that order.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::FutureExt;
use serde_json::Value;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use toolport_protocol::{CallId, Handshake, Message, MethodCall, MethodReturn, MethodThrow};
use tracing::{debug, trace, warn};

use crate::api::{ExposedApi, RemoteApi};
use crate::calls::{PendingCall, PendingCalls};
use crate::error::{Error, Result};
use crate::port::{Inbound, MessagePort};

/// Hook invoked with the method name of every inbound call, before dispatch.
pub type CallObserver = Arc<dyn Fn(&str) + Send + Sync>;

/// Builder for [`Channel`].
pub struct ChannelBuilder {
	port: Arc<dyn MessagePort>,
	local: Arc<dyn ExposedApi>,
	path: Option<String>,
	observer: Option<CallObserver>,
}

impl ChannelBuilder {
	/// Label sent as the handshake `path`.
	pub fn path(mut self, path: impl Into<String>) -> Self {
		self.path = Some(path.into());
		self
	}

	/// Observes every inbound call before it is dispatched.
	pub fn observer(mut self, observer: CallObserver) -> Self {
		self.observer = Some(observer);
		self
	}

	/// Creates the channel and posts its handshake.
	pub fn open(self) -> Result<Arc<Channel>> {
		let channel = Arc::new_cyclic(|weak| Channel {
			path: self.path,
			port: self.port,
			local: self.local,
			calls: PendingCalls::default(),
			remote: RemoteApi::new(weak.clone()),
			observer: self.observer,
			destroyed: AtomicBool::new(false),
			shutdown: Notify::new(),
		});

		let handshake = Message::Handshake(Handshake {
			path: channel.path.clone(),
			supported_methods: channel.local.methods().to_vec(),
		});
		channel.post(&handshake)?;
		debug!(
			path = channel.path.as_deref().unwrap_or(""),
			methods = channel.local.methods().len(),
			"channel opened"
		);

		Ok(channel)
	}
}

/// Two-way RPC channel bound to one port.
pub struct Channel {
	path: Option<String>,
	port: Arc<dyn MessagePort>,
	local: Arc<dyn ExposedApi>,
	calls: PendingCalls,
	remote: RemoteApi,
	observer: Option<CallObserver>,
	destroyed: AtomicBool,
	shutdown: Notify,
}

impl Channel {
	pub fn builder(port: Arc<dyn MessagePort>, local: Arc<dyn ExposedApi>) -> ChannelBuilder {
		ChannelBuilder {
			port,
			local,
			path: None,
			observer: None,
		}
	}

	/// Opens a channel with default options.
	pub fn open(port: Arc<dyn MessagePort>, local: Arc<dyn ExposedApi>) -> Result<Arc<Self>> {
		Self::builder(port, local).open()
	}

	pub fn path(&self) -> Option<&str> {
		self.path.as_deref()
	}

	/// Proxy for the peer's advertised methods.
	pub fn remote(&self) -> RemoteApi {
		self.remote.clone()
	}

	/// Number of outbound calls still awaiting settlement.
	pub fn pending_calls(&self) -> usize {
		self.calls.len()
	}

	pub fn is_destroyed(&self) -> bool {
		self.destroyed.load(Ordering::SeqCst)
	}

	/// Spawns [`run`](Self::run) on the current runtime.
	pub fn spawn(self: &Arc<Self>, inbound: Inbound) -> JoinHandle<()> {
		tokio::spawn(Arc::clone(self).run(inbound))
	}

	/// Pumps inbound messages until the port closes or the channel is destroyed.
	///
	/// A closed port destroys the channel.
	pub async fn run(self: Arc<Self>, mut inbound: Inbound) {
		loop {
			tokio::select! {
				biased;
				_ = self.shutdown.notified() => break,
				message = inbound.recv() => match message {
					Some(value) => self.handle_message(value),
					None => {
						debug!(path = self.path.as_deref().unwrap_or(""), "port closed by peer");
						break;
					}
				},
			}
		}
		self.destroy();
	}

	/// Dispatches one inbound message.
	pub fn handle_message(self: &Arc<Self>, value: Value) {
		if self.is_destroyed() {
			return;
		}

		let Some(message) = Message::parse(value) else {
			trace!(path = self.path.as_deref().unwrap_or(""), "ignoring unrecognized message");
			return;
		};

		match message {
			Message::Handshake(handshake) => {
				debug!(
					path = self.path.as_deref().unwrap_or(""),
					peer = handshake.path.as_deref().unwrap_or(""),
					methods = handshake.supported_methods.len(),
					"received handshake"
				);
				self.remote.install(handshake.supported_methods);
			}
			Message::MethodCall(call) => {
				if let Some(observer) = &self.observer {
					observer(&call.name);
				}
				let channel = Arc::clone(self);
				let mut answer = Box::pin(async move { channel.answer(call).await });
				if (&mut answer).now_or_never().is_none() {
					tokio::spawn(answer);
				}
			}
			Message::MethodReturn(ret) => {
				self.settle(&ret.callid, Ok(ret.value));
			}
			Message::MethodThrow(throw) => {
				self.settle(&throw.callid, Err(Error::from_payload(throw.error)));
			}
		}
	}

	/// Detaches from the port and abandons outstanding calls.
	///
	/// Pending callers settle with [`Error::ChannelClosed`]. Idempotent.
	pub fn destroy(&self) {
		if self.destroyed.swap(true, Ordering::SeqCst) {
			return;
		}
		self.shutdown.notify_one();
		let abandoned = self.calls.close();
		self.remote.mark_closed();
		self.port.close();
		debug!(
			path = self.path.as_deref().unwrap_or(""),
			abandoned, "channel destroyed"
		);
	}

	/// Posts a `methodcall` and returns the future of its settlement.
	pub(crate) fn start_call(&self, name: &str, args: Vec<Value>) -> Result<PendingCall> {
		if self.is_destroyed() {
			return Err(Error::ChannelClosed);
		}

		let pending = self.calls.register(CallId::generate())?;
		let call = Message::MethodCall(MethodCall {
			callid: pending.id().clone(),
			name: name.to_string(),
			args,
		});
		trace!(callid = %pending.id(), method = name, "sending call");
		self.post(&call)?;

		Ok(pending)
	}

	async fn answer(&self, call: MethodCall) {
		let MethodCall { callid, name, args } = call;
		trace!(%callid, method = %name, "answering call");

		let outcome = if self.local.exposes(&name) {
			AssertUnwindSafe(self.local.invoke(&name, args))
				.catch_unwind()
				.await
				.unwrap_or_else(|_| Err(Error::failed(format!("{name} panicked"))))
		} else {
			Err(Error::UnknownMethod(name.clone()))
		};

		if self.is_destroyed() {
			debug!(%callid, method = %name, "dropping answer for destroyed channel");
			return;
		}

		let reply = match outcome {
			Ok(value) => Message::MethodReturn(MethodReturn { callid, value }),
			Err(error) => {
				debug!(method = %name, %error, "call failed");
				Message::MethodThrow(MethodThrow {
					callid,
					error: error.to_payload(),
				})
			}
		};

		if let Err(error) = self.post(&reply) {
			warn!(method = %name, %error, "failed to post answer");
		}
	}

	fn settle(&self, callid: &CallId, result: Result<Value>) {
		if !self.calls.settle(callid, result) {
			trace!(%callid, "no pending call for settlement (ignored)");
		}
	}

	fn post(&self, message: &Message) -> Result<()> {
		self.port.post_message(message.to_value()?)
	}
}

impl fmt::Debug for Channel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Channel")
			.field("path", &self.path)
			.field("pending_calls", &self.calls.len())
			.field("destroyed", &self.is_destroyed())
			.finish()
	}
}
