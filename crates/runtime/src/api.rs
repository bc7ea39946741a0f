//! Local and remote method surfaces of a channel.
//!
//! - [`ExposedApi`] - what this side answers; its descriptor list is the handshake
//! - [`MethodTable`] - an [`ExposedApi`] assembled from async closures
//! - [`RemoteApi`] - proxy for the peer, populated from the peer's handshake
//! - [`Args`] - positional argument decoding for method implementations

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};

use futures_util::future::BoxFuture;
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use toolport_protocol::MethodDescriptor;

use crate::channel::Channel;
use crate::error::{Error, Result};

/// Future returned by [`ExposedApi::invoke`].
pub type InvokeFuture = BoxFuture<'static, Result<Value>>;

/// A set of methods one side makes callable by its peer.
pub trait ExposedApi: Send + Sync {
	/// Methods advertised in the handshake. Only these are ever invoked.
	fn methods(&self) -> &[MethodDescriptor];

	/// Invokes `name` with positional arguments.
	fn invoke(&self, name: &str, args: Vec<Value>) -> InvokeFuture;

	fn exposes(&self, name: &str) -> bool {
		self.methods().iter().any(|m| m.name() == name)
	}
}

type Handler = Arc<dyn Fn(Vec<Value>) -> InvokeFuture + Send + Sync>;

/// [`ExposedApi`] built from named async closures.
///
/// ```ignore
/// let api = MethodTable::new()
///     .method("hasUnsavedChanges", |_| async { Ok(json!(false)) })
///     .method("navigate", |args| async move { ... });
/// ```
#[derive(Clone, Default)]
pub struct MethodTable {
	descriptors: Vec<MethodDescriptor>,
	handlers: HashMap<String, Handler>,
}

impl MethodTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds (or replaces) a method.
	pub fn method<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
	where
		F: Fn(Args) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<Value>> + Send + 'static,
	{
		let name = name.into();
		if !self.handlers.contains_key(&name) {
			self.descriptors.push(MethodDescriptor {
				name: name.clone().into(),
				returns: Default::default(),
			});
		}
		let handler: Handler = Arc::new(move |args| Box::pin(handler(Args::new(args))));
		self.handlers.insert(name, handler);
		self
	}
}

impl ExposedApi for MethodTable {
	fn methods(&self) -> &[MethodDescriptor] {
		&self.descriptors
	}

	fn invoke(&self, name: &str, args: Vec<Value>) -> InvokeFuture {
		match self.handlers.get(name) {
			Some(handler) => handler(args),
			None => {
				let name = name.to_string();
				Box::pin(async move { Err(Error::UnknownMethod(name)) })
			}
		}
	}
}

impl fmt::Debug for MethodTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MethodTable")
			.field("methods", &self.descriptors)
			.finish()
	}
}

/// Positional arguments of an inbound call.
#[derive(Debug, Clone, Default)]
pub struct Args(Vec<Value>);

impl Args {
	pub fn new(values: Vec<Value>) -> Self {
		Self(values)
	}

	/// Decodes argument `index`; missing or `null` is an error.
	pub fn required<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T> {
		match self.0.get(index) {
			None | Some(Value::Null) => Err(Error::InvalidArgument(format!(
				"missing argument {index} ({name})"
			))),
			Some(value) => decode(value, index, name),
		}
	}

	/// Decodes argument `index`; missing or `null` yields [`None`].
	pub fn optional<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<Option<T>> {
		match self.0.get(index) {
			None | Some(Value::Null) => Ok(None),
			Some(value) => decode(value, index, name).map(Some),
		}
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn into_inner(self) -> Vec<Value> {
		self.0
	}
}

fn decode<T: DeserializeOwned>(value: &Value, index: usize, name: &str) -> Result<T> {
	T::deserialize(value)
		.map_err(|e| Error::InvalidArgument(format!("argument {index} ({name}): {e}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
	AwaitingHandshake,
	Ready,
	Closed,
}

struct RemoteInner {
	channel: Weak<Channel>,
	methods: RwLock<Vec<MethodDescriptor>>,
	readiness: watch::Sender<Readiness>,
}

/// Proxy for the methods the peer advertised.
///
/// Starts empty; the peer's handshake fills it. Calls to names the peer did
/// not advertise fail with [`Error::UnknownMethod`] without touching the port.
#[derive(Clone)]
pub struct RemoteApi {
	inner: Arc<RemoteInner>,
}

impl RemoteApi {
	pub(crate) fn new(channel: Weak<Channel>) -> Self {
		let (readiness, _) = watch::channel(Readiness::AwaitingHandshake);
		Self {
			inner: Arc::new(RemoteInner {
				channel,
				methods: RwLock::new(Vec::new()),
				readiness,
			}),
		}
	}

	/// Replaces the callable set with the peer's advertisement.
	pub(crate) fn install(&self, methods: Vec<MethodDescriptor>) {
		*self.inner.methods.write() = methods;
		self.inner.readiness.send_if_modified(|state| {
			if *state == Readiness::AwaitingHandshake {
				*state = Readiness::Ready;
				true
			} else {
				false
			}
		});
	}

	pub(crate) fn mark_closed(&self) {
		self.inner.readiness.send_replace(Readiness::Closed);
	}

	/// Whether the peer advertised `name`.
	pub fn supports(&self, name: &str) -> bool {
		self.inner.methods.read().iter().any(|m| m.name() == name)
	}

	/// Names of every advertised method.
	pub fn method_names(&self) -> BTreeSet<String> {
		self.inner
			.methods
			.read()
			.iter()
			.map(|m| m.name().to_string())
			.collect()
	}

	/// Whether the peer's handshake has arrived and the channel is alive.
	pub fn is_ready(&self) -> bool {
		*self.inner.readiness.borrow() == Readiness::Ready
	}

	/// Waits for the peer's handshake.
	///
	/// Fails with [`Error::ChannelClosed`] if the channel is destroyed first.
	pub async fn ready(&self) -> Result<()> {
		let mut rx = self.inner.readiness.subscribe();
		let state = rx
			.wait_for(|state| *state != Readiness::AwaitingHandshake)
			.await
			.map_err(|_| Error::ChannelClosed)?;
		match *state {
			Readiness::Ready => Ok(()),
			_ => Err(Error::ChannelClosed),
		}
	}

	/// Calls an advertised method and waits for its settlement.
	pub async fn call(&self, name: &str, args: Vec<Value>) -> Result<Value> {
		self.send(name, args).await
	}

	/// Posts the call before returning; the future only awaits settlement.
	///
	/// Calls sent one after another reach the peer in that order, whichever
	/// tasks end up awaiting them.
	pub fn send(&self, name: &str, args: Vec<Value>) -> BoxFuture<'static, Result<Value>> {
		let started = if self.supports(name) {
			self.inner
				.channel
				.upgrade()
				.ok_or(Error::ChannelClosed)
				.and_then(|channel| channel.start_call(name, args))
		} else {
			Err(Error::UnknownMethod(name.to_string()))
		};
		match started {
			Ok(pending) => Box::pin(pending),
			Err(error) => Box::pin(futures_util::future::ready(Err(error))),
		}
	}

	/// Calls a method with serializable arguments and decodes the result.
	pub async fn call_as<R: DeserializeOwned>(
		&self,
		name: &str,
		args: impl IntoIterator<Item = impl Serialize>,
	) -> Result<R> {
		let args = args
			.into_iter()
			.map(serde_json::to_value)
			.collect::<serde_json::Result<Vec<_>>>()?;
		let value = self.call(name, args).await?;
		serde_json::from_value(value).map_err(Into::into)
	}
}

impl fmt::Debug for RemoteApi {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RemoteApi")
			.field("methods", &self.method_names())
			.field("ready", &self.is_ready())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[tokio::test]
	async fn method_table_dispatches_by_name() {
		let table = MethodTable::new()
			.method("add", |args: Args| async move {
				let a: i64 = args.required(0, "a")?;
				let b: i64 = args.required(1, "b")?;
				Ok(json!(a + b))
			})
			.method("noop", |_| async { Ok(Value::Null) });

		assert!(table.exposes("add"));
		assert_eq!(table.methods().len(), 2);
		assert_eq!(
			table.invoke("add", vec![json!(2), json!(3)]).await.unwrap(),
			json!(5)
		);
		assert!(matches!(
			table.invoke("missing", vec![]).await,
			Err(Error::UnknownMethod(_))
		));
	}

	#[test]
	fn redefining_a_method_keeps_one_descriptor() {
		let table = MethodTable::new()
			.method("x", |_| async { Ok(json!(1)) })
			.method("x", |_| async { Ok(json!(2)) });
		assert_eq!(table.methods().len(), 1);
	}

	#[test]
	fn args_decode_optional_and_required() {
		let args = Args::new(vec![json!("a/b"), Value::Null]);
		assert_eq!(args.required::<String>(0, "path").unwrap(), "a/b");
		assert_eq!(args.optional::<bool>(1, "replace").unwrap(), None);
		assert_eq!(args.optional::<bool>(5, "other").unwrap(), None);
		assert!(matches!(
			args.required::<u64>(0, "id"),
			Err(Error::InvalidArgument(_))
		));
		assert!(matches!(
			args.required::<u64>(1, "id"),
			Err(Error::InvalidArgument(_))
		));
	}

	#[tokio::test]
	async fn unadvertised_call_fails_before_sending() {
		let remote = RemoteApi::new(Weak::new());
		let err = remote.call("navigate", vec![]).await.unwrap_err();
		assert!(matches!(err, Error::UnknownMethod(name) if name == "navigate"));
	}

	#[tokio::test]
	async fn ready_fails_once_closed() {
		let remote = RemoteApi::new(Weak::new());
		remote.mark_closed();
		assert!(remote.ready().await.unwrap_err().is_channel_closed());
		assert!(!remote.is_ready());
	}
}
