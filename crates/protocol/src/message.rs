//! Message envelopes exchanged over a tool channel.
//!
//! Every message carries a `type` discriminator. A channel sends exactly one
//! [`Handshake`] right after it is created; everything after that is method
//! calls and their settlements, correlated by [`CallId`].
//!
//! ```text
//! host                               tool
//!  │── handshake {supportedMethods} ──▶│
//!  │◀── handshake {supportedMethods} ──│
//!  │◀── methodcall {callid, name} ─────│
//!  │─── methodreturn {callid, value} ─▶│
//! ```

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload a tool window posts, together with a transferable port, to open a channel.
pub const CONNECT_SENTINEL: &str = "toolport:connect";

/// Message exchanged over a tool channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
	/// Capability announcement, sent once per channel.
	Handshake(Handshake),
	/// Request to invoke a method on the peer.
	MethodCall(MethodCall),
	/// Successful settlement of a [`MethodCall`].
	MethodReturn(MethodReturn),
	/// Failed settlement of a [`MethodCall`].
	MethodThrow(MethodThrow),
}

impl Message {
	/// Decodes an inbound value, returning [`None`] for anything that is not
	/// one of the four known shapes.
	pub fn parse(value: Value) -> Option<Self> {
		serde_json::from_value(value).ok()
	}

	/// Encodes the message as a JSON value ready to be posted.
	pub fn to_value(&self) -> serde_json::Result<Value> {
		serde_json::to_value(self)
	}

	/// Call id carried by call and settlement messages.
	pub fn call_id(&self) -> Option<&CallId> {
		match self {
			Message::Handshake(_) => None,
			Message::MethodCall(call) => Some(&call.callid),
			Message::MethodReturn(ret) => Some(&ret.callid),
			Message::MethodThrow(throw) => Some(&throw.callid),
		}
	}
}

/// The set of methods one side exposes to the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
	/// Label of the sending side (the tool key on the host side).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,
	/// Methods the sender is willing to answer.
	#[serde(default)]
	pub supported_methods: Vec<MethodDescriptor>,
}

/// A single advertised method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodDescriptor {
	pub name: Cow<'static, str>,
	#[serde(default)]
	pub returns: ReturnShape,
}

impl MethodDescriptor {
	/// Descriptor for a method that settles asynchronously.
	pub const fn promise(name: &'static str) -> Self {
		Self {
			name: Cow::Borrowed(name),
			returns: ReturnShape::Promise,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}
}

/// Declared return shape of an advertised method.
///
/// Every method call settles asynchronously, so there is a single variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnShape {
	#[default]
	Promise,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
	pub callid: CallId,
	pub name: String,
	#[serde(default)]
	pub args: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodReturn {
	pub callid: CallId,
	#[serde(default)]
	pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodThrow {
	pub callid: CallId,
	pub error: ErrorPayload,
}

/// Serialized form of an error raised by the callee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
	#[serde(default)]
	pub message: String,
	/// Error type name (e.g. `"Error"`, `"TypeError"`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub stack: Option<String>,
}

impl ErrorPayload {
	pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			name: Some(name.into()),
			stack: None,
		}
	}
}

/// Opaque token pairing a [`MethodCall`] with its settlement.
///
/// Ids only need to be unique among the outstanding calls of one channel.
/// Nothing guards against collisions, so they are built from two
/// independent random 64-bit fragments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
	pub fn generate() -> Self {
		let (high, low): (u64, u64) = (rand::random(), rand::random());
		Self(format!("{high:016x}{low:016x}"))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for CallId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

impl From<String> for CallId {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl fmt::Display for CallId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
