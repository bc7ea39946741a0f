//! Wire types for the toolport embedding protocol.
//!
//! Host and tool talk over a dedicated message port using four JSON message
//! shapes (see [`Message`]). This crate holds those shapes plus the payload
//! types both sides agree on:
//!
//! - [`message`] - handshake/call/return/throw envelopes and [`CallId`]
//! - [`methods`] - statically declared method lists for each side
//! - [`tool`] - tool descriptors as delivered by the metadata source
//! - [`host`] - argument and result payloads of host operations

pub mod host;
pub mod message;
pub mod methods;
pub mod tool;

pub use host::{
	Breadcrumb, ItemId, ItemType, ItemView, ModalButton, ModalOptions, NotificationKind,
	NotificationOptions, NotificationOutcome, RepositoryBrowserOptions,
};
pub use message::{
	CONNECT_SENTINEL, CallId, ErrorPayload, Handshake, Message, MethodCall, MethodDescriptor,
	MethodReturn, MethodThrow, ReturnShape,
};
pub use methods::{HOST_METHODS, TOOL_METHODS, item_method, parse_item_method};
pub use tool::{LocalizedText, ToolDescriptor};
