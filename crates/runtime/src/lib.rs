//! toolport runtime - channels, handshake, and call correlation
//!
//! This crate turns a raw two-way message port into an RPC channel between
//! a host application and one embedded tool:
//!
//! - **Port**: the sending half of a pipe plus a queue of received messages
//! - **Channel**: handshake exchange, inbound dispatch, outbound correlation
//! - **Exposed API**: the statically declared methods this side answers
//! - **Remote API**: proxy for the methods the peer advertised
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  toolport   │  Connection manager, lifecycle, host API
//! └──────┬──────┘
//!        │ implements ExposedApi, drives Channel
//! ┌──────▼───────────┐
//! │ toolport-runtime │  This crate
//! │  ┌─────────┐     │
//! │  │ Channel │     │  handshake + call correlation
//! │  └─────────┘     │
//! │  ┌─────────┐     │
//! │  │  Port   │     │  platform pipe / in-process pair
//! │  └─────────┘     │
//! └──────────────────┘
//! ```

pub mod api;
mod calls;
pub mod channel;
pub mod error;
pub mod port;

pub use api::{Args, ExposedApi, InvokeFuture, MethodTable, RemoteApi};
pub use channel::{CallObserver, Channel, ChannelBuilder};
pub use error::{Error, Result};
pub use port::{Inbound, LocalPort, MessagePort, PortParts};
