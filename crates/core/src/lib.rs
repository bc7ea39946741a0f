//! toolport - embed tools in a host application and talk to them over RPC
//!
//! A tool is a separately hosted application shown either inline (an iframe
//! mounted by the host UI) or in its own browser tab. This crate owns the
//! host side of the embedding:
//!
//! - [`ToolLifecycleController`] decides which tools are active, visible,
//!   or open in a tab, driven by host routes and tool requests
//! - [`ConnectionManager`] turns connection requests from tool windows into
//!   channels, one per tool
//! - [`HostApi`] is what a connected tool may call on the host
//! - [`HostProxy`] is the tool-side counterpart
//!
//! Platform access goes through traits ([`WindowHost`], [`Router`],
//! [`ToolCatalog`], [`CloseConfirmation`], [`HostServices`], [`Scheduler`])
//! so the controller runs anywhere a tokio runtime does.
//!
//! # Example
//!
//! ```ignore
//! let controller = ToolLifecycleController::new(BridgeConfig::default(), collaborators);
//! controller.load_tools().await?;
//! controller.route_changed("/tools/linkchecker");
//!
//! // from the platform's message listener
//! controller.accept(ConnectRequest { source, data, port });
//! ```

pub mod client;
pub mod config;
pub mod connections;
pub mod error;
pub mod host_api;
pub mod lifecycle;
pub mod route;
pub mod scheduler;
pub mod tool_api;
pub mod window;

pub use client::HostProxy;
pub use config::BridgeConfig;
pub use connections::{ConnectOptions, ConnectRequest, ConnectionManager};
pub use error::{Error, Result};
pub use host_api::{HostApi, HostRequest, HostServices, ToolContext, ToolHooks};
pub use lifecycle::{
	CloseConfirmation, CloseDecision, Collaborators, Router, ToolCatalog,
	ToolLifecycleController, ToolsState,
};
pub use route::ToolRoute;
pub use scheduler::{IntervalHandle, ManualScheduler, Scheduler, Tick, TokioScheduler};
pub use tool_api::ToolProxy;
pub use window::{ToolWindow, WindowHost, WindowId};
pub use toolport_protocol as protocol;
pub use toolport_runtime as runtime;
