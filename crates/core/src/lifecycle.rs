//! Tool lifecycle controller.
//!
//! Decides which tools are active, which inline tool is visible, and which
//! tab windows exist, in response to:
//! - host route changes ([`ToolLifecycleController::route_changed`])
//! - explicit open and close requests
//! - tool-initiated `close` and `navigated` calls
//! - tab windows found closed by liveness polling
//!
//! State lives in one [`ToolsState`] behind a mutex. Collaborators (router,
//! windows, scheduler, connection manager, confirmation prompt) are always
//! called with neither the state nor the tab lock held.
//!
//! `navigate` calls to a tool are posted under a separate forwarding lock,
//! together with the state change they mirror, so the tool receives subpaths
//! in the order the controller recorded them.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use toolport_protocol::ToolDescriptor;
use toolport_protocol::methods::host;
use toolport_runtime::{CallObserver, RemoteApi};
use tracing::{debug, warn};

use crate::config::BridgeConfig;
use crate::connections::{ConnectOptions, ConnectRequest, ConnectionManager};
use crate::error::{Error, Result};
use crate::host_api::{HostServices, ToolHooks};
use crate::route::ToolRoute;
use crate::scheduler::{IntervalHandle, Scheduler};
use crate::tool_api::ToolProxy;
use crate::window::{ToolWindow, WindowHost, WindowId};

/// Host routing facility.
pub trait Router: Send + Sync {
	fn navigate(&self, path: &str, replace: bool);
}

/// Source of tool metadata.
pub trait ToolCatalog: Send + Sync {
	fn list_tools(&self) -> BoxFuture<'static, Result<Vec<ToolDescriptor>>>;
}

/// Answer to the unsaved-changes prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
	/// Close the tool and lose its changes.
	Discard,
	/// Keep the tool open and show it.
	Open,
}

/// Prompt shown before closing a tool with unsaved changes.
pub trait CloseConfirmation: Send + Sync {
	fn confirm_discard(&self, tool: &ToolDescriptor) -> BoxFuture<'static, CloseDecision>;
}

/// Everything the controller drives.
#[derive(Clone)]
pub struct Collaborators {
	pub catalog: Arc<dyn ToolCatalog>,
	pub router: Arc<dyn Router>,
	pub confirmation: Arc<dyn CloseConfirmation>,
	pub services: Arc<dyn HostServices>,
	pub windows: Arc<dyn WindowHost>,
	pub scheduler: Arc<dyn Scheduler>,
}

/// Snapshot of tool activation state.
#[derive(Debug, Clone, Default)]
pub struct ToolsState {
	tools: Option<BTreeMap<String, ToolDescriptor>>,
	active: Vec<String>,
	visible: Option<String>,
	subpaths: HashMap<String, String>,
	pending_route: Option<String>,
}

impl ToolsState {
	/// Loaded tools by key; [`None`] until the catalog delivered.
	pub fn tools(&self) -> Option<&BTreeMap<String, ToolDescriptor>> {
		self.tools.as_ref()
	}

	pub fn tool(&self, key: &str) -> Option<&ToolDescriptor> {
		self.tools.as_ref()?.get(key)
	}

	pub fn is_loaded(&self) -> bool {
		self.tools.is_some()
	}

	/// Active tools in activation order.
	pub fn active(&self) -> &[String] {
		&self.active
	}

	pub fn is_active(&self, key: &str) -> bool {
		self.active.iter().any(|k| k == key)
	}

	/// The inline tool currently shown.
	pub fn visible(&self) -> Option<&str> {
		self.visible.as_deref()
	}

	/// Last known in-tool path of `key`.
	pub fn subpath(&self, key: &str) -> Option<&str> {
		self.subpaths.get(key).map(String::as_str)
	}

	/// Route waiting for the tool list to load.
	pub fn pending_route(&self) -> Option<&str> {
		self.pending_route.as_deref()
	}

	fn activate(&mut self, key: &str) -> bool {
		if self.is_active(key) {
			return false;
		}
		self.active.push(key.to_string());
		true
	}

	fn tab_tools(&self) -> Vec<(String, String)> {
		self.active
			.iter()
			.filter_map(|key| self.tool(key))
			.filter(|tool| tool.newtab)
			.map(|tool| (tool.key.clone(), tool.tool_url.clone()))
			.collect()
	}
}

/// A tool running in its own browser tab.
struct TabHandle {
	window: Arc<dyn ToolWindow>,
	_liveness: IntervalHandle,
}

/// State machine for tool activation.
pub struct ToolLifecycleController {
	config: BridgeConfig,
	collaborators: Collaborators,
	connections: ConnectionManager,
	state: Mutex<ToolsState>,
	tabs: Mutex<HashMap<String, TabHandle>>,
	forwarding: Mutex<()>,
	this: Weak<Self>,
}

impl ToolLifecycleController {
	pub fn new(config: BridgeConfig, collaborators: Collaborators) -> Arc<Self> {
		Arc::new_cyclic(|this| {
			let hooks = Arc::new(LifecycleHooks {
				controller: this.clone(),
			});
			Self {
				connections: ConnectionManager::new(Arc::clone(&collaborators.services), hooks),
				config,
				collaborators,
				state: Mutex::new(ToolsState::default()),
				tabs: Mutex::new(HashMap::new()),
				forwarding: Mutex::new(()),
				this: this.clone(),
			}
		})
	}

	pub fn config(&self) -> &BridgeConfig {
		&self.config
	}

	pub fn connections(&self) -> &ConnectionManager {
		&self.connections
	}

	/// Forwards a candidate connection message to the connection manager.
	pub fn accept(&self, request: ConnectRequest) -> bool {
		self.connections.accept(request)
	}

	pub fn state(&self) -> ToolsState {
		self.state.lock().clone()
	}

	/// Proxy for a connected tool's optional methods.
	pub fn tool_api(&self, key: &str) -> Option<ToolProxy> {
		self.connections.api(key).map(ToolProxy::new)
	}

	/// Fetches the tool list from the catalog and applies it.
	pub async fn load_tools(&self) -> Result<()> {
		let tools = self.collaborators.catalog.list_tools().await?;
		self.set_tools(tools);
		Ok(())
	}

	/// Replaces the tool list and replays a route deferred until now.
	///
	/// Active tools missing from the new list are deactivated.
	pub fn set_tools(&self, tools: Vec<ToolDescriptor>) {
		let (pending, removed) = {
			let mut state = self.state.lock();
			let tools: BTreeMap<_, _> = tools.into_iter().map(|t| (t.key.clone(), t)).collect();
			let removed: Vec<String> = state
				.active
				.iter()
				.filter(|key| !tools.contains_key(*key))
				.cloned()
				.collect();
			debug!(count = tools.len(), "tools loaded");
			state.tools = Some(tools);
			(state.pending_route.take(), removed)
		};

		for key in removed {
			self.deactivate(&key);
		}
		if let Some(path) = pending {
			self.route_changed(&path);
		}
	}

	/// Applies a host route change.
	pub fn route_changed(&self, path: &str) {
		let (key, subpath) = match ToolRoute::parse(path, &self.config.tools_route) {
			ToolRoute::Tool { key, subpath } => (key, subpath),
			ToolRoute::Overview | ToolRoute::Other => {
				let mut state = self.state.lock();
				state.pending_route = None;
				if let Some(hidden) = state.visible.take() {
					debug!(tool = %hidden, path, "tool hidden");
				}
				return;
			}
		};

		enum Outcome {
			Deferred,
			Redirect,
			InPlace { changed: bool },
			Shown { added: bool, changed: bool },
		}

		let forwarding = self.forwarding.lock();
		let outcome = {
			let mut state = self.state.lock();
			let newtab = state
				.tools
				.as_ref()
				.map(|tools| tools.get(key).map(|tool| tool.newtab));
			match newtab {
				None => {
					state.pending_route = Some(path.to_string());
					Outcome::Deferred
				}
				Some(None) | Some(Some(true)) => Outcome::Redirect,
				Some(Some(false)) => {
					state.pending_route = None;
					let previous = state.subpaths.insert(key.to_string(), subpath.to_string());
					let changed = previous.as_deref().unwrap_or("") != subpath;
					if state.visible.as_deref() == Some(key) {
						Outcome::InPlace { changed }
					} else {
						state.visible = Some(key.to_string());
						Outcome::Shown {
							added: state.activate(key),
							changed,
						}
					}
				}
			}
		};
		if let Outcome::InPlace { changed: true } | Outcome::Shown { changed: true, .. } = outcome {
			self.forward_navigation(key, subpath);
		}
		drop(forwarding);

		match outcome {
			Outcome::Deferred => debug!(tool = key, "route deferred until tools are loaded"),
			Outcome::Redirect => {
				debug!(tool = key, "no inline tool for route; redirecting to overview");
				self.collaborators
					.router
					.navigate(self.config.overview_route(), true);
			}
			Outcome::InPlace { .. } => {}
			Outcome::Shown { added, .. } => {
				debug!(tool = key, subpath, "tool visible");
				if added {
					self.reconcile_tabs();
				}
			}
		}
	}

	/// Activates a tool, or focuses its tab if it already has one.
	pub fn open_or_focus(&self, key: &str) -> Result<()> {
		let tool = {
			let state = self.state.lock();
			let tools = state.tools.as_ref().ok_or(Error::NotLoaded)?;
			tools
				.get(key)
				.cloned()
				.ok_or_else(|| Error::UnknownTool(key.to_string()))?
		};

		if tool.newtab {
			let window = self.tabs.lock().get(key).map(|tab| Arc::clone(&tab.window));
			if let Some(window) = window {
				debug!(tool = key, "focusing tab");
				window.focus();
				return Ok(());
			}
			let added = self.state.lock().activate(key);
			if added {
				self.reconcile_tabs();
			}
			return Ok(());
		}

		let route = {
			let mut state = self.state.lock();
			if state.visible.as_deref() == Some(key) {
				return Ok(());
			}
			state.activate(key);
			state.visible = Some(key.to_string());
			let subpath = state.subpath(key).unwrap_or("");
			self.config.tool_route(key, subpath)
		};
		debug!(tool = key, "tool opened inline");
		self.collaborators.router.navigate(&route, false);
		Ok(())
	}

	/// Closes a tool, asking first if it reports unsaved changes.
	///
	/// With `force` the tool is closed without asking. A failing
	/// unsaved-changes check is returned and the tool stays open.
	pub async fn close(&self, key: &str, force: bool) -> Result<()> {
		let tool = {
			let state = self.state.lock();
			if !state.is_active(key) {
				return Ok(());
			}
			state.tool(key).cloned()
		};

		if !force {
			if let Some(proxy) = self.tool_api(key) {
				if proxy.has_unsaved_changes().await? == Some(true) {
					let decision = match &tool {
						Some(tool) => self.collaborators.confirmation.confirm_discard(tool).await,
						None => CloseDecision::Discard,
					};
					if decision == CloseDecision::Open {
						debug!(tool = key, "close cancelled; keeping tool open");
						return self.open_or_focus(key);
					}
				}
			}
		}

		self.deactivate(key);
		Ok(())
	}

	/// Removes a tool from the active set, closing its tab if it has one.
	pub fn deactivate(&self, key: &str) {
		let (was_active, was_visible) = {
			let mut state = self.state.lock();
			let before = state.active.len();
			state.active.retain(|k| k != key);
			let was_visible = state.visible.as_deref() == Some(key);
			if was_visible {
				state.visible = None;
			}
			state.subpaths.remove(key);
			(state.active.len() != before, was_visible)
		};
		if !was_active {
			return;
		}

		debug!(tool = key, "tool deactivated");
		self.connections.disconnect(key);
		if was_visible {
			self.collaborators
				.router
				.navigate(self.config.overview_route(), false);
		}
		self.reconcile_tabs();
	}

	/// Expects the iframe content window of an inline tool to connect.
	pub fn attach_frame(&self, key: &str, window: WindowId) {
		let display_name = self.display_name(key);
		self.connections.connect(
			key,
			window,
			ConnectOptions {
				display_name: Some(display_name),
				observer: None,
			},
		);
	}

	/// The inline tool's iframe was removed.
	pub fn detach_frame(&self, key: &str) {
		self.connections.disconnect(key);
	}

	/// Records in-tool navigation and mirrors it on the host route when the
	/// tool is visible.
	pub fn tool_navigated(&self, key: &str, path: &str, replace: bool) {
		let subpath = path.trim_matches('/');
		let visible = {
			let mut state = self.state.lock();
			if !state.is_active(key) {
				return;
			}
			state.subpaths.insert(key.to_string(), subpath.to_string());
			state.visible.as_deref() == Some(key)
		};
		debug!(tool = key, subpath, "tool navigated");
		if visible {
			let route = self.config.tool_route(key, subpath);
			self.collaborators.router.navigate(&route, replace);
		}
	}

	/// Restores the recorded subpath once a freshly connected tool is ready.
	///
	/// The subpath is read when the handshake arrives, so route changes made
	/// while the tool was loading are not undone.
	pub fn tool_connected(&self, key: &str, remote: RemoteApi) {
		if self.state.lock().subpath(key).is_none_or(str::is_empty) {
			return;
		}
		let controller = self.this.clone();
		let key = key.to_string();
		tokio::spawn(async move {
			if remote.ready().await.is_err() {
				return;
			}
			let Some(controller) = controller.upgrade() else {
				return;
			};
			let (subpath, navigation) = {
				let _forwarding = controller.forwarding.lock();
				let subpath = match controller.state.lock().subpath(&key) {
					Some(subpath) if !subpath.is_empty() => subpath.to_string(),
					_ => return,
				};
				let navigation = ToolProxy::new(remote).navigate(&subpath);
				(subpath, navigation)
			};
			drop(controller);
			match navigation.await {
				Ok(true) => debug!(tool = %key, %subpath, "restored subpath"),
				Ok(false) => {}
				Err(error) => debug!(tool = %key, %error, "failed to restore subpath"),
			}
		});
	}

	/// Called by liveness polling when a tab window is found closed.
	///
	/// Handles each window at most once.
	fn tab_closed(&self, key: &str, window: WindowId) {
		let handle = {
			let mut tabs = self.tabs.lock();
			let current = tabs.get(key).is_some_and(|tab| tab.window.id() == window);
			if current {
				tabs.remove(key)
			} else {
				None
			}
		};
		let Some(handle) = handle else {
			return;
		};
		drop(handle);

		debug!(tool = key, %window, "tab closed by user");
		self.deactivate(key);
	}

	/// Brings tab handles in line with the active set.
	fn reconcile_tabs(&self) {
		let desired = self.state.lock().tab_tools();

		let (closed, missing) = {
			let mut tabs = self.tabs.lock();
			let stale: Vec<String> = tabs
				.keys()
				.filter(|key| !desired.iter().any(|(k, _)| k == *key))
				.cloned()
				.collect();
			let closed: Vec<_> = stale
				.into_iter()
				.filter_map(|key| tabs.remove(&key).map(|tab| (key, tab)))
				.collect();
			let missing: Vec<_> = desired
				.into_iter()
				.filter(|(key, _)| !tabs.contains_key(key))
				.collect();
			(closed, missing)
		};

		let mut opened = Vec::new();
		let mut failed = Vec::new();
		for (key, url) in missing {
			let window = match self.collaborators.windows.open(&url) {
				Ok(window) => window,
				Err(error) => {
					warn!(tool = %key, %error, "failed to open tab");
					failed.push(key);
					continue;
				}
			};
			let handle = TabHandle {
				_liveness: self.watch_tab(&key, &window),
				window,
			};
			let id = handle.window.id();
			let raced = {
				let mut tabs = self.tabs.lock();
				if tabs.contains_key(&key) {
					Some(handle)
				} else {
					tabs.insert(key.clone(), handle);
					None
				}
			};
			match raced {
				Some(duplicate) => {
					debug!(tool = %key, "tab opened concurrently; closing duplicate");
					duplicate.window.close();
				}
				None => opened.push((key, id)),
			}
		}

		for (key, tab) in closed {
			debug!(tool = %key, "closing tab");
			tab.window.close();
			drop(tab);
			self.connections.disconnect(&key);
		}

		for (key, window) in opened {
			debug!(tool = %key, %window, "tab opened");
			let options = ConnectOptions {
				display_name: Some(self.display_name(&key)),
				observer: self.focus_observer(),
			};
			self.connections.connect(&key, window, options);
		}

		if !failed.is_empty() {
			self.state.lock().active.retain(|key| !failed.contains(key));
		}
	}

	fn watch_tab(&self, key: &str, window: &Arc<dyn ToolWindow>) -> IntervalHandle {
		let controller = self.this.clone();
		let key = key.to_string();
		let window = Arc::clone(window);
		self.collaborators.scheduler.every(
			self.config.liveness_interval(),
			Box::new(move || {
				if !window.is_closed() {
					return;
				}
				if let Some(controller) = controller.upgrade() {
					controller.tab_closed(&key, window.id());
				}
			}),
		)
	}

	/// Brings the host window to front on active calls from a tab tool.
	fn focus_observer(&self) -> Option<CallObserver> {
		if !self.config.focus_host_on_call {
			return None;
		}
		let windows = Arc::clone(&self.collaborators.windows);
		Some(Arc::new(move |method: &str| {
			if method != host::NAVIGATED && method != host::PROVIDE_BREADCRUMBS {
				windows.focus_host();
			}
		}))
	}

	/// Posts `navigate` now; only the settlement is awaited in the background.
	fn forward_navigation(&self, key: &str, subpath: &str) {
		let Some(proxy) = self.tool_api(key) else {
			return;
		};
		let navigation = proxy.navigate(subpath);
		let key = key.to_string();
		tokio::spawn(async move {
			if let Err(error) = navigation.await {
				debug!(tool = %key, %error, "navigate call failed");
			}
		});
	}

	fn display_name(&self, key: &str) -> String {
		let state = self.state.lock();
		match state.tool(key) {
			Some(tool) => tool.display_name(&self.config.language).to_string(),
			None => key.to_string(),
		}
	}
}

impl std::fmt::Debug for ToolLifecycleController {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ToolLifecycleController")
			.field("state", &*self.state.lock())
			.field("tabs", &self.tabs.lock().keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Routes tool-initiated requests into the controller.
struct LifecycleHooks {
	controller: Weak<ToolLifecycleController>,
}

impl ToolHooks for LifecycleHooks {
	fn close_requested(&self, tool: &str) {
		let Some(controller) = self.controller.upgrade() else {
			return;
		};
		let key = tool.to_string();
		tokio::spawn(async move {
			if let Err(error) = controller.close(&key, false).await {
				warn!(tool = %key, %error, "tool-initiated close failed");
			}
		});
	}

	fn navigated(&self, tool: &str, path: &str, replace: bool) {
		if let Some(controller) = self.controller.upgrade() {
			controller.tool_navigated(tool, path, replace);
		}
	}

	fn connected(&self, tool: &str, remote: RemoteApi) {
		if let Some(controller) = self.controller.upgrade() {
			controller.tool_connected(tool, remote);
		}
	}
}
