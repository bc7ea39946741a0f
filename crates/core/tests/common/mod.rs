#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::{Value, json};
use toolport::protocol::{
	Breadcrumb, CONNECT_SENTINEL, ModalOptions, NotificationOptions, NotificationOutcome,
	RepositoryBrowserOptions, ToolDescriptor,
};
use toolport::runtime::{Channel, ExposedApi, LocalPort, MethodTable};
use toolport::{
	BridgeConfig, CloseConfirmation, CloseDecision, Collaborators, ConnectRequest, Error,
	HostRequest, HostServices, ManualScheduler, Router, ToolCatalog, ToolLifecycleController,
	ToolWindow, WindowHost, WindowId,
};

#[derive(Default)]
pub struct FakeRouter {
	pub navigations: Mutex<Vec<(String, bool)>>,
}

impl FakeRouter {
	pub fn navigations(&self) -> Vec<(String, bool)> {
		self.navigations.lock().clone()
	}
}

impl Router for FakeRouter {
	fn navigate(&self, path: &str, replace: bool) {
		self.navigations.lock().push((path.to_string(), replace));
	}
}

pub struct FakeCatalog {
	pub tools: Mutex<Result<Vec<ToolDescriptor>, String>>,
}

impl FakeCatalog {
	pub fn new(tools: Vec<ToolDescriptor>) -> Self {
		Self {
			tools: Mutex::new(Ok(tools)),
		}
	}
}

impl ToolCatalog for FakeCatalog {
	fn list_tools(&self) -> BoxFuture<'static, toolport::Result<Vec<ToolDescriptor>>> {
		let tools = self.tools.lock().clone().map_err(Error::Catalog);
		Box::pin(async move { tools })
	}
}

pub struct FakeConfirmation {
	pub decision: Mutex<CloseDecision>,
	pub prompts: Mutex<Vec<String>>,
}

impl FakeConfirmation {
	pub fn answering(decision: CloseDecision) -> Self {
		Self {
			decision: Mutex::new(decision),
			prompts: Mutex::new(Vec::new()),
		}
	}
}

impl CloseConfirmation for FakeConfirmation {
	fn confirm_discard(&self, tool: &ToolDescriptor) -> BoxFuture<'static, CloseDecision> {
		self.prompts.lock().push(tool.key.clone());
		let decision = *self.decision.lock();
		Box::pin(async move { decision })
	}
}

#[derive(Default)]
pub struct FakeServices {
	pub requests: Mutex<Vec<HostRequest>>,
	pub breadcrumbs: Mutex<Vec<(String, Vec<Breadcrumb>)>>,
	pub modal_choice: Mutex<Option<usize>>,
	pub fail_with: Mutex<Option<String>>,
}

impl HostServices for FakeServices {
	fn open(&self, request: HostRequest) -> BoxFuture<'static, toolport::runtime::Result<()>> {
		let failure = self.fail_with.lock().clone();
		self.requests.lock().push(request);
		Box::pin(async move {
			match failure {
				Some(message) => Err(toolport::runtime::Error::failed(message)),
				None => Ok(()),
			}
		})
	}

	fn open_repository_browser(
		&self,
		options: RepositoryBrowserOptions,
	) -> BoxFuture<'static, toolport::runtime::Result<Vec<Value>>> {
		let picked: Vec<Value> = options
			.allowed
			.iter()
			.map(|item_type| json!({ "id": 1, "type": item_type }))
			.collect();
		Box::pin(async move { Ok(picked) })
	}

	fn open_modal(
		&self,
		_options: ModalOptions,
	) -> BoxFuture<'static, toolport::runtime::Result<Option<usize>>> {
		let choice = *self.modal_choice.lock();
		Box::pin(async move { Ok(choice) })
	}

	fn show_notification(
		&self,
		options: NotificationOptions,
	) -> BoxFuture<'static, toolport::runtime::Result<NotificationOutcome>> {
		let outcome = match options.action {
			Some(_) => NotificationOutcome::Action,
			None => NotificationOutcome::Dismissed,
		};
		Box::pin(async move { Ok(outcome) })
	}

	fn set_breadcrumbs(&self, tool: &str, breadcrumbs: Vec<Breadcrumb>) {
		self.breadcrumbs.lock().push((tool.to_string(), breadcrumbs));
	}
}

pub struct FakeWindow {
	id: WindowId,
	pub url: String,
	closed: AtomicBool,
	pub focus_count: AtomicUsize,
	pub close_count: AtomicUsize,
}

impl FakeWindow {
	/// Simulates the user closing the tab.
	pub fn close_by_user(&self) {
		self.closed.store(true, Ordering::SeqCst);
	}
}

impl ToolWindow for FakeWindow {
	fn id(&self) -> WindowId {
		self.id
	}

	fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	fn focus(&self) {
		self.focus_count.fetch_add(1, Ordering::SeqCst);
	}

	fn close(&self) {
		self.close_count.fetch_add(1, Ordering::SeqCst);
		self.closed.store(true, Ordering::SeqCst);
	}
}

/// Callback run by [`FakeWindows::open`] after the window exists.
pub type OpenHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct FakeWindows {
	next_id: AtomicU64,
	pub opened: Mutex<Vec<Arc<FakeWindow>>>,
	pub host_focus_count: AtomicUsize,
	pub fail_open: AtomicBool,
	pub on_open: Mutex<Option<OpenHook>>,
}

impl FakeWindows {
	pub fn opened(&self) -> Vec<Arc<FakeWindow>> {
		self.opened.lock().clone()
	}
}

impl WindowHost for FakeWindows {
	fn open(&self, url: &str) -> toolport::Result<Arc<dyn ToolWindow>> {
		if self.fail_open.load(Ordering::SeqCst) {
			return Err(Error::Window("popup blocked".to_string()));
		}
		let window = Arc::new(FakeWindow {
			id: WindowId(1_000 + self.next_id.fetch_add(1, Ordering::SeqCst)),
			url: url.to_string(),
			closed: AtomicBool::new(false),
			focus_count: AtomicUsize::new(0),
			close_count: AtomicUsize::new(0),
		});
		self.opened.lock().push(Arc::clone(&window));
		let hook = self.on_open.lock().clone();
		if let Some(hook) = hook {
			hook();
		}
		Ok(window)
	}

	fn focus_host(&self) {
		self.host_focus_count.fetch_add(1, Ordering::SeqCst);
	}
}

pub fn linkchecker() -> ToolDescriptor {
	ToolDescriptor::new("linkchecker", "Link Checker", "https://tools.example.com/linkchecker/")
}

pub fn formgenerator() -> ToolDescriptor {
	ToolDescriptor::new("formgenerator", "Form Generator", "https://tools.example.com/forms/")
		.with_newtab(true)
}

pub struct Harness {
	pub controller: Arc<ToolLifecycleController>,
	pub router: Arc<FakeRouter>,
	pub catalog: Arc<FakeCatalog>,
	pub confirmation: Arc<FakeConfirmation>,
	pub services: Arc<FakeServices>,
	pub windows: Arc<FakeWindows>,
	pub scheduler: ManualScheduler,
}

impl Harness {
	pub fn new() -> Self {
		Self::with_config(BridgeConfig::default())
	}

	pub fn with_config(config: BridgeConfig) -> Self {
		let router = Arc::new(FakeRouter::default());
		let catalog = Arc::new(FakeCatalog::new(vec![linkchecker(), formgenerator()]));
		let confirmation = Arc::new(FakeConfirmation::answering(CloseDecision::Discard));
		let services = Arc::new(FakeServices::default());
		let windows = Arc::new(FakeWindows::default());
		let scheduler = ManualScheduler::new();

		let controller = ToolLifecycleController::new(
			config,
			Collaborators {
				catalog: catalog.clone(),
				router: router.clone(),
				confirmation: confirmation.clone(),
				services: services.clone(),
				windows: windows.clone(),
				scheduler: Arc::new(scheduler.clone()),
			},
		);

		Self {
			controller,
			router,
			catalog,
			confirmation,
			services,
			windows,
			scheduler,
		}
	}

	/// Loads the default tool list.
	pub async fn loaded() -> Self {
		let harness = Self::new();
		harness.controller.load_tools().await.unwrap();
		harness
	}

	/// Connects a tool running `methods` from `window`, returning the
	/// tool's end of the channel once both handshakes were exchanged.
	pub async fn connect_tool(
		&self,
		key: &str,
		window: WindowId,
		methods: MethodTable,
	) -> Arc<Channel> {
		let (host_end, tool_end) = LocalPort::pair();
		let local: Arc<dyn ExposedApi> = Arc::new(methods);
		let tool = Channel::builder(tool_end.port, local)
			.path(key)
			.open()
			.unwrap();
		tool.spawn(tool_end.inbound);

		let accepted = self.controller.accept(ConnectRequest {
			source: window,
			data: json!(CONNECT_SENTINEL),
			port: host_end,
		});
		assert!(accepted, "connection from {window} was not accepted");

		tool.remote().ready().await.unwrap();
		self.controller
			.connections()
			.api(key)
			.unwrap()
			.ready()
			.await
			.unwrap();
		tool
	}
}

/// Lets spawned channel tasks run.
pub async fn settle() {
	for _ in 0..20 {
		tokio::task::yield_now().await;
	}
}

/// Waits until `done` holds, failing after five seconds.
pub async fn eventually(mut done: impl FnMut() -> bool) {
	let waiting = async {
		while !done() {
			tokio::time::sleep(std::time::Duration::from_millis(1)).await;
		}
	};
	tokio::time::timeout(std::time::Duration::from_secs(5), waiting)
		.await
		.expect("condition not reached in time");
}
