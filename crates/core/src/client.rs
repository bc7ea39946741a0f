//! Tool-side access to the host.
//!
//! A tool connects its end of the port with [`HostProxy::connect`], passing
//! the optional methods it answers (usually a [`MethodTable`]), and then
//! calls host operations through the returned proxy.
//!
//! [`MethodTable`]: toolport_runtime::MethodTable

use std::sync::Arc;

use serde_json::Value;
use toolport_protocol::methods::host;
use toolport_protocol::{
	Breadcrumb, ItemId, ItemType, ItemView, ModalOptions, NotificationOptions,
	NotificationOutcome, RepositoryBrowserOptions, item_method,
};
use toolport_runtime::{Channel, Error, ExposedApi, PortParts, RemoteApi, Result};

/// Typed wrapper over the host's advertised methods.
#[derive(Debug, Clone)]
pub struct HostProxy {
	remote: RemoteApi,
}

impl HostProxy {
	/// Opens a channel on the tool's end of the port and starts its pump.
	pub fn connect(
		parts: PortParts,
		local: Arc<dyn ExposedApi>,
		path: &str,
	) -> Result<(Arc<Channel>, HostProxy)> {
		let channel = Channel::builder(parts.port, local).path(path).open()?;
		channel.spawn(parts.inbound);
		let proxy = HostProxy::new(channel.remote());
		Ok((channel, proxy))
	}

	pub fn new(remote: RemoteApi) -> Self {
		Self { remote }
	}

	/// Waits for the host's handshake.
	pub async fn ready(&self) -> Result<()> {
		self.remote.ready().await
	}

	pub fn remote(&self) -> &RemoteApi {
		&self.remote
	}

	pub async fn navigate_to_node(&self, node_id: u64) -> Result<()> {
		self.call_unit(host::NAVIGATE_TO_NODE, vec![node_id.into()]).await
	}

	/// Shows an item in the given view, e.g. a page preview.
	pub async fn show_item(
		&self,
		view: ItemView,
		item_type: ItemType,
		id: impl Into<ItemId>,
		node_id: Option<u64>,
	) -> Result<()> {
		let method = item_method(view, item_type).ok_or_else(|| {
			Error::InvalidArgument(format!("{item_type:?} has no {view:?} view"))
		})?;
		let mut args = vec![serde_json::to_value(id.into())?];
		if let Some(node_id) = node_id {
			args.push(node_id.into());
		}
		self.call_unit(method, args).await
	}

	pub async fn navigate_to_page(
		&self,
		id: impl Into<ItemId>,
		node_id: Option<u64>,
	) -> Result<()> {
		self.show_item(ItemView::Navigate, ItemType::Page, id, node_id).await
	}

	pub async fn navigate_to_folder(
		&self,
		id: impl Into<ItemId>,
		node_id: Option<u64>,
	) -> Result<()> {
		self.show_item(ItemView::Navigate, ItemType::Folder, id, node_id).await
	}

	pub async fn preview_page(&self, id: impl Into<ItemId>, node_id: Option<u64>) -> Result<()> {
		self.show_item(ItemView::Preview, ItemType::Page, id, node_id).await
	}

	pub async fn open_publish_queue(&self) -> Result<()> {
		self.call_unit(host::OPEN_PUBLISH_QUEUE, Vec::new()).await
	}

	pub async fn open_wastebin(&self, node_id: Option<u64>) -> Result<()> {
		let args = node_id.map(Value::from).into_iter().collect();
		self.call_unit(host::OPEN_WASTEBIN, args).await
	}

	pub async fn open_message_composer(&self) -> Result<()> {
		self.call_unit(host::OPEN_MESSAGE_COMPOSER, Vec::new()).await
	}

	pub async fn open_message_inbox(&self) -> Result<()> {
		self.call_unit(host::OPEN_MESSAGE_INBOX, Vec::new()).await
	}

	/// Settles with the items the user selected.
	pub async fn open_repository_browser(
		&self,
		options: &RepositoryBrowserOptions,
	) -> Result<Vec<Value>> {
		self.remote
			.call_as(host::OPEN_REPOSITORY_BROWSER, [options]).await
	}

	/// Settles with the chosen button's return value; a rejecting button or
	/// a dismissed modal is an error.
	pub async fn open_modal(&self, options: &ModalOptions) -> Result<Value> {
		self.remote.call_as(host::OPEN_MODAL, [options]).await
	}

	pub async fn show_notification(
		&self,
		options: &NotificationOptions,
	) -> Result<NotificationOutcome> {
		self.remote.call_as(host::SHOW_NOTIFICATION, [options]).await
	}

	/// Asks the host to close this tool.
	pub async fn close(&self) -> Result<()> {
		self.call_unit(host::CLOSE, Vec::new()).await
	}

	/// Reports in-tool navigation so the host route mirrors it.
	pub async fn navigated(&self, path: &str, replace: bool) -> Result<()> {
		self.call_unit(host::NAVIGATED, vec![path.into(), replace.into()]).await
	}

	pub async fn provide_breadcrumbs(&self, breadcrumbs: &[Breadcrumb]) -> Result<()> {
		self.call_unit(
			host::PROVIDE_BREADCRUMBS,
			vec![serde_json::to_value(breadcrumbs)?],
		).await
	}

	async fn call_unit(&self, method: &str, args: Vec<Value>) -> Result<()> {
		self.remote.call(method, args).await.map(drop)
	}
}
