//! Host operations exposed to connected tools.
//!
//! [`HostApi::for_tool`] builds one instance per connection, binding the
//! tool's identity so `close` and `navigated` reach that tool's lifecycle
//! hooks. The actual host actions are delegated to [`HostServices`].

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;
use toolport_protocol::methods::host;
use toolport_protocol::{
	Breadcrumb, HOST_METHODS, ItemId, ItemType, ItemView, MethodDescriptor, ModalOptions,
	NotificationOptions, NotificationOutcome, RepositoryBrowserOptions, parse_item_method,
};
use toolport_runtime::{Args, Error, ExposedApi, InvokeFuture, RemoteApi, Result};
use tracing::debug;

/// A host action that needs no result beyond success.
#[derive(Debug, Clone, PartialEq)]
pub enum HostRequest {
	/// Show the item list of a node.
	Node { node_id: u64 },
	/// Show a single content item.
	Item {
		view: ItemView,
		item_type: ItemType,
		id: ItemId,
		node_id: Option<u64>,
	},
	PublishQueue,
	Wastebin { node_id: Option<u64> },
	MessageComposer,
	MessageInbox,
}

/// Host application services the exposed API delegates to.
pub trait HostServices: Send + Sync {
	fn open(&self, request: HostRequest) -> BoxFuture<'static, Result<()>>;

	/// Opens the repository browser; settles with the selected items.
	fn open_repository_browser(
		&self,
		options: RepositoryBrowserOptions,
	) -> BoxFuture<'static, Result<Vec<Value>>>;

	/// Shows a modal; settles with the index of the chosen button, or
	/// [`None`] if the modal was dismissed.
	fn open_modal(&self, options: ModalOptions) -> BoxFuture<'static, Result<Option<usize>>>;

	fn show_notification(
		&self,
		options: NotificationOptions,
	) -> BoxFuture<'static, Result<NotificationOutcome>>;

	fn set_breadcrumbs(&self, tool: &str, breadcrumbs: Vec<Breadcrumb>);
}

/// Lifecycle callbacks bound to a tool's connection.
pub trait ToolHooks: Send + Sync {
	/// The tool asked to be closed.
	fn close_requested(&self, tool: &str);

	/// The tool navigated internally to `path`.
	fn navigated(&self, tool: &str, path: &str, replace: bool);

	/// A channel to the tool was established.
	fn connected(&self, _tool: &str, _remote: RemoteApi) {}
}

/// Identity a [`HostApi`] is bound to.
pub struct ToolContext {
	pub key: String,
	pub display_name: String,
	pub hooks: Arc<dyn ToolHooks>,
}

/// Host method table for one tool connection.
#[derive(Clone)]
pub struct HostApi {
	services: Arc<dyn HostServices>,
	context: Arc<ToolContext>,
}

impl HostApi {
	pub fn for_tool(services: Arc<dyn HostServices>, context: ToolContext) -> Self {
		Self {
			services,
			context: Arc::new(context),
		}
	}

	pub fn tool(&self) -> &str {
		&self.context.key
	}
}

impl ExposedApi for HostApi {
	fn methods(&self) -> &[MethodDescriptor] {
		HOST_METHODS
	}

	fn invoke(&self, name: &str, args: Vec<Value>) -> InvokeFuture {
		Box::pin(dispatch(
			Arc::clone(&self.services),
			Arc::clone(&self.context),
			name.to_string(),
			Args::new(args),
		))
	}
}

async fn dispatch(
	services: Arc<dyn HostServices>,
	context: Arc<ToolContext>,
	name: String,
	args: Args,
) -> Result<Value> {
	debug!(tool = %context.key, method = %name, "host call");

	if let Some((view, item_type)) = parse_item_method(&name) {
		let request = HostRequest::Item {
			view,
			item_type,
			id: args.required(0, "id")?,
			node_id: args.optional(1, "nodeId")?,
		};
		services.open(request).await?;
		return Ok(Value::Null);
	}

	match name.as_str() {
		host::NAVIGATE_TO_NODE => {
			let node_id = args.required(0, "nodeId")?;
			services.open(HostRequest::Node { node_id }).await?;
			Ok(Value::Null)
		}
		host::OPEN_PUBLISH_QUEUE => {
			services.open(HostRequest::PublishQueue).await?;
			Ok(Value::Null)
		}
		host::OPEN_WASTEBIN => {
			let node_id = args.optional(0, "nodeId")?;
			services.open(HostRequest::Wastebin { node_id }).await?;
			Ok(Value::Null)
		}
		host::OPEN_MESSAGE_COMPOSER => {
			services.open(HostRequest::MessageComposer).await?;
			Ok(Value::Null)
		}
		host::OPEN_MESSAGE_INBOX => {
			services.open(HostRequest::MessageInbox).await?;
			Ok(Value::Null)
		}
		host::OPEN_REPOSITORY_BROWSER => {
			let options = args.optional(0, "options")?.unwrap_or_default();
			let selection = services.open_repository_browser(options).await?;
			Ok(Value::Array(selection))
		}
		host::OPEN_MODAL => {
			let options: ModalOptions = args.required(0, "options")?;
			open_modal(services.as_ref(), options).await
		}
		host::SHOW_NOTIFICATION => {
			let options: NotificationOptions = args.required(0, "options")?;
			let outcome = services.show_notification(options).await?;
			Ok(serde_json::to_value(outcome)?)
		}
		host::CLOSE => {
			context.hooks.close_requested(&context.key);
			Ok(Value::Null)
		}
		host::NAVIGATED => {
			let path: String = args.required(0, "path")?;
			let replace = args.optional(1, "replace")?.unwrap_or(false);
			context.hooks.navigated(&context.key, &path, replace);
			Ok(Value::Null)
		}
		host::PROVIDE_BREADCRUMBS => {
			let breadcrumbs = args.optional(0, "breadcrumbs")?.unwrap_or_default();
			services.set_breadcrumbs(
				&context.key,
				with_tool_root(breadcrumbs, &context.display_name),
			);
			Ok(Value::Null)
		}
		_ => Err(Error::UnknownMethod(name)),
	}
}

/// Settles with the chosen button's value, or rejects for a rejecting
/// button and for a dismissed modal.
async fn open_modal(services: &dyn HostServices, options: ModalOptions) -> Result<Value> {
	let buttons = options.buttons.clone();
	let Some(index) = services.open_modal(options).await? else {
		return Err(Error::failed("Modal was dismissed"));
	};
	let button = buttons
		.into_iter()
		.nth(index)
		.ok_or_else(|| Error::failed(format!("Modal closed with unknown button {index}")))?;

	if button.should_reject {
		let message = match button.return_value {
			Value::String(message) => message,
			Value::Null => button.label,
			other => other.to_string(),
		};
		return Err(Error::failed(message));
	}
	Ok(button.return_value)
}

/// The root segment always carries the tool's display name.
fn with_tool_root(mut breadcrumbs: Vec<Breadcrumb>, display_name: &str) -> Vec<Breadcrumb> {
	match breadcrumbs.first_mut() {
		Some(root) => root.text = display_name.to_string(),
		None => breadcrumbs.push(Breadcrumb {
			text: display_name.to_string(),
			url: None,
		}),
	}
	breadcrumbs
}
