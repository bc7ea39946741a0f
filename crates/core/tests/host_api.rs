mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use common::{FakeServices, settle};
use parking_lot::Mutex;
use serde_json::{Value, json};
use toolport::protocol::methods::tool;
use toolport::protocol::{
	Breadcrumb, CONNECT_SENTINEL, HOST_METHODS, ItemId, ItemType, ItemView, ModalButton,
	ModalOptions, NotificationOptions, NotificationOutcome, RepositoryBrowserOptions,
};
use toolport::runtime::{Channel, LocalPort, MethodTable, RemoteApi};
use toolport::{
	ConnectOptions, ConnectRequest, ConnectionManager, HostProxy, HostRequest, ToolHooks,
	WindowId,
};

#[derive(Default)]
struct RecordingHooks {
	closes: Mutex<Vec<String>>,
	navigations: Mutex<Vec<(String, String, bool)>>,
	connected: Mutex<Vec<String>>,
}

impl ToolHooks for RecordingHooks {
	fn close_requested(&self, tool: &str) {
		self.closes.lock().push(tool.to_string());
	}

	fn navigated(&self, tool: &str, path: &str, replace: bool) {
		self.navigations
			.lock()
			.push((tool.to_string(), path.to_string(), replace));
	}

	fn connected(&self, tool: &str, _remote: RemoteApi) {
		self.connected.lock().push(tool.to_string());
	}
}

struct Connected {
	manager: ConnectionManager,
	services: Arc<FakeServices>,
	hooks: Arc<RecordingHooks>,
	channel: Arc<Channel>,
	host: HostProxy,
}

async fn connect(key: &str, tool_methods: MethodTable) -> Connected {
	let services = Arc::new(FakeServices::default());
	let hooks = Arc::new(RecordingHooks::default());
	let manager = ConnectionManager::new(services.clone(), hooks.clone());
	let window = WindowId(3);

	manager.connect(
		key,
		window,
		ConnectOptions {
			display_name: Some("Link Checker".to_string()),
			observer: None,
		},
	);

	let (host_end, tool_end) = LocalPort::pair();
	let (channel, host) = HostProxy::connect(tool_end, Arc::new(tool_methods), key).unwrap();
	assert!(manager.accept(ConnectRequest {
		source: window,
		data: json!(CONNECT_SENTINEL),
		port: host_end,
	}));
	host.ready().await.unwrap();
	manager.api(key).unwrap().ready().await.unwrap();

	Connected {
		manager,
		services,
		hooks,
		channel,
		host,
	}
}

#[tokio::test]
async fn host_operations_resolve_with_host_values() {
	let c = connect("linkchecker", MethodTable::new()).await;

	c.host
		.show_item(ItemView::Preview, ItemType::Page, 42u64, Some(1))
		.await
		.unwrap();
	c.host.navigate_to_folder("A547.3", None).await.unwrap();
	c.host.open_wastebin(Some(2)).await.unwrap();

	let selection = c
		.host
		.open_repository_browser(&RepositoryBrowserOptions {
			allowed: vec![ItemType::Page, ItemType::Image],
			..Default::default()
		})
		.await
		.unwrap();
	assert_eq!(
		selection,
		vec![json!({ "id": 1, "type": "page" }), json!({ "id": 1, "type": "image" })]
	);

	let outcome = c
		.host
		.show_notification(&NotificationOptions {
			message: "Report ready".into(),
			action: Some("Open".into()),
			..Default::default()
		})
		.await
		.unwrap();
	assert_eq!(outcome, NotificationOutcome::Action);

	assert_eq!(
		*c.services.requests.lock(),
		vec![
			HostRequest::Item {
				view: ItemView::Preview,
				item_type: ItemType::Page,
				id: ItemId::Local(42),
				node_id: Some(1),
			},
			HostRequest::Item {
				view: ItemView::Navigate,
				item_type: ItemType::Folder,
				id: ItemId::Global("A547.3".into()),
				node_id: None,
			},
			HostRequest::Wastebin { node_id: Some(2) },
		]
	);
}

#[tokio::test]
async fn host_failure_rejects_with_same_message() {
	let c = connect("linkchecker", MethodTable::new()).await;
	*c.services.fail_with.lock() = Some("Node 4 is not accessible".to_string());

	let err = c.host.navigate_to_node(4).await.unwrap_err();

	assert_eq!(err.message(), "Node 4 is not accessible");
	assert_eq!(err.error_name(), Some("Error"));
	assert_eq!(c.channel.pending_calls(), 0);
}

#[tokio::test]
async fn modal_settles_by_chosen_button() {
	let c = connect("linkchecker", MethodTable::new()).await;
	let options = ModalOptions {
		title: "Delete report?".into(),
		body: String::new(),
		buttons: vec![
			ModalButton {
				label: "Delete".into(),
				return_value: json!({ "confirmed": true }),
				should_reject: false,
			},
			ModalButton {
				label: "Cancel".into(),
				return_value: json!("Deletion cancelled"),
				should_reject: true,
			},
		],
	};

	*c.services.modal_choice.lock() = Some(0);
	assert_eq!(
		c.host.open_modal(&options).await.unwrap(),
		json!({ "confirmed": true })
	);

	*c.services.modal_choice.lock() = Some(1);
	let err = c.host.open_modal(&options).await.unwrap_err();
	assert_eq!(err.message(), "Deletion cancelled");
}

#[tokio::test]
async fn invalid_item_view_fails_locally() {
	let c = connect("linkchecker", MethodTable::new()).await;

	let err = c
		.host
		.show_item(ItemView::Preview, ItemType::Folder, 5u64, None)
		.await
		.unwrap_err();

	assert!(matches!(err, toolport::runtime::Error::InvalidArgument(_)));
	assert!(c.services.requests.lock().is_empty());
}

#[tokio::test]
async fn advertised_sets_match_callable_stubs() {
	let tool_methods = MethodTable::new()
		.method(tool::HAS_UNSAVED_CHANGES, |_| async { Ok(json!(false)) })
		.method(tool::SAVE_STATE, |_| async { Ok(json!({ "tab": 2 })) });
	let c = connect("linkchecker", tool_methods).await;

	let host_names: BTreeSet<String> = HOST_METHODS.iter().map(|m| m.name().to_string()).collect();
	assert_eq!(c.host.remote().method_names(), host_names);

	let tool_api = c.manager.api("linkchecker").unwrap();
	assert_eq!(
		tool_api.method_names(),
		BTreeSet::from([tool::HAS_UNSAVED_CHANGES.to_string(), tool::SAVE_STATE.to_string()])
	);

	let proxy = toolport::ToolProxy::new(tool_api);
	assert_eq!(proxy.has_unsaved_changes().await.unwrap(), Some(false));
	assert_eq!(proxy.save_state().await.unwrap(), Some(json!({ "tab": 2 })));
	assert!(!proxy.navigate("reports").await.unwrap());
	assert!(!proxy.restore_state(Value::Null).await.unwrap());
}

#[tokio::test]
async fn close_and_navigated_are_bound_to_the_calling_tool() {
	let c = connect("linkchecker", MethodTable::new()).await;

	c.host.navigated("reports/9", true).await.unwrap();
	c.host.close().await.unwrap();
	c.host
		.provide_breadcrumbs(&[
			Breadcrumb {
				text: "root".into(),
				url: None,
			},
			Breadcrumb {
				text: "Report 9".into(),
				url: Some("reports/9".into()),
			},
		])
		.await
		.unwrap();

	assert_eq!(*c.hooks.connected.lock(), vec!["linkchecker".to_string()]);
	assert_eq!(*c.hooks.closes.lock(), vec!["linkchecker".to_string()]);
	assert_eq!(
		*c.hooks.navigations.lock(),
		vec![("linkchecker".to_string(), "reports/9".to_string(), true)]
	);
	let crumbs = c.services.breadcrumbs.lock();
	assert_eq!(crumbs[0].1[0].text, "Link Checker");
	assert_eq!(crumbs[0].1[1].url.as_deref(), Some("reports/9"));
}

#[tokio::test]
async fn disconnect_closes_both_ends() {
	let c = connect("linkchecker", MethodTable::new()).await;

	c.manager.disconnect("linkchecker");
	settle().await;

	assert!(c.manager.api("linkchecker").is_none());
	assert!(c.channel.is_destroyed());
	let err = c.host.open_publish_queue().await.unwrap_err();
	assert!(err.is_channel_closed());
}
