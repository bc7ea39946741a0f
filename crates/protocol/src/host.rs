//! Argument and result payloads of host operations.
//!
//! Host methods take positional arguments on the wire; these types describe
//! the structured ones (options objects, ids) so host and tool decode them
//! the same way.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of content item a host operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
	Folder,
	Page,
	File,
	Image,
}

/// What the host should show for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemView {
	/// Navigate the item list to the item (or its folder).
	Navigate,
	Properties,
	ObjectProperties,
	Preview,
}

/// Item identifier: either a numeric local id or a global id string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
	Local(u64),
	Global(String),
}

impl From<u64> for ItemId {
	fn from(value: u64) -> Self {
		ItemId::Local(value)
	}
}

impl From<&str> for ItemId {
	fn from(value: &str) -> Self {
		ItemId::Global(value.to_string())
	}
}

/// Options for a generic modal dialog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalOptions {
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub body: String,
	#[serde(default)]
	pub buttons: Vec<ModalButton>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalButton {
	pub label: String,
	/// Value the call settles with when this button is chosen.
	#[serde(default)]
	pub return_value: Value,
	/// Whether choosing this button rejects the call instead of resolving it.
	#[serde(default)]
	pub should_reject: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
	#[default]
	Default,
	Success,
	Warning,
	Alert,
}

/// Options for a transient notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
	pub message: String,
	#[serde(default, rename = "type")]
	pub kind: NotificationKind,
	/// Auto-dismiss delay in milliseconds; `0` keeps it until dismissed.
	#[serde(default)]
	pub delay: u64,
	/// Label of an optional action button.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action: Option<String>,
}

/// How a notification ended. A call to `showNotification` settles with this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationOutcome {
	/// The action button was clicked.
	Action,
	/// Closed by the user or by the auto-dismiss timer.
	Dismissed,
}

/// Options for the repository browser; forwarded to the host untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryBrowserOptions {
	#[serde(default)]
	pub allowed: Vec<ItemType>,
	#[serde(default)]
	pub select_multiple: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub start_node: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub start_folder: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
}

/// One segment of the breadcrumb trail a tool reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
	pub text: String,
	/// In-tool path the segment links to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
}
