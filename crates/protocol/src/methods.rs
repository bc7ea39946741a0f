//! Statically declared method lists for both sides of a channel.
//!
//! These lists are what each side puts in its handshake. Keeping them as
//! data makes the advertised contract explicit and lets either side check a
//! name before it is sent.

use crate::host::{ItemType, ItemView};
use crate::message::MethodDescriptor;

/// Names of the methods a host exposes to tools.
pub mod host {
	pub const NAVIGATE_TO_NODE: &str = "navigateToNode";
	pub const NAVIGATE_TO_FOLDER: &str = "navigateToFolder";
	pub const NAVIGATE_TO_PAGE: &str = "navigateToPage";
	pub const NAVIGATE_TO_FILE: &str = "navigateToFile";
	pub const NAVIGATE_TO_IMAGE: &str = "navigateToImage";
	pub const OPEN_FOLDER_PROPERTIES: &str = "openFolderProperties";
	pub const OPEN_PAGE_PROPERTIES: &str = "openPageProperties";
	pub const OPEN_FILE_PROPERTIES: &str = "openFileProperties";
	pub const OPEN_IMAGE_PROPERTIES: &str = "openImageProperties";
	pub const OPEN_FOLDER_OBJECT_PROPERTIES: &str = "openFolderObjectProperties";
	pub const OPEN_PAGE_OBJECT_PROPERTIES: &str = "openPageObjectProperties";
	pub const OPEN_FILE_OBJECT_PROPERTIES: &str = "openFileObjectProperties";
	pub const OPEN_IMAGE_OBJECT_PROPERTIES: &str = "openImageObjectProperties";
	pub const PREVIEW_PAGE: &str = "previewPage";
	pub const PREVIEW_FILE: &str = "previewFile";
	pub const PREVIEW_IMAGE: &str = "previewImage";
	pub const OPEN_PUBLISH_QUEUE: &str = "openPublishQueue";
	pub const OPEN_WASTEBIN: &str = "openWastebin";
	pub const OPEN_MESSAGE_COMPOSER: &str = "openMessageComposer";
	pub const OPEN_MESSAGE_INBOX: &str = "openMessageInbox";
	pub const OPEN_REPOSITORY_BROWSER: &str = "openRepositoryBrowser";
	pub const OPEN_MODAL: &str = "openModal";
	pub const SHOW_NOTIFICATION: &str = "showNotification";
	pub const CLOSE: &str = "close";
	pub const NAVIGATED: &str = "navigated";
	pub const PROVIDE_BREADCRUMBS: &str = "provideBreadcrumbs";
}

/// Names of the optional methods a tool may expose to its host.
pub mod tool {
	pub const HAS_UNSAVED_CHANGES: &str = "hasUnsavedChanges";
	pub const NAVIGATE: &str = "navigate";
	pub const SAVE_STATE: &str = "saveState";
	pub const RESTORE_STATE: &str = "restoreState";
}

/// Every method a host advertises.
pub static HOST_METHODS: &[MethodDescriptor] = &[
	MethodDescriptor::promise(host::NAVIGATE_TO_NODE),
	MethodDescriptor::promise(host::NAVIGATE_TO_FOLDER),
	MethodDescriptor::promise(host::NAVIGATE_TO_PAGE),
	MethodDescriptor::promise(host::NAVIGATE_TO_FILE),
	MethodDescriptor::promise(host::NAVIGATE_TO_IMAGE),
	MethodDescriptor::promise(host::OPEN_FOLDER_PROPERTIES),
	MethodDescriptor::promise(host::OPEN_PAGE_PROPERTIES),
	MethodDescriptor::promise(host::OPEN_FILE_PROPERTIES),
	MethodDescriptor::promise(host::OPEN_IMAGE_PROPERTIES),
	MethodDescriptor::promise(host::OPEN_FOLDER_OBJECT_PROPERTIES),
	MethodDescriptor::promise(host::OPEN_PAGE_OBJECT_PROPERTIES),
	MethodDescriptor::promise(host::OPEN_FILE_OBJECT_PROPERTIES),
	MethodDescriptor::promise(host::OPEN_IMAGE_OBJECT_PROPERTIES),
	MethodDescriptor::promise(host::PREVIEW_PAGE),
	MethodDescriptor::promise(host::PREVIEW_FILE),
	MethodDescriptor::promise(host::PREVIEW_IMAGE),
	MethodDescriptor::promise(host::OPEN_PUBLISH_QUEUE),
	MethodDescriptor::promise(host::OPEN_WASTEBIN),
	MethodDescriptor::promise(host::OPEN_MESSAGE_COMPOSER),
	MethodDescriptor::promise(host::OPEN_MESSAGE_INBOX),
	MethodDescriptor::promise(host::OPEN_REPOSITORY_BROWSER),
	MethodDescriptor::promise(host::OPEN_MODAL),
	MethodDescriptor::promise(host::SHOW_NOTIFICATION),
	MethodDescriptor::promise(host::CLOSE),
	MethodDescriptor::promise(host::NAVIGATED),
	MethodDescriptor::promise(host::PROVIDE_BREADCRUMBS),
];

/// Every optional method a tool may advertise.
pub static TOOL_METHODS: &[MethodDescriptor] = &[
	MethodDescriptor::promise(tool::HAS_UNSAVED_CHANGES),
	MethodDescriptor::promise(tool::NAVIGATE),
	MethodDescriptor::promise(tool::SAVE_STATE),
	MethodDescriptor::promise(tool::RESTORE_STATE),
];

/// Host methods addressing a single content item, by view and item type.
static ITEM_METHODS: &[(ItemView, ItemType, &str)] = &[
	(ItemView::Navigate, ItemType::Folder, host::NAVIGATE_TO_FOLDER),
	(ItemView::Navigate, ItemType::Page, host::NAVIGATE_TO_PAGE),
	(ItemView::Navigate, ItemType::File, host::NAVIGATE_TO_FILE),
	(ItemView::Navigate, ItemType::Image, host::NAVIGATE_TO_IMAGE),
	(ItemView::Properties, ItemType::Folder, host::OPEN_FOLDER_PROPERTIES),
	(ItemView::Properties, ItemType::Page, host::OPEN_PAGE_PROPERTIES),
	(ItemView::Properties, ItemType::File, host::OPEN_FILE_PROPERTIES),
	(ItemView::Properties, ItemType::Image, host::OPEN_IMAGE_PROPERTIES),
	(ItemView::ObjectProperties, ItemType::Folder, host::OPEN_FOLDER_OBJECT_PROPERTIES),
	(ItemView::ObjectProperties, ItemType::Page, host::OPEN_PAGE_OBJECT_PROPERTIES),
	(ItemView::ObjectProperties, ItemType::File, host::OPEN_FILE_OBJECT_PROPERTIES),
	(ItemView::ObjectProperties, ItemType::Image, host::OPEN_IMAGE_OBJECT_PROPERTIES),
	(ItemView::Preview, ItemType::Page, host::PREVIEW_PAGE),
	(ItemView::Preview, ItemType::File, host::PREVIEW_FILE),
	(ItemView::Preview, ItemType::Image, host::PREVIEW_IMAGE),
];

/// Host method name for showing `item_type` in `view`.
///
/// Folders have no preview, so `(Preview, Folder)` yields [`None`].
pub fn item_method(view: ItemView, item_type: ItemType) -> Option<&'static str> {
	ITEM_METHODS
		.iter()
		.find(|(v, t, _)| *v == view && *t == item_type)
		.map(|(_, _, name)| *name)
}

/// Inverse of [`item_method`].
pub fn parse_item_method(name: &str) -> Option<(ItemView, ItemType)> {
	ITEM_METHODS
		.iter()
		.find(|(_, _, n)| *n == name)
		.map(|(view, item_type, _)| (*view, *item_type))
}
