//! Tool descriptors as delivered by the metadata source.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Static description of an embeddable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
	/// Unique key, also the route segment under the tools overview.
	pub key: String,
	pub name: LocalizedText,
	/// Entry URL loaded into the iframe or the new tab.
	pub tool_url: String,
	/// Whether the tool opens in its own browser tab instead of inline.
	#[serde(default)]
	pub newtab: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub icon_url: Option<String>,
}

impl ToolDescriptor {
	pub fn new(
		key: impl Into<String>,
		name: impl Into<String>,
		tool_url: impl Into<String>,
	) -> Self {
		Self {
			key: key.into(),
			name: LocalizedText::Plain(name.into()),
			tool_url: tool_url.into(),
			newtab: false,
			icon_url: None,
		}
	}

	pub fn with_newtab(mut self, newtab: bool) -> Self {
		self.newtab = newtab;
		self
	}

	/// Display name for `language`, falling back to the key.
	pub fn display_name(&self, language: &str) -> &str {
		self.name.resolve(language).unwrap_or(&self.key)
	}
}

/// A display string, either language-independent or keyed by language code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
	Plain(String),
	Translated(BTreeMap<String, String>),
}

impl LocalizedText {
	/// Picks the translation for `language`, then English, then any entry.
	pub fn resolve(&self, language: &str) -> Option<&str> {
		match self {
			LocalizedText::Plain(text) => Some(text),
			LocalizedText::Translated(map) => map
				.get(language)
				.or_else(|| map.get("en"))
				.or_else(|| map.values().next())
				.map(String::as_str),
		}
	}
}
