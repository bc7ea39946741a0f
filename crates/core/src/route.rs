//! Classification of host routes relative to the tools overview.

/// What a host route means for tool activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolRoute<'a> {
	/// `<tools>/<key>[/<subpath>]`
	Tool { key: &'a str, subpath: &'a str },
	/// `<tools>` itself.
	Overview,
	/// Anything outside the tools area.
	Other,
}

impl<'a> ToolRoute<'a> {
	/// Classifies `path` (query and fragment ignored) against `tools_route`.
	pub fn parse(path: &'a str, tools_route: &str) -> Self {
		let path = path.split(['?', '#']).next().unwrap_or_default();
		let base = tools_route.trim_end_matches('/');

		let Some(rest) = path.strip_prefix(base) else {
			return ToolRoute::Other;
		};
		if !(rest.is_empty() || rest.starts_with('/')) {
			return ToolRoute::Other;
		}

		let rest = rest.trim_matches('/');
		if rest.is_empty() {
			return ToolRoute::Overview;
		}

		match rest.split_once('/') {
			Some((key, subpath)) => ToolRoute::Tool {
				key,
				subpath: subpath.trim_end_matches('/'),
			},
			None => ToolRoute::Tool {
				key: rest,
				subpath: "",
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classifies_tool_routes() {
		assert_eq!(
			ToolRoute::parse("/tools/linkchecker", "/tools"),
			ToolRoute::Tool {
				key: "linkchecker",
				subpath: ""
			}
		);
		assert_eq!(
			ToolRoute::parse("/tools/linkchecker/reports/12/?sort=asc", "/tools"),
			ToolRoute::Tool {
				key: "linkchecker",
				subpath: "reports/12"
			}
		);
	}

	#[test]
	fn classifies_overview_and_other_routes() {
		assert_eq!(ToolRoute::parse("/tools", "/tools"), ToolRoute::Overview);
		assert_eq!(ToolRoute::parse("/tools/", "/tools/"), ToolRoute::Overview);
		assert_eq!(ToolRoute::parse("/toolshed", "/tools"), ToolRoute::Other);
		assert_eq!(ToolRoute::parse("/editor/1", "/tools"), ToolRoute::Other);
	}
}
