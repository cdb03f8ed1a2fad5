//! Mapping a remedial action onto the diagram element it acts on.
//!
//! Actions arrive as a bus topology plus free text, neither of which names a
//! rendered element directly. Resolution is best-effort and follows a fixed
//! fallback order; changing the order changes which element gets the halo for
//! ambiguous actions.

use std::sync::OnceLock;

use regex::Regex;

use super::index::MetadataIndex;
use super::types::ActionTopology;

/// Where an action applies: one voltage level or a set of lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionTarget {
	/// Equipment id of a voltage-level node.
	Node(String),
	/// Equipment ids of line edges.
	Lines(Vec<String>),
}

/// Characters ending the leading segment of generator and load names.
const NAME_SEPARATORS: [char; 2] = ['_', '.'];

fn quoted_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r#"'([^']+)'|"([^"]+)""#).expect("valid regex"))
}

fn substation_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| {
		Regex::new(r#"(?i)\b(?:in substation|dans le poste)\s+['"]?([^\s'",;]+)"#).expect("valid regex")
	})
}

/// Resolve the target of an action.
///
/// Order:
/// 1. a topology touching lines only, or disconnecting every listed asset,
///    targets its lines;
/// 2. the last quoted substring of the description naming a known node;
/// 3. an "in substation X" phrase naming a known node;
/// 4. a generator or load name, minus its leading segment, naming a known node;
/// 5. the last `_` token of the action id naming a known node;
/// 6. that same token naming a known edge.
pub fn resolve_action_target(
	topology: Option<&ActionTopology>,
	description: &str,
	action_id: &str,
	index: &MetadataIndex,
) -> Option<ActionTarget> {
	if let Some(lines) = topology.and_then(line_target) {
		return Some(ActionTarget::Lines(lines));
	}

	if let Some(node) = resolve_node(topology, description, action_id, index) {
		return Some(ActionTarget::Node(node));
	}

	let token = last_token(action_id)?;
	index
		.has_edge(token)
		.then(|| ActionTarget::Lines(vec![token.to_string()]))
}

fn line_target(topology: &ActionTopology) -> Option<Vec<String>> {
	if !topology.touches_lines() {
		return None;
	}
	(!topology.touches_injections() || topology.all_disconnected()).then(|| topology.line_names())
}

fn resolve_node(
	topology: Option<&ActionTopology>,
	description: &str,
	action_id: &str,
	index: &MetadataIndex,
) -> Option<String> {
	let quoted: Vec<&str> = quoted_regex()
		.captures_iter(description)
		.filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
		.map(|m| m.as_str().trim())
		.collect();
	if let Some(found) = quoted.into_iter().rev().find(|q| index.has_node(q)) {
		return Some(found.to_string());
	}

	if let Some(found) = substation_regex()
		.captures_iter(description)
		.filter_map(|caps| caps.get(1))
		.map(|m| m.as_str())
		.find(|name| index.has_node(name))
	{
		return Some(found.to_string());
	}

	if let Some(found) = topology
		.into_iter()
		.flat_map(ActionTopology::injection_names)
		.filter_map(|name| name.split_once(NAME_SEPARATORS).map(|(_, rest)| rest))
		.find(|rest| index.has_node(rest))
	{
		return Some(found.to_string());
	}

	last_token(action_id)
		.filter(|token| index.has_node(token))
		.map(str::to_string)
}

fn last_token(action_id: &str) -> Option<&str> {
	action_id.rsplit('_').next().filter(|t| !t.is_empty())
}
