//! Semantic overlays drawn on top of a rendered diagram.
//!
//! Every `apply_*` function first removes what a previous call of the same
//! kind added, then applies the new state from scratch. Missing index or data
//! simply leaves the diagram clean. Identifiers that do not resolve are
//! skipped one by one.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::action_target::{ActionTarget, resolve_action_target};
use super::index::MetadataIndex;
use super::surface::{DiagramSurface, matrix_attribute};
use super::types::{ActionDetail, FlowCategory, FlowDelta, NominalVoltages};

/// Marker class on overloaded line elements.
pub const OVERLOADED_CLASS: &str = "nad-overloaded";
/// Marker class on halo clones.
pub const HALO_CLASS: &str = "nad-action-target";
/// Id of the background group holding halo clones.
pub const HALO_LAYER_ID: &str = "nad-halo-layer";
/// Marker class on flow labels currently showing a delta.
pub const DELTA_LABEL_CLASS: &str = "nad-delta-label";

/// Label text as it was before the first delta overwrite.
const ORIGINAL_TEXT_ATTR: &str = "data-nad-original";

/// Mark the edge of every overloaded line. Returns the number of elements marked.
pub fn apply_overloads<S: DiagramSurface>(surface: &S, index: Option<&MetadataIndex>, lines: &[String]) -> usize {
	clear_overloads(surface);
	let Some(index) = index else {
		return 0;
	};
	let mut marked = 0;
	for line in lines {
		let Some(el) = index.edge(line).and_then(|edge| surface.find(&edge.render_id)) else {
			continue;
		};
		surface.add_class(&el, OVERLOADED_CLASS);
		marked += 1;
	}
	debug!("nad-viewport: {} of {} overloaded lines marked", marked, lines.len());
	marked
}

/// Remove every overload marker.
pub fn clear_overloads<S: DiagramSurface>(surface: &S) {
	for el in surface.elements_with_class(OVERLOADED_CLASS) {
		surface.remove_class(&el, OVERLOADED_CLASS);
	}
}

/// Resolve the target of `action_id` and draw its halo.
pub fn highlight_action<S: DiagramSurface>(
	surface: &S,
	index: Option<&MetadataIndex>,
	action_id: &str,
	detail: Option<&ActionDetail>,
) -> Option<ActionTarget> {
	let Some(index) = index else {
		clear_action_halo(surface);
		return None;
	};
	let target = resolve_action_target(
		detail.and_then(|d| d.topology.as_ref()),
		detail.map_or("", |d| d.description.as_str()),
		action_id,
		index,
	);
	if target.is_none() {
		debug!("nad-viewport: no diagram target for action {}", action_id);
	}
	render_action_halo(surface, Some(index), target.as_ref());
	target
}

/// Draw background clones of the target's elements.
///
/// Clones live in a layer inserted as the root's first child, so they paint
/// behind every real element. Each clone's transform maps its source's local
/// space to the screen, then back into the layer's space, which keeps it
/// aligned whatever the source's nesting. Returns the number of clones drawn;
/// nothing is drawn while the tree has no screen matrix.
pub fn render_action_halo<S: DiagramSurface>(
	surface: &S,
	index: Option<&MetadataIndex>,
	target: Option<&ActionTarget>,
) -> usize {
	clear_action_halo(surface);
	let (Some(index), Some(target)) = (index, target) else {
		return 0;
	};
	let render_ids: Vec<&str> = match target {
		ActionTarget::Node(id) => index.node(id).map(|n| n.render_id.as_str()).into_iter().collect(),
		ActionTarget::Lines(ids) => ids
			.iter()
			.filter_map(|id| index.edge(id))
			.map(|e| e.render_id.as_str())
			.collect(),
	};
	let sources: Vec<S::Element> = render_ids.into_iter().filter_map(|id| surface.find(id)).collect();
	if sources.is_empty() {
		return 0;
	}

	let Some(layer) = surface.background_layer(HALO_LAYER_ID) else {
		return 0;
	};
	let Some(to_layer) = surface.screen_ctm(&layer).and_then(|ctm| ctm.inverse()) else {
		debug!("nad-viewport: halo skipped, diagram has no screen matrix");
		return 0;
	};

	let mut drawn = 0;
	for source in &sources {
		let Some(ctm) = surface.screen_ctm(source) else {
			continue;
		};
		let Some(copy) = surface.clone_without_ids(source) else {
			continue;
		};
		surface.add_class(&copy, HALO_CLASS);
		surface.set_attribute(&copy, "transform", &matrix_attribute(&ctm.then(&to_layer)));
		surface.append_child(&layer, &copy);
		drawn += 1;
	}
	drawn
}

/// Empty the halo layer.
pub fn clear_action_halo<S: DiagramSurface>(surface: &S) {
	if let Some(layer) = surface.find(HALO_LAYER_ID) {
		surface.clear_children(&layer);
	}
}

/// Recolor lines by flow change and show the change in their flow labels.
///
/// With `active == false` or without deltas the diagram is restored to its
/// absolute flows. Returns the number of lines recolored.
pub fn apply_delta_flows<S: DiagramSurface>(
	surface: &S,
	index: Option<&MetadataIndex>,
	deltas: Option<&HashMap<String, FlowDelta>>,
	active: bool,
) -> usize {
	clear_delta_flows(surface);
	let (Some(index), Some(deltas), true) = (index, deltas, active) else {
		return 0;
	};

	let mut recolored = 0;
	for (line, delta) in deltas {
		let Some(edge) = index.edge(line) else {
			continue;
		};
		if let Some(el) = surface.find(&edge.render_id) {
			surface.add_class(&el, delta.category.css_class());
			recolored += 1;
		}
		let text = delta.label();
		for label in edge.label_ids().filter_map(|id| surface.find(id)) {
			if surface.attribute(&label, ORIGINAL_TEXT_ATTR).is_none() {
				let original = surface.label_text(&label).unwrap_or_default();
				surface.set_attribute(&label, ORIGINAL_TEXT_ATTR, &original);
			}
			surface.set_label_text(&label, &text);
			surface.add_class(&label, DELTA_LABEL_CLASS);
		}
	}
	debug!("nad-viewport: {} lines recolored by flow delta", recolored);
	recolored
}

/// Remove delta colors and put the original label text back.
pub fn clear_delta_flows<S: DiagramSurface>(surface: &S) {
	for category in FlowCategory::ALL {
		let class = category.css_class();
		for el in surface.elements_with_class(class) {
			surface.remove_class(&el, class);
		}
	}
	for label in surface.elements_with_class(DELTA_LABEL_CLASS) {
		if let Some(original) = surface.attribute(&label, ORIGINAL_TEXT_ATTR) {
			surface.set_label_text(&label, &original);
			surface.remove_attribute(&label, ORIGINAL_TEXT_ATTR);
		}
		surface.remove_class(&label, DELTA_LABEL_CLASS);
	}
}

/// Show only voltage levels whose nominal kV lies in `range` (inclusive).
///
/// A node is hidden with its legends when its kV is known and outside the
/// range. An edge is hidden with its flow labels only when both endpoints are
/// hidden. With no range or no voltages everything indexed is shown again.
/// Returns the number of hidden nodes.
pub fn apply_voltage_filter<S: DiagramSurface>(
	surface: &S,
	index: Option<&MetadataIndex>,
	voltages: Option<&NominalVoltages>,
	range: Option<(f64, f64)>,
) -> usize {
	let Some(index) = index else {
		return 0;
	};
	let elements: HashMap<String, S::Element> = surface.elements_with_ids().into_iter().collect();
	let set = |id: &str, hidden: bool| {
		if let Some(el) = elements.get(id) {
			surface.set_hidden(el, hidden);
		}
	};

	let bounds = range.map(|(a, b)| (a.min(b), a.max(b)));
	let outside = |equipment_id: &str| match (voltages, bounds) {
		(Some(voltages), Some((min, max))) => voltages
			.mapping
			.get(equipment_id)
			.is_some_and(|kv| *kv < min || *kv > max),
		_ => false,
	};

	let mut hidden_nodes: HashSet<&str> = HashSet::new();
	for node in index.nodes() {
		let hidden = outside(&node.equipment_id);
		if hidden {
			hidden_nodes.insert(node.render_id.as_str());
		}
		set(&node.render_id, hidden);
		for legend in node.legend_ids() {
			set(legend, hidden);
		}
	}

	for edge in index.edges() {
		let hidden = hidden_nodes.contains(edge.node1.as_str()) && hidden_nodes.contains(edge.node2.as_str());
		set(&edge.render_id, hidden);
		for label in edge.label_ids() {
			set(label, hidden);
		}
	}

	debug!(
		"nad-viewport: voltage filter {:?} hides {} of {} nodes",
		bounds,
		hidden_nodes.len(),
		index.node_count()
	);
	hidden_nodes.len()
}

/// Remove every overlay this module draws.
pub fn clear_overlays<S: DiagramSurface>(surface: &S, index: Option<&MetadataIndex>) {
	clear_overloads(surface);
	clear_action_halo(surface);
	clear_delta_flows(surface);
	apply_voltage_filter(surface, index, None, None);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::diagram::headless::HeadlessSurface;
	use crate::components::diagram::index::tests::{edge, node};
	use crate::components::diagram::types::{ActionTopology, EdgeInfo, NodeEdgeRecord};

	const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
		<g class="nad-vl-nodes">
			<g id="n0" transform="translate(10,10)"><circle r="5"/></g>
			<g id="n1" transform="translate(50,50)"><circle r="5"/></g>
			<g id="n2" transform="translate(90,90)"><circle r="5"/></g>
		</g>
		<g class="nad-legend"><g id="leg2"><text>VLC</text></g></g>
		<g class="nad-branch-edges">
			<g id="e10"><polyline points="10,10 50,50"/></g>
			<g id="e11"><polyline points="50,50 90,90"/></g>
		</g>
		<g class="nad-edge-infos">
			<g id="i1" transform="translate(30,30)"><text>120.5</text></g>
			<g id="i2" transform="translate(40,40)"><text>-118.9</text></g>
			<g id="i3" transform="translate(70,70)"><text>35.0</text></g>
		</g>
	</svg>"#;

	fn info(id: &str) -> Option<EdgeInfo> {
		Some(EdgeInfo {
			svg_id: id.to_string(),
			..Default::default()
		})
	}

	fn index() -> MetadataIndex {
		let mut vlc = node("VLC", "n2", 90.0, 90.0);
		vlc.legend_svg_id = Some("leg2".to_string());
		let mut line1 = edge("LINE1", "e10", "n0", "n1");
		line1.edge_info1 = info("i1");
		line1.edge_info2 = info("i2");
		let mut line2 = edge("LINE2", "e11", "n1", "n2");
		line2.edge_info1 = info("i3");
		MetadataIndex::build(&NodeEdgeRecord {
			nodes: Some(vec![node("VLA", "n0", 10.0, 10.0), node("VLB", "n1", 50.0, 50.0), vlc]),
			edges: Some(vec![line1, line2]),
		})
	}

	fn surface(size: f64) -> HeadlessSurface {
		HeadlessSurface::parse(SVG, size, size).unwrap()
	}

	fn el(surface: &HeadlessSurface, id: &str) -> usize {
		surface.find(id).unwrap()
	}

	#[test]
	fn overloads_replace_previous_markers_and_skip_unknown_lines() {
		let (surface, index) = (surface(100.0), index());
		let marked = apply_overloads(&surface, Some(&index), &["LINE1".to_string(), "GHOST".to_string()]);
		assert_eq!(marked, 1);
		assert!(surface.has_class(&el(&surface, "e10"), OVERLOADED_CLASS));

		apply_overloads(&surface, Some(&index), &["LINE2".to_string()]);
		assert_eq!(surface.elements_with_class(OVERLOADED_CLASS), vec![el(&surface, "e11")]);

		assert_eq!(apply_overloads(&surface, None, &["LINE2".to_string()]), 0);
		assert!(surface.elements_with_class(OVERLOADED_CLASS).is_empty());
	}

	#[test]
	fn halo_clone_is_placed_in_layer_space_without_ids() {
		// 200px container over a 100-unit viewBox: the screen matrix scales by 2
		let (surface, index) = (surface(200.0), index());
		let ids_before = surface.elements_with_ids().len();

		let drawn = render_action_halo(&surface, Some(&index), Some(&ActionTarget::Node("VLB".into())));
		assert_eq!(drawn, 1);

		let layer = el(&surface, HALO_LAYER_ID);
		assert_eq!(surface.children(&surface.root().unwrap())[0], layer);
		let clones = surface.children(&layer);
		assert_eq!(clones.len(), 1);
		assert!(surface.has_class(&clones[0], HALO_CLASS));
		assert!(surface.attribute(&clones[0], "id").is_none());
		assert_eq!(
			surface.attribute(&clones[0], "transform").as_deref(),
			Some("matrix(1 0 0 1 50 50)")
		);
		// only the layer itself adds an id
		assert_eq!(surface.elements_with_ids().len(), ids_before + 1);
		assert!(!surface.has_class(&el(&surface, "n1"), HALO_CLASS));
	}

	#[test]
	fn halo_is_replaced_and_cleared() {
		let (surface, index) = (surface(100.0), index());
		let lines = ActionTarget::Lines(vec!["LINE1".into(), "LINE2".into(), "GHOST".into()]);
		assert_eq!(render_action_halo(&surface, Some(&index), Some(&lines)), 2);
		assert_eq!(render_action_halo(&surface, Some(&index), Some(&lines)), 2);
		assert_eq!(surface.children(&el(&surface, HALO_LAYER_ID)).len(), 2);

		clear_action_halo(&surface);
		assert!(surface.children(&el(&surface, HALO_LAYER_ID)).is_empty());
	}

	#[test]
	fn halo_is_abandoned_without_layout() {
		let surface = surface(100.0).without_layout();
		let drawn = render_action_halo(&surface, Some(&index()), Some(&ActionTarget::Node("VLA".into())));
		assert_eq!(drawn, 0);
		assert!(surface.elements_with_class(HALO_CLASS).is_empty());
	}

	#[test]
	fn highlight_action_resolves_then_draws() {
		let (surface, index) = (surface(100.0), index());
		let detail = ActionDetail {
			description: "Ouverture du couplage 'VLC'".to_string(),
			topology: Some(ActionTopology::default()),
			..Default::default()
		};
		let target = highlight_action(&surface, Some(&index), "act_1", Some(&detail));
		assert_eq!(target, Some(ActionTarget::Node("VLC".into())));
		assert_eq!(surface.elements_with_class(HALO_CLASS).len(), 1);

		assert_eq!(highlight_action(&surface, Some(&index), "nothing", None), None);
		assert!(surface.elements_with_class(HALO_CLASS).is_empty());
	}

	#[test]
	fn delta_labels_are_cached_and_restored_verbatim() {
		let (surface, index) = (surface(100.0), index());
		let deltas = HashMap::from([
			(
				"LINE1".to_string(),
				FlowDelta {
					delta: 3.44,
					category: FlowCategory::Positive,
				},
			),
			(
				"GHOST".to_string(),
				FlowDelta {
					delta: -1.0,
					category: FlowCategory::Negative,
				},
			),
		]);

		assert_eq!(apply_delta_flows(&surface, Some(&index), Some(&deltas), true), 1);
		assert!(surface.has_class(&el(&surface, "e10"), "nad-delta-positive"));
		assert_eq!(surface.label_text(&el(&surface, "i1")).as_deref(), Some("+3.4"));
		assert_eq!(surface.label_text(&el(&surface, "i2")).as_deref(), Some("+3.4"));
		assert_eq!(surface.label_text(&el(&surface, "i3")).as_deref(), Some("35.0"));

		// re-applying must not cache the delta text as the original
		apply_delta_flows(&surface, Some(&index), Some(&deltas), true);
		apply_delta_flows(&surface, Some(&index), Some(&deltas), false);
		assert_eq!(surface.label_text(&el(&surface, "i1")).as_deref(), Some("120.5"));
		assert_eq!(surface.label_text(&el(&surface, "i2")).as_deref(), Some("-118.9"));
		assert!(surface.attribute(&el(&surface, "i1"), ORIGINAL_TEXT_ATTR).is_none());
		assert!(!surface.has_class(&el(&surface, "e10"), "nad-delta-positive"));
	}

	#[test]
	fn voltage_filter_hides_edges_only_when_both_ends_are_hidden() {
		let (surface, index) = (surface(100.0), index());
		let voltages = NominalVoltages::from_mapping(HashMap::from([
			("VLA".to_string(), 63.0),
			("VLB".to_string(), 225.0),
			("VLC".to_string(), 400.0),
		]));

		let hidden = apply_voltage_filter(&surface, Some(&index), Some(&voltages), Some((200.0, 400.0)));
		assert_eq!(hidden, 1);
		assert!(surface.is_hidden(&el(&surface, "n0")));
		assert!(!surface.is_hidden(&el(&surface, "e10")));

		let hidden = apply_voltage_filter(&surface, Some(&index), Some(&voltages), Some((300.0, 400.0)));
		assert_eq!(hidden, 2);
		assert!(surface.is_hidden(&el(&surface, "n0")));
		assert!(surface.is_hidden(&el(&surface, "n1")));
		assert!(!surface.is_hidden(&el(&surface, "n2")));
		assert!(surface.is_hidden(&el(&surface, "e10")));
		assert!(surface.is_hidden(&el(&surface, "i1")));
		assert!(surface.is_hidden(&el(&surface, "i2")));
		assert!(!surface.is_hidden(&el(&surface, "e11")));
		assert!(!surface.is_hidden(&el(&surface, "i3")));

		apply_voltage_filter(&surface, Some(&index), Some(&voltages), Some((10.0, 100.0)));
		assert!(surface.is_hidden(&el(&surface, "leg2")));
		assert!(!surface.is_hidden(&el(&surface, "n0")));
	}

	#[test]
	fn clearing_overlays_restores_the_plain_diagram() {
		let (surface, index) = (surface(100.0), index());
		let voltages = NominalVoltages::from_mapping(HashMap::from([("VLA".to_string(), 63.0)]));
		apply_voltage_filter(&surface, Some(&index), Some(&voltages), Some((100.0, 400.0)));
		apply_overloads(&surface, Some(&index), &["LINE1".to_string()]);

		clear_overlays(&surface, Some(&index));
		assert!(!surface.is_hidden(&el(&surface, "n0")));
		assert!(surface.elements_with_class(OVERLOADED_CLASS).is_empty());
	}
}
