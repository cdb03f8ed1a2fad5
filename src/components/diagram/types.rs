//! Diagram data structures: view rectangles, NAD metadata and the analysis
//! payloads consumed from the backend.

use std::collections::HashMap;

use serde::Deserialize;

use super::error::{Error, Result};

/// A rectangle in the diagram's own coordinate space.
///
/// Defines what is currently visible. `w` and `h` are always positive for a
/// rectangle produced by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ViewRect {
	/// Left edge.
	pub x: f64,
	/// Top edge.
	pub y: f64,
	/// Width.
	pub w: f64,
	/// Height.
	pub h: f64,
}

impl ViewRect {
	/// Unchecked constructor.
	pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
		Self { x, y, w, h }
	}

	/// Builds a rectangle only when both extents are strictly positive and finite.
	pub fn checked(x: f64, y: f64, w: f64, h: f64) -> Option<Self> {
		let finite = [x, y, w, h].iter().all(|v| v.is_finite());
		(finite && w > 0.0 && h > 0.0).then_some(Self { x, y, w, h })
	}

	/// Center point.
	pub fn center(&self) -> (f64, f64) {
		(self.x + self.w / 2.0, self.y + self.h / 2.0)
	}

	/// Larger of width and height.
	pub fn max_extent(&self) -> f64 {
		self.w.max(self.h)
	}

	/// Scale the rectangle by `factor` around the diagram-space point `(ax, ay)`.
	/// The point keeps its relative position inside the rectangle.
	pub fn scaled_about(&self, factor: f64, ax: f64, ay: f64) -> Self {
		Self {
			x: ax - (ax - self.x) * factor,
			y: ay - (ay - self.y) * factor,
			w: self.w * factor,
			h: self.h * factor,
		}
	}

	/// Same size, moved by `(dx, dy)`.
	pub fn translated(&self, dx: f64, dy: f64) -> Self {
		Self {
			x: self.x + dx,
			y: self.y + dy,
			..*self
		}
	}

	/// Value for an SVG `viewBox` attribute.
	pub fn to_view_box(&self) -> String {
		format!("{} {} {} {}", self.x, self.y, self.w, self.h)
	}
}

/// Label element descriptor attached to one end of an edge.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeInfo {
	/// Render id of the label group.
	pub svg_id: String,
	/// What the label shows, e.g. active power.
	#[serde(default)]
	pub info_type: Option<String>,
	/// Arrow direction of the flow.
	#[serde(default)]
	pub direction: Option<String>,
	/// Displayed value.
	#[serde(default)]
	pub label: Option<String>,
}

/// Metadata for one voltage-level node of the diagram.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMeta {
	/// Domain identity (voltage level id).
	pub equipment_id: String,
	/// Id of the rendered element.
	#[serde(rename = "svgId")]
	pub render_id: String,
	/// Diagram-space x.
	pub x: f64,
	/// Diagram-space y.
	pub y: f64,
	/// Render id of the node legend.
	#[serde(default)]
	pub legend_svg_id: Option<String>,
	/// Render id of the legend connector.
	#[serde(default)]
	pub legend_edge_svg_id: Option<String>,
}

impl NodeMeta {
	/// Render ids of the legend elements drawn for this node.
	pub fn legend_ids(&self) -> impl Iterator<Item = &str> {
		self.legend_svg_id
			.iter()
			.chain(self.legend_edge_svg_id.iter())
			.map(String::as_str)
	}
}

/// Metadata for one branch (line or transformer) of the diagram.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeMeta {
	/// Domain identity (line or transformer id).
	pub equipment_id: String,
	/// Id of the rendered element.
	#[serde(rename = "svgId")]
	pub render_id: String,
	/// Render id of the first endpoint node.
	pub node1: String,
	/// Render id of the second endpoint node.
	pub node2: String,
	/// Bus node at the first end.
	#[serde(default)]
	pub bus_node1: Option<String>,
	/// Bus node at the second end.
	#[serde(default)]
	pub bus_node2: Option<String>,
	/// Branch type as reported by the backend.
	#[serde(default, rename = "type")]
	pub kind: Option<String>,
	/// Label at the first end.
	#[serde(default)]
	pub edge_info1: Option<EdgeInfo>,
	/// Label at the second end.
	#[serde(default)]
	pub edge_info2: Option<EdgeInfo>,
}

impl EdgeMeta {
	/// Render ids of the flow-value label groups at both ends.
	pub fn label_ids(&self) -> impl Iterator<Item = &str> {
		self.edge_info1
			.iter()
			.chain(self.edge_info2.iter())
			.map(|info| info.svg_id.as_str())
	}
}

/// Node and edge lists as emitted next to the diagram markup. Either list may
/// be missing.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NodeEdgeRecord {
	/// Voltage-level nodes.
	#[serde(default)]
	pub nodes: Option<Vec<NodeMeta>>,
	/// Branches.
	#[serde(default)]
	pub edges: Option<Vec<EdgeMeta>>,
}

impl NodeEdgeRecord {
	/// Parse the serialized form of the record.
	pub fn from_json(text: &str) -> Result<Self> {
		serde_json::from_str(text).map_err(Error::MetadataParse)
	}
}

/// Metadata is delivered either already structured or as a JSON string.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Metadata {
	/// Structured record.
	Record(NodeEdgeRecord),
	/// JSON text of a [`NodeEdgeRecord`].
	Serialized(String),
}

impl Default for Metadata {
	fn default() -> Self {
		Metadata::Record(NodeEdgeRecord::default())
	}
}

impl Metadata {
	/// Resolve to a structured record. Fails only on malformed serialized text.
	pub fn to_record(&self) -> Result<NodeEdgeRecord> {
		match self {
			Metadata::Record(record) => Ok(record.clone()),
			Metadata::Serialized(text) => NodeEdgeRecord::from_json(text),
		}
	}
}

/// Sign category of a flow change, decided by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowCategory {
	/// Flow increased.
	Positive,
	/// Flow decreased.
	Negative,
	/// Change too small to call.
	Grey,
}

impl FlowCategory {
	/// Class applied to recolored edges.
	pub fn css_class(self) -> &'static str {
		match self {
			FlowCategory::Positive => "nad-delta-positive",
			FlowCategory::Negative => "nad-delta-negative",
			FlowCategory::Grey => "nad-delta-grey",
		}
	}

	/// Every category, for clearing.
	pub const ALL: [FlowCategory; 3] = [
		FlowCategory::Positive,
		FlowCategory::Negative,
		FlowCategory::Grey,
	];
}

/// Before/after flow change on one line.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct FlowDelta {
	/// Flow after minus flow before.
	pub delta: f64,
	/// Sign category.
	pub category: FlowCategory,
}

impl FlowDelta {
	/// Signed, one-decimal rendering used in place of the absolute flow.
	pub fn label(&self) -> String {
		let rounded = (self.delta * 10.0).round() / 10.0;
		// -0.0 compares equal to 0.0 and is printed through abs()
		if rounded >= 0.0 {
			format!("+{:.1}", rounded.abs())
		} else {
			format!("{:.1}", rounded)
		}
	}
}

/// Bus assignments touched by a remedial action, keyed by asset name.
/// A bus value of `-1` means the asset is disconnected.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ActionTopology {
	/// Extremity-side bus per line.
	#[serde(default)]
	pub lines_ex_bus: HashMap<String, i64>,
	/// Origin-side bus per line.
	#[serde(default)]
	pub lines_or_bus: HashMap<String, i64>,
	/// Bus per generator.
	#[serde(default)]
	pub gens_bus: HashMap<String, i64>,
	/// Bus per load.
	#[serde(default)]
	pub loads_bus: HashMap<String, i64>,
}

impl ActionTopology {
	/// Distinct line names from both line maps, sorted.
	pub fn line_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self
			.lines_or_bus
			.keys()
			.chain(self.lines_ex_bus.keys())
			.cloned()
			.collect();
		names.sort();
		names.dedup();
		names
	}

	/// Whether any line bus is listed.
	pub fn touches_lines(&self) -> bool {
		!self.lines_or_bus.is_empty() || !self.lines_ex_bus.is_empty()
	}

	/// Whether any generator or load bus is listed.
	pub fn touches_injections(&self) -> bool {
		!self.gens_bus.is_empty() || !self.loads_bus.is_empty()
	}

	/// Whether every listed asset is disconnected. False for an empty topology.
	pub fn all_disconnected(&self) -> bool {
		let mut values = self
			.lines_or_bus
			.values()
			.chain(self.lines_ex_bus.values())
			.chain(self.gens_bus.values())
			.chain(self.loads_bus.values())
			.peekable();
		values.peek().is_some() && values.all(|&bus| bus == -1)
	}

	/// Generator then load names, each group sorted.
	pub fn injection_names(&self) -> Vec<&str> {
		let mut gens: Vec<&str> = self.gens_bus.keys().map(String::as_str).collect();
		let mut loads: Vec<&str> = self.loads_bus.keys().map(String::as_str).collect();
		gens.sort_unstable();
		loads.sort_unstable();
		gens.extend(loads);
		gens
	}
}

/// One recommended action as returned by the analysis.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ActionDetail {
	/// Human-readable description.
	#[serde(default, rename = "description_unitaire")]
	pub description: String,
	/// Loading ratios of the overloaded lines before the action.
	#[serde(default)]
	pub rho_before: Option<Vec<Option<f64>>>,
	/// Loading ratios of the same lines after the action.
	#[serde(default)]
	pub rho_after: Option<Vec<Option<f64>>>,
	/// Highest loading ratio after the action.
	#[serde(default)]
	pub max_rho: Option<f64>,
	/// Line carrying [`max_rho`](Self::max_rho).
	#[serde(default)]
	pub max_rho_line: String,
	/// Whether the action lowers the worst loading.
	#[serde(default)]
	pub is_rho_reduction: bool,
	/// Bus changes applied by the action.
	#[serde(default, rename = "action_topology")]
	pub topology: Option<ActionTopology>,
}

impl ActionDetail {
	/// Maximum loading after the action, in percent.
	pub fn max_rho_percent(&self) -> Option<f64> {
		self.max_rho.map(|rho| rho * 100.0)
	}

	/// Lines whose bus assignment the action changes.
	pub fn touched_lines(&self) -> Vec<String> {
		self.topology
			.as_ref()
			.map(ActionTopology::line_names)
			.unwrap_or_default()
	}

	/// One-line description of the action's effect, e.g.
	/// `max loading 97.3% on LINE1; lines LINE1, LINE2`.
	pub fn summary(&self) -> String {
		let mut parts = Vec::new();
		if let Some(percent) = self.max_rho_percent() {
			parts.push(if self.max_rho_line.is_empty() {
				format!("max loading {:.1}%", percent)
			} else {
				format!("max loading {:.1}% on {}", percent, self.max_rho_line)
			});
		}
		let lines = self.touched_lines();
		if !lines.is_empty() {
			parts.push(format!("lines {}", lines.join(", ")));
		}
		parts.join("; ")
	}
}

/// Contingency analysis output used to drive overlays.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AnalysisResult {
	/// Line names overloaded in the contingency.
	#[serde(default, rename = "lines_overloaded")]
	pub overloaded_lines: Vec<String>,
	/// Recommended actions keyed by action id.
	#[serde(default)]
	pub actions: HashMap<String, ActionDetail>,
	/// Scores as sent, not interpreted here.
	#[serde(default)]
	pub action_scores: serde_json::Value,
	/// Status message from the analysis.
	#[serde(default)]
	pub message: Option<String>,
	/// Whether the analysis fell back to DC load flow.
	#[serde(default)]
	pub dc_fallback: bool,
	/// Path of the exported report, if any.
	#[serde(default)]
	pub pdf_path: Option<String>,
}

/// Diagram payload produced by the backend for one slot.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DiagramPayload {
	/// Raw SVG markup.
	#[serde(rename = "svg")]
	pub markup: String,
	/// Node and edge metadata.
	#[serde(default)]
	pub metadata: Metadata,
	/// Load-flow convergence.
	#[serde(default, rename = "lf_converged")]
	pub converged: Option<bool>,
	/// Load-flow status text.
	#[serde(default, rename = "lf_status")]
	pub status: Option<String>,
	/// Action this diagram shows, if any.
	#[serde(default)]
	pub action_id: Option<String>,
	/// Flow changes keyed by line id.
	#[serde(default)]
	pub flow_deltas: Option<HashMap<String, FlowDelta>>,
}

impl DiagramPayload {
	/// Parse a payload, failing with [`Error::PayloadParse`].
	pub fn from_json(text: &str) -> Result<Self> {
		serde_json::from_str(text).map_err(Error::PayloadParse)
	}
}

/// Nominal voltage of each voltage level plus the distinct values, ascending.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NominalVoltages {
	/// Nominal kV per voltage-level id.
	pub mapping: HashMap<String, f64>,
	/// Distinct finite values, ascending.
	#[serde(default, alias = "orderedUniqueKv")]
	pub ordered_unique_kv: Vec<f64>,
}

impl NominalVoltages {
	/// Build from the mapping alone, deriving the sorted values.
	pub fn from_mapping(mapping: HashMap<String, f64>) -> Self {
		let mut kv: Vec<f64> = mapping.values().copied().filter(|v| v.is_finite()).collect();
		kv.sort_by(f64::total_cmp);
		kv.dedup();
		Self {
			mapping,
			ordered_unique_kv: kv,
		}
	}

	/// Inclusive range covering every known level, or `None` when empty.
	pub fn full_range(&self) -> Option<(f64, f64)> {
		Some((
			*self.ordered_unique_kv.first()?,
			*self.ordered_unique_kv.last()?,
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn delta_label_is_signed_with_one_decimal() {
		let delta = |d| FlowDelta {
			delta: d,
			category: FlowCategory::Grey,
		};
		assert_eq!(delta(3.44).label(), "+3.4");
		assert_eq!(delta(-1.7).label(), "-1.7");
		assert_eq!(delta(0.0).label(), "+0.0");
		assert_eq!(delta(-0.04).label(), "+0.0");
	}

	#[test]
	fn payload_accepts_serialized_metadata() {
		let payload = DiagramPayload::from_json(
			r#"{
				"svg": "<svg viewBox=\"0 0 10 10\"></svg>",
				"metadata": "{\"nodes\":[{\"svgId\":\"0\",\"equipmentId\":\"VL1\",\"x\":1,\"y\":2}]}",
				"lf_converged": true,
				"flow_deltas": {"L1": {"delta": -1.7, "category": "negative"}}
			}"#,
		)
		.unwrap();
		let record = payload.metadata.to_record().unwrap();
		assert_eq!(record.nodes.unwrap()[0].equipment_id, "VL1");
		assert!(record.edges.is_none());
		assert_eq!(payload.converged, Some(true));
		let deltas = payload.flow_deltas.unwrap();
		assert_eq!(deltas["L1"].category, FlowCategory::Negative);
	}

	#[test]
	fn malformed_serialized_metadata_is_an_error() {
		let metadata = Metadata::Serialized("{nodes:".to_string());
		assert!(matches!(
			metadata.to_record(),
			Err(Error::MetadataParse(_))
		));
	}

	#[test]
	fn topology_classification_helpers() {
		let topo: ActionTopology = serde_json::from_str(
			r#"{"lines_or_bus": {"L2": -1, "L1": -1}, "lines_ex_bus": {"L1": -1}, "gens_bus": {"G1": -1}}"#,
		)
		.unwrap();
		assert_eq!(topo.line_names(), vec!["L1", "L2"]);
		assert!(topo.touches_lines());
		assert!(topo.touches_injections());
		assert!(topo.all_disconnected());
		assert!(!ActionTopology::default().all_disconnected());
	}

	#[test]
	fn action_detail_summarises_loading_and_touched_lines() {
		let detail: ActionDetail = serde_json::from_str(
			r#"{
				"description_unitaire": "Ouverture LINE2",
				"rho_before": [1.02, null],
				"max_rho": 0.973,
				"max_rho_line": "LINE1",
				"action_topology": {"lines_or_bus": {"LINE2": -1}, "lines_ex_bus": {"LINE1": 2}}
			}"#,
		)
		.unwrap();
		assert!((detail.max_rho_percent().unwrap() - 97.3).abs() < 1e-9);
		assert_eq!(detail.touched_lines(), vec!["LINE1", "LINE2"]);
		assert_eq!(detail.rho_before, Some(vec![Some(1.02), None]));
		assert_eq!(detail.summary(), "max loading 97.3% on LINE1; lines LINE1, LINE2");

		let empty = ActionDetail::default();
		assert_eq!(empty.max_rho_percent(), None);
		assert!(empty.touched_lines().is_empty());
		assert_eq!(empty.summary(), "");
	}

	#[test]
	fn nominal_voltages_are_sorted_and_unique() {
		let voltages = NominalVoltages::from_mapping(HashMap::from([
			("VL1".to_string(), 400.0),
			("VL2".to_string(), 63.0),
			("VL3".to_string(), 400.0),
		]));
		assert_eq!(voltages.ordered_unique_kv, vec![63.0, 400.0]);
		assert_eq!(voltages.full_range(), Some((63.0, 400.0)));
	}

	#[test]
	fn rect_scaling_keeps_anchor_fraction() {
		let rect = ViewRect::new(0.0, 0.0, 100.0, 50.0);
		let scaled = rect.scaled_about(0.5, 20.0, 10.0);
		assert_eq!(scaled, ViewRect::new(10.0, 5.0, 50.0, 25.0));
		assert!(ViewRect::checked(0.0, 0.0, 0.0, 1.0).is_none());
	}
}
