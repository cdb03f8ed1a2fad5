//! Lookup structures over diagram metadata.
//!
//! Built once per diagram content and never mutated afterwards, so a single
//! index can be shared by every overlay call of a slot.

use std::collections::HashMap;

use log::debug;

use super::error::Result;
use super::types::{EdgeMeta, Metadata, NodeEdgeRecord, NodeMeta};

/// O(1) access to nodes and edges by domain identity and by render identity.
#[derive(Clone, Debug, Default)]
pub struct MetadataIndex {
	nodes_by_equipment: HashMap<String, NodeMeta>,
	nodes_by_render: HashMap<String, NodeMeta>,
	edges_by_equipment: HashMap<String, EdgeMeta>,
	/// Node render id to the edges incident to it. An edge is listed under
	/// both of its endpoints.
	edges_by_node: HashMap<String, Vec<EdgeMeta>>,
}

impl MetadataIndex {
	/// Build the index from a metadata record. Missing lists yield empty maps.
	pub fn build(record: &NodeEdgeRecord) -> Self {
		let nodes = record.nodes.as_deref().unwrap_or_default();
		let edges = record.edges.as_deref().unwrap_or_default();

		let mut index = Self {
			nodes_by_equipment: HashMap::with_capacity(nodes.len()),
			nodes_by_render: HashMap::with_capacity(nodes.len()),
			edges_by_equipment: HashMap::with_capacity(edges.len()),
			edges_by_node: HashMap::with_capacity(nodes.len()),
		};

		for node in nodes {
			index
				.nodes_by_equipment
				.insert(node.equipment_id.clone(), node.clone());
			index
				.nodes_by_render
				.insert(node.render_id.clone(), node.clone());
		}

		for edge in edges {
			index
				.edges_by_equipment
				.insert(edge.equipment_id.clone(), edge.clone());
			for endpoint in [&edge.node1, &edge.node2] {
				index
					.edges_by_node
					.entry(endpoint.clone())
					.or_default()
					.push(edge.clone());
			}
		}

		debug!(
			"nad-viewport: indexed {} nodes, {} edges",
			index.nodes_by_equipment.len(),
			index.edges_by_equipment.len()
		);
		index
	}

	/// Build from metadata that may still be serialized. Malformed JSON is the
	/// only failure.
	pub fn from_metadata(metadata: &Metadata) -> Result<Self> {
		Ok(Self::build(&metadata.to_record()?))
	}

	/// Node by equipment id.
	pub fn node(&self, equipment_id: &str) -> Option<&NodeMeta> {
		self.nodes_by_equipment.get(equipment_id)
	}

	/// Node by render id.
	pub fn node_by_render_id(&self, render_id: &str) -> Option<&NodeMeta> {
		self.nodes_by_render.get(render_id)
	}

	/// Edge by equipment id.
	pub fn edge(&self, equipment_id: &str) -> Option<&EdgeMeta> {
		self.edges_by_equipment.get(equipment_id)
	}

	/// Edges incident to the node with the given render id.
	pub fn edges_at(&self, node_render_id: &str) -> &[EdgeMeta] {
		self.edges_by_node
			.get(node_render_id)
			.map(Vec::as_slice)
			.unwrap_or_default()
	}

	/// Whether a node with this equipment id exists.
	pub fn has_node(&self, equipment_id: &str) -> bool {
		self.nodes_by_equipment.contains_key(equipment_id)
	}

	/// Whether an edge with this equipment id exists.
	pub fn has_edge(&self, equipment_id: &str) -> bool {
		self.edges_by_equipment.contains_key(equipment_id)
	}

	/// All nodes, unordered.
	pub fn nodes(&self) -> impl Iterator<Item = &NodeMeta> {
		self.nodes_by_equipment.values()
	}

	/// All edges, unordered.
	pub fn edges(&self) -> impl Iterator<Item = &EdgeMeta> {
		self.edges_by_equipment.values()
	}

	/// Number of indexed nodes.
	pub fn node_count(&self) -> usize {
		self.nodes_by_equipment.len()
	}

	/// Number of indexed edges.
	pub fn edge_count(&self) -> usize {
		self.edges_by_equipment.len()
	}

	/// Whether neither nodes nor edges are indexed.
	pub fn is_empty(&self) -> bool {
		self.nodes_by_equipment.is_empty() && self.edges_by_equipment.is_empty()
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;

	pub(crate) fn node(equipment_id: &str, render_id: &str, x: f64, y: f64) -> NodeMeta {
		NodeMeta {
			equipment_id: equipment_id.to_string(),
			render_id: render_id.to_string(),
			x,
			y,
			legend_svg_id: None,
			legend_edge_svg_id: None,
		}
	}

	pub(crate) fn edge(equipment_id: &str, render_id: &str, node1: &str, node2: &str) -> EdgeMeta {
		EdgeMeta {
			equipment_id: equipment_id.to_string(),
			render_id: render_id.to_string(),
			node1: node1.to_string(),
			node2: node2.to_string(),
			bus_node1: None,
			bus_node2: None,
			kind: None,
			edge_info1: None,
			edge_info2: None,
		}
	}

	#[test]
	fn absent_or_empty_lists_build_empty_maps() {
		for json in ["{}", r#"{"nodes":[]}"#, r#"{"edges":[]}"#, r#"{"nodes":null,"edges":null}"#] {
			let index = MetadataIndex::from_metadata(&Metadata::Serialized(json.to_string())).unwrap();
			assert!(index.is_empty(), "{json}");
			assert!(index.edges_at("A").is_empty());
		}
		assert!(MetadataIndex::build(&NodeEdgeRecord::default()).is_empty());
	}

	#[test]
	fn edges_are_listed_under_both_endpoints() {
		let record = NodeEdgeRecord {
			nodes: None,
			edges: Some(vec![edge("E1", "10", "A", "B"), edge("E2", "11", "A", "C")]),
		};
		let index = MetadataIndex::build(&record);
		assert_eq!(index.edges_at("A").len(), 2);
		assert_eq!(index.edges_at("B").len(), 1);
		assert_eq!(index.edges_at("C").len(), 1);
		assert_eq!(index.edges_at("B")[0].equipment_id, "E1");
	}

	#[test]
	fn self_loop_is_listed_twice_in_its_bucket() {
		let record = NodeEdgeRecord {
			nodes: None,
			edges: Some(vec![edge("E1", "10", "A", "A")]),
		};
		assert_eq!(MetadataIndex::build(&record).edges_at("A").len(), 2);
	}

	#[test]
	fn nodes_resolve_by_both_identities() {
		let record = NodeEdgeRecord {
			nodes: Some(vec![node("VL1", "0", 1.0, 2.0)]),
			edges: None,
		};
		let index = MetadataIndex::build(&record);
		assert_eq!(index.node("VL1").unwrap().render_id, "0");
		assert_eq!(index.node_by_render_id("0").unwrap().equipment_id, "VL1");
		assert!(index.node("0").is_none());
		assert_eq!(index.node_count(), 1);
	}
}
