//! In-memory diagram surface.
//!
//! Parses diagram markup into a small element arena and answers the same
//! queries a browser would: screen matrices follow the `viewBox` with
//! `preserveAspectRatio="xMidYMid meet"` for a fixed container size, composed
//! with every ancestor `transform`.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::str::FromStr;

use euclid::default::Transform2D;

use super::surface::{DiagramSurface, ScreenMatrix, svg_matrix};
use super::types::ViewRect;

/// Handle to an element of a [`HeadlessSurface`].
pub type NodeId = usize;

#[derive(Clone, Debug, Default)]
struct ElementData {
	tag: String,
	attrs: BTreeMap<String, String>,
	text: String,
	children: Vec<NodeId>,
	parent: Option<NodeId>,
}

impl ElementData {
	fn classes(&self) -> impl Iterator<Item = &str> {
		self.attrs
			.get("class")
			.map(|c| c.split_whitespace())
			.into_iter()
			.flatten()
	}
}

/// A parsed diagram held in memory, sized as if laid out in a container of
/// `width × height` pixels at the screen origin.
pub struct HeadlessSurface {
	nodes: RefCell<Vec<ElementData>>,
	root: Option<NodeId>,
	size: Option<(f64, f64)>,
}

impl HeadlessSurface {
	/// A container with no diagram rendered yet.
	pub fn empty(width: f64, height: f64) -> Self {
		Self {
			nodes: RefCell::new(Vec::new()),
			root: None,
			size: Some((width, height)),
		}
	}

	/// Parse markup into a container of the given pixel size.
	pub fn parse(markup: &str, width: f64, height: f64) -> Result<Self, roxmltree::Error> {
		let doc = roxmltree::Document::parse(markup)?;
		let mut nodes = Vec::new();
		let root = copy_element(doc.root_element(), None, &mut nodes);
		Ok(Self {
			nodes: RefCell::new(nodes),
			root: Some(root),
			size: Some((width, height)),
		})
	}

	/// Simulate a container without layout (not attached to the page).
	pub fn without_layout(mut self) -> Self {
		self.size = None;
		self
	}

	/// Current `viewBox` of the root.
	pub fn view_box(&self) -> Option<ViewRect> {
		let root = self.root?;
		let value = self.attribute(&root, "viewBox")?;
		let parts: Vec<f64> = value
			.split(|c: char| c == ',' || c.is_whitespace())
			.filter(|p| !p.is_empty())
			.map(str::parse)
			.collect::<Result<_, _>>()
			.ok()?;
		match parts.as_slice() {
			&[x, y, w, h] => ViewRect::checked(x, y, w, h),
			_ => None,
		}
	}

	/// Element children in document order.
	pub fn children(&self, el: &NodeId) -> Vec<NodeId> {
		self.nodes
			.borrow()
			.get(*el)
			.map(|n| n.children.clone())
			.unwrap_or_default()
	}

	/// Local tag name.
	pub fn tag(&self, el: &NodeId) -> Option<String> {
		self.nodes.borrow().get(*el).map(|n| n.tag.clone())
	}

	fn local_transform(&self, el: NodeId) -> ScreenMatrix {
		self.nodes
			.borrow()
			.get(el)
			.and_then(|n| n.attrs.get("transform").cloned())
			.and_then(|t| svgtypes::Transform::from_str(&t).ok())
			.map(|t| svg_matrix(t.a, t.b, t.c, t.d, t.e, t.f))
			.unwrap_or_else(Transform2D::identity)
	}

	/// viewBox → screen for the root, `xMidYMid meet`.
	fn root_matrix(&self) -> Option<ScreenMatrix> {
		let (cw, ch) = self.size?;
		let vb = self.view_box()?;
		let scale = (cw / vb.w).min(ch / vb.h);
		let tx = (cw - vb.w * scale) / 2.0 - vb.x * scale;
		let ty = (ch - vb.h * scale) / 2.0 - vb.y * scale;
		Some(svg_matrix(scale, 0.0, 0.0, scale, tx, ty))
	}

	fn is_attached(&self, el: NodeId) -> bool {
		let nodes = self.nodes.borrow();
		let mut current = Some(el);
		while let Some(id) = current {
			if Some(id) == self.root {
				return true;
			}
			current = nodes.get(id).and_then(|n| n.parent);
		}
		false
	}

	fn descendants(&self, from: NodeId) -> Vec<NodeId> {
		let nodes = self.nodes.borrow();
		let mut out = Vec::new();
		let mut stack = vec![from];
		while let Some(id) = stack.pop() {
			out.push(id);
			if let Some(n) = nodes.get(id) {
				stack.extend(n.children.iter().rev());
			}
		}
		out
	}

	fn attached_elements(&self) -> Vec<NodeId> {
		self.root.map(|r| self.descendants(r)).unwrap_or_default()
	}

	fn deep_copy(&self, el: NodeId, parent: Option<NodeId>) -> NodeId {
		let mut data = self.nodes.borrow()[el].clone();
		let children = std::mem::take(&mut data.children);
		data.attrs.remove("id");
		data.parent = parent;
		let id = {
			let mut nodes = self.nodes.borrow_mut();
			nodes.push(data);
			nodes.len() - 1
		};
		let copies: Vec<NodeId> = children
			.into_iter()
			.map(|child| self.deep_copy(child, Some(id)))
			.collect();
		self.nodes.borrow_mut()[id].children = copies;
		id
	}
}

fn copy_element(node: roxmltree::Node<'_, '_>, parent: Option<NodeId>, out: &mut Vec<ElementData>) -> NodeId {
	let id = out.len();
	out.push(ElementData {
		tag: node.tag_name().name().to_string(),
		attrs: node
			.attributes()
			.map(|a| (a.name().to_string(), a.value().to_string()))
			.collect(),
		text: node
			.children()
			.filter(|c| c.is_text())
			.filter_map(|c| c.text())
			.collect(),
		children: Vec::new(),
		parent,
	});
	let children: Vec<NodeId> = node
		.children()
		.filter(|c| c.is_element())
		.map(|c| copy_element(c, Some(id), out))
		.collect();
	out[id].children = children;
	id
}

impl DiagramSurface for HeadlessSurface {
	type Element = NodeId;

	fn root(&self) -> Option<NodeId> {
		self.root
	}

	fn find(&self, id: &str) -> Option<NodeId> {
		let nodes = self.nodes.borrow();
		self.attached_elements()
			.into_iter()
			.find(|&n| nodes[n].attrs.get("id").map(String::as_str) == Some(id))
	}

	fn elements_with_ids(&self) -> Vec<(String, NodeId)> {
		let nodes = self.nodes.borrow();
		self.attached_elements()
			.into_iter()
			.filter_map(|n| nodes[n].attrs.get("id").map(|id| (id.clone(), n)))
			.collect()
	}

	fn elements_with_class(&self, class: &str) -> Vec<NodeId> {
		let nodes = self.nodes.borrow();
		self.attached_elements()
			.into_iter()
			.filter(|&n| nodes[n].classes().any(|c| c == class))
			.collect()
	}

	fn add_class(&self, el: &NodeId, class: &str) {
		if self.has_class(el, class) {
			return;
		}
		if let Some(n) = self.nodes.borrow_mut().get_mut(*el) {
			let value = match n.attrs.get("class") {
				Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
				_ => class.to_string(),
			};
			n.attrs.insert("class".to_string(), value);
		}
	}

	fn remove_class(&self, el: &NodeId, class: &str) {
		if let Some(n) = self.nodes.borrow_mut().get_mut(*el) {
			let remaining: Vec<String> = n
				.classes()
				.filter(|c| *c != class)
				.map(str::to_string)
				.collect();
			if remaining.is_empty() {
				n.attrs.remove("class");
			} else {
				n.attrs.insert("class".to_string(), remaining.join(" "));
			}
		}
	}

	fn has_class(&self, el: &NodeId, class: &str) -> bool {
		self.nodes
			.borrow()
			.get(*el)
			.is_some_and(|n| n.classes().any(|c| c == class))
	}

	fn set_hidden(&self, el: &NodeId, hidden: bool) {
		if hidden {
			self.set_attribute(el, "style", "display: none;");
		} else {
			self.remove_attribute(el, "style");
		}
	}

	fn is_hidden(&self, el: &NodeId) -> bool {
		self.attribute(el, "style")
			.is_some_and(|s| s.replace(' ', "").contains("display:none"))
	}

	fn attribute(&self, el: &NodeId, name: &str) -> Option<String> {
		self.nodes.borrow().get(*el)?.attrs.get(name).cloned()
	}

	fn set_attribute(&self, el: &NodeId, name: &str, value: &str) {
		if let Some(n) = self.nodes.borrow_mut().get_mut(*el) {
			n.attrs.insert(name.to_string(), value.to_string());
		}
	}

	fn remove_attribute(&self, el: &NodeId, name: &str) {
		if let Some(n) = self.nodes.borrow_mut().get_mut(*el) {
			n.attrs.remove(name);
		}
	}

	fn label_text(&self, el: &NodeId) -> Option<String> {
		let target = self
			.descendants(*el)
			.into_iter()
			.find(|&n| self.tag(&n).as_deref() == Some("text"))
			.unwrap_or(*el);
		self.nodes.borrow().get(target).map(|n| n.text.clone())
	}

	fn set_label_text(&self, el: &NodeId, text: &str) {
		let target = self
			.descendants(*el)
			.into_iter()
			.find(|&n| self.tag(&n).as_deref() == Some("text"))
			.unwrap_or(*el);
		if let Some(n) = self.nodes.borrow_mut().get_mut(target) {
			n.text = text.to_string();
		}
	}

	fn screen_ctm(&self, el: &NodeId) -> Option<ScreenMatrix> {
		if !self.is_attached(*el) {
			return None;
		}
		let mut chain = Vec::new();
		let mut current = Some(*el);
		while let Some(id) = current {
			if Some(id) != self.root {
				chain.push(id);
			}
			current = self.nodes.borrow().get(id).and_then(|n| n.parent);
		}
		// innermost transform first, then each ancestor, then the viewBox mapping
		let local = chain
			.into_iter()
			.fold(Transform2D::identity(), |acc: ScreenMatrix, id| {
				acc.then(&self.local_transform(id))
			});
		Some(local.then(&self.root_matrix()?))
	}

	fn client_size(&self) -> Option<(f64, f64)> {
		self.size
	}

	fn background_layer(&self, id: &str) -> Option<NodeId> {
		let root = self.root?;
		if let Some(existing) = self.find(id) {
			return Some(existing);
		}
		let mut nodes = self.nodes.borrow_mut();
		let layer = nodes.len();
		nodes.push(ElementData {
			tag: "g".to_string(),
			attrs: BTreeMap::from([("id".to_string(), id.to_string())]),
			parent: Some(root),
			..ElementData::default()
		});
		nodes[root].children.insert(0, layer);
		Some(layer)
	}

	fn clone_without_ids(&self, el: &NodeId) -> Option<NodeId> {
		if *el >= self.nodes.borrow().len() {
			return None;
		}
		Some(self.deep_copy(*el, None))
	}

	fn append_child(&self, parent: &NodeId, child: &NodeId) {
		let mut nodes = self.nodes.borrow_mut();
		if *parent >= nodes.len() || *child >= nodes.len() {
			return;
		}
		if let Some(old) = nodes[*child].parent {
			nodes[old].children.retain(|c| c != child);
		}
		nodes[*child].parent = Some(*parent);
		nodes[*parent].children.push(*child);
	}

	fn clear_children(&self, el: &NodeId) {
		let mut nodes = self.nodes.borrow_mut();
		let Some(children) = nodes.get_mut(*el).map(|n| std::mem::take(&mut n.children)) else {
			return;
		};
		for child in children {
			nodes[child].parent = None;
		}
	}
}
