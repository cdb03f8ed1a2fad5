//! Browser implementation of [`DiagramSurface`] over a container element
//! holding the inline `<svg>`.

use wasm_bindgen::JsCast;
use web_sys::{Element, SvgElement, SvgGraphicsElement};

use super::surface::{DiagramSurface, ScreenMatrix, svg_matrix};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// One slot's container. Queries are scoped to it, so several slots may
/// render diagrams sharing the same element ids.
#[derive(Clone)]
pub struct DomSurface {
	container: Element,
}

impl DomSurface {
	/// Wrap the slot container.
	pub fn new(container: Element) -> Self {
		Self { container }
	}

	/// Replace the rendered diagram.
	pub fn set_markup(&self, markup: &str) {
		self.container.set_inner_html(markup);
	}

	/// Whether the container is still part of the document.
	pub fn is_connected(&self) -> bool {
		self.container.is_connected()
	}

	fn query_all(root: &Element, selector: &str) -> Vec<Element> {
		let Ok(list) = root.query_selector_all(selector) else {
			return Vec::new();
		};
		(0..list.length())
			.filter_map(|i| list.item(i))
			.filter_map(|node| node.dyn_into::<Element>().ok())
			.collect()
	}

	fn text_target(el: &Element) -> Element {
		el.query_selector("text")
			.ok()
			.flatten()
			.unwrap_or_else(|| el.clone())
	}
}

/// Quote an id for use inside an attribute selector.
fn id_selector(id: &str) -> String {
	format!("[id=\"{}\"]", id.replace('\\', "\\\\").replace('"', "\\\""))
}

impl DiagramSurface for DomSurface {
	type Element = Element;

	fn root(&self) -> Option<Element> {
		self.container.query_selector("svg").ok().flatten()
	}

	fn find(&self, id: &str) -> Option<Element> {
		self.container.query_selector(&id_selector(id)).ok().flatten()
	}

	fn elements_with_ids(&self) -> Vec<(String, Element)> {
		Self::query_all(&self.container, "[id]")
			.into_iter()
			.map(|el| (el.id(), el))
			.collect()
	}

	fn elements_with_class(&self, class: &str) -> Vec<Element> {
		Self::query_all(&self.container, &format!(".{}", class))
	}

	fn add_class(&self, el: &Element, class: &str) {
		let _ = el.class_list().add_1(class);
	}

	fn remove_class(&self, el: &Element, class: &str) {
		let _ = el.class_list().remove_1(class);
	}

	fn has_class(&self, el: &Element, class: &str) -> bool {
		el.class_list().contains(class)
	}

	fn set_hidden(&self, el: &Element, hidden: bool) {
		let Some(svg) = el.dyn_ref::<SvgElement>() else {
			return;
		};
		let style = svg.style();
		if hidden {
			let _ = style.set_property("display", "none");
		} else {
			let _ = style.remove_property("display");
		}
	}

	fn is_hidden(&self, el: &Element) -> bool {
		el.dyn_ref::<SvgElement>()
			.and_then(|svg| svg.style().get_property_value("display").ok())
			.is_some_and(|display| display == "none")
	}

	fn attribute(&self, el: &Element, name: &str) -> Option<String> {
		el.get_attribute(name)
	}

	fn set_attribute(&self, el: &Element, name: &str, value: &str) {
		let _ = el.set_attribute(name, value);
	}

	fn remove_attribute(&self, el: &Element, name: &str) {
		let _ = el.remove_attribute(name);
	}

	fn label_text(&self, el: &Element) -> Option<String> {
		Self::text_target(el).text_content()
	}

	fn set_label_text(&self, el: &Element, text: &str) {
		Self::text_target(el).set_text_content(Some(text));
	}

	fn screen_ctm(&self, el: &Element) -> Option<ScreenMatrix> {
		let m = el.dyn_ref::<SvgGraphicsElement>()?.get_screen_ctm()?;
		Some(svg_matrix(
			m.a() as f64,
			m.b() as f64,
			m.c() as f64,
			m.d() as f64,
			m.e() as f64,
			m.f() as f64,
		))
	}

	fn client_size(&self) -> Option<(f64, f64)> {
		let rect = self.container.get_bounding_client_rect();
		(rect.width() > 0.0 && rect.height() > 0.0).then(|| (rect.width(), rect.height()))
	}

	fn background_layer(&self, id: &str) -> Option<Element> {
		let root = self.root()?;
		if let Some(existing) = root.query_selector(&id_selector(id)).ok().flatten() {
			return Some(existing);
		}
		let document = root.owner_document()?;
		let layer = document.create_element_ns(Some(SVG_NS), "g").ok()?;
		layer.set_id(id);
		root.insert_before(&layer, root.first_child().as_ref()).ok()?;
		Some(layer)
	}

	fn clone_without_ids(&self, el: &Element) -> Option<Element> {
		let copy: Element = el.clone_node_with_deep(true).ok()?.dyn_into().ok()?;
		let _ = copy.remove_attribute("id");
		for inner in Self::query_all(&copy, "[id]") {
			let _ = inner.remove_attribute("id");
		}
		Some(copy)
	}

	fn append_child(&self, parent: &Element, child: &Element) {
		let _ = parent.append_child(child);
	}

	fn clear_children(&self, el: &Element) {
		el.set_inner_html("");
	}
}
