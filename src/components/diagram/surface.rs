//! The rendered-tree contract shared by the viewport controller and overlays.
//!
//! A surface is one slot's container holding the inline diagram. Handles are
//! cheap clones referring to live elements; every operation is a no-op or
//! returns `None` when the element is gone, so callers never need to check
//! for detached trees themselves.
//!
//! Two implementations exist: [`DomSurface`](super::DomSurface) over a
//! browser container and [`HeadlessSurface`](super::HeadlessSurface)
//! over an in-memory tree.

use euclid::default::Transform2D;

/// Affine matrix mapping an element's local coordinates to screen pixels.
pub type ScreenMatrix = Transform2D<f64>;

/// Build a matrix from SVG `matrix(a b c d e f)` components.
pub fn svg_matrix(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> ScreenMatrix {
	Transform2D::new(a, b, c, d, e, f)
}

/// Value for an SVG `transform` attribute.
pub fn matrix_attribute(m: &ScreenMatrix) -> String {
	format!(
		"matrix({} {} {} {} {} {})",
		m.m11, m.m12, m.m21, m.m22, m.m31, m.m32
	)
}

/// Operations the viewer needs from a rendered diagram container.
pub trait DiagramSurface {
	/// Handle to one element of the rendered tree.
	type Element: Clone;

	/// Root `<svg>` element, `None` while no diagram is rendered.
	fn root(&self) -> Option<Self::Element>;

	/// Element with the given render id, searched within this container only.
	fn find(&self, id: &str) -> Option<Self::Element>;

	/// Every element carrying an `id`, collected in one pass.
	fn elements_with_ids(&self) -> Vec<(String, Self::Element)>;

	/// Every element carrying `class`.
	fn elements_with_class(&self, class: &str) -> Vec<Self::Element>;

	/// Add `class` to the element.
	fn add_class(&self, el: &Self::Element, class: &str);

	/// Remove `class` from the element.
	fn remove_class(&self, el: &Self::Element, class: &str);

	/// Whether the element carries `class`.
	fn has_class(&self, el: &Self::Element, class: &str) -> bool;

	/// Toggle `display: none` on the element.
	fn set_hidden(&self, el: &Self::Element, hidden: bool);

	/// Whether [`set_hidden`](Self::set_hidden) hid the element.
	fn is_hidden(&self, el: &Self::Element) -> bool;

	/// Attribute value.
	fn attribute(&self, el: &Self::Element, name: &str) -> Option<String>;

	/// Set an attribute.
	fn set_attribute(&self, el: &Self::Element, name: &str, value: &str);

	/// Remove an attribute.
	fn remove_attribute(&self, el: &Self::Element, name: &str);

	/// Text of the element's first `<text>` descendant, or of the element itself.
	fn label_text(&self, el: &Self::Element) -> Option<String>;

	/// Replace the text read by [`label_text`](Self::label_text).
	fn set_label_text(&self, el: &Self::Element, text: &str);

	/// Local-to-screen matrix, `None` when the tree is not on a visible surface.
	fn screen_ctm(&self, el: &Self::Element) -> Option<ScreenMatrix>;

	/// Container size in screen pixels, `None` when it has no layout.
	fn client_size(&self) -> Option<(f64, f64)>;

	/// Existing group with `id` under the root, or a new one inserted as the
	/// root's first child.
	fn background_layer(&self, id: &str) -> Option<Self::Element>;

	/// Deep copy of `el`, detached, with every `id` attribute removed.
	fn clone_without_ids(&self, el: &Self::Element) -> Option<Self::Element>;

	/// Append `child` as the last child of `parent`.
	fn append_child(&self, parent: &Self::Element, child: &Self::Element);

	/// Remove every child of the element.
	fn clear_children(&self, el: &Self::Element);
}
