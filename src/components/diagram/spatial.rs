//! Zoom-to-target: frame a node or line together with its neighbourhood.

use log::debug;

use super::config::SpatialConfig;
use super::index::MetadataIndex;
use super::surface::DiagramSurface;
use super::types::ViewRect;
use super::viewport::ViewportController;

/// Marker class on the element last framed by [`zoom_to_target`].
pub const HIGHLIGHT_CLASS: &str = "nad-highlight";

/// Render id of the resolved element plus the diagram points to frame.
fn collect_points(index: &MetadataIndex, target_id: &str) -> Option<(String, Vec<(f64, f64)>)> {
	let neighbours = |render_id: &str, points: &mut Vec<(f64, f64)>| {
		for edge in index.edges_at(render_id) {
			for end in [&edge.node1, &edge.node2] {
				if let Some(node) = index.node_by_render_id(end) {
					points.push((node.x, node.y));
				}
			}
		}
	};

	if let Some(node) = index.node(target_id) {
		let mut points = vec![(node.x, node.y)];
		neighbours(node.render_id.as_str(), &mut points);
		return Some((node.render_id.clone(), points));
	}

	let edge = index.edge(target_id)?;
	let mut points = Vec::new();
	for end in [&edge.node1, &edge.node2] {
		if let Some(node) = index.node_by_render_id(end) {
			points.push((node.x, node.y));
		}
		neighbours(end.as_str(), &mut points);
	}
	(!points.is_empty()).then(|| (edge.render_id.clone(), points))
}

/// Bounding box of `points`, at least `min_box` wide and high, scaled by
/// `padding` about its center and widened on its narrow axis to `aspect`
/// (container width over height).
pub fn fit_rect(points: &[(f64, f64)], config: &SpatialConfig, aspect: Option<f64>) -> Option<ViewRect> {
	let (&(x0, y0), rest) = points.split_first()?;
	let (min_x, min_y, max_x, max_y) = rest.iter().fold((x0, y0, x0, y0), |(ax, ay, bx, by), &(x, y)| {
		(ax.min(x), ay.min(y), bx.max(x), by.max(y))
	});

	let cx = (min_x + max_x) / 2.0;
	let cy = (min_y + max_y) / 2.0;
	let mut w = (max_x - min_x).max(config.min_box) * config.padding;
	let mut h = (max_y - min_y).max(config.min_box) * config.padding;

	if let Some(aspect) = aspect.filter(|a| a.is_finite() && *a > 0.0) {
		if w / h < aspect {
			w = h * aspect;
		} else {
			h = w / aspect;
		}
	}
	ViewRect::checked(cx - w / 2.0, cy - h / 2.0, w, h)
}

/// Frame the node or line with equipment id `target_id` and highlight it.
///
/// An empty id clears the highlight and returns to the native view. Returns
/// the rectangle applied, `None` when the id does not resolve or nothing is
/// rendered.
pub fn zoom_to_target<S: DiagramSurface>(
	surface: &S,
	controller: &mut ViewportController,
	index: Option<&MetadataIndex>,
	config: &SpatialConfig,
	target_id: &str,
) -> Option<ViewRect> {
	let target_id = target_id.trim();
	if target_id.is_empty() {
		clear_zoom_target(surface, controller);
		return None;
	}
	surface.root()?;

	let Some((render_id, points)) = index.and_then(|index| collect_points(index, target_id)) else {
		debug!("nad-viewport: zoom target {} not in diagram", target_id);
		return None;
	};
	let aspect = surface.client_size().map(|(w, h)| w / h);
	let rect = fit_rect(&points, config, aspect)?;

	controller.set_view(rect, surface);
	clear_highlight(surface);
	if let Some(el) = surface.find(&render_id) {
		surface.add_class(&el, HIGHLIGHT_CLASS);
	}
	Some(rect)
}

/// Drop the highlight and return to the native view.
pub fn clear_zoom_target<S: DiagramSurface>(surface: &S, controller: &mut ViewportController) {
	clear_highlight(surface);
	controller.reset(surface);
}

fn clear_highlight<S: DiagramSurface>(surface: &S) {
	for el in surface.elements_with_class(HIGHLIGHT_CLASS) {
		surface.remove_class(&el, HIGHLIGHT_CLASS);
	}
}
