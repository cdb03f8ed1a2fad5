//! Network-area-diagram viewer: preprocessing, metadata index, pan/zoom
//! viewport and semantic overlays.
//!
//! The pieces are layered so that everything except [`DiagramViewer`] works
//! against the [`DiagramSurface`] trait:
//! - [`process_svg`]: viewBox extraction and the size-dependent boost
//! - [`MetadataIndex`]: O(1) node and edge lookups over the metadata
//! - [`ViewportController`]: live/committed rectangles, wheel and drag batching
//! - [`overlay`] and [`resolve_action_target`]: overload markers, action
//!   halo, flow deltas, voltage filter
//! - [`spatial`]: zoom-to-target
//!
//! # Example
//!
//! ```ignore
//! use nad_viewport::{DiagramPayload, DiagramViewer};
//!
//! let payload = DiagramPayload::from_json(&text)?;
//! view! { <DiagramViewer payload=Signal::stored(Some(payload)) /> }
//! ```

mod action_target;
mod component;
mod config;
mod dom;
mod error;
mod headless;
mod index;
pub mod overlay;
mod preprocess;
pub mod spatial;
mod surface;
mod types;
mod viewport;

pub use action_target::{ActionTarget, resolve_action_target};
pub use component::DiagramViewer;
pub use config::{BoostConfig, SpatialConfig, ViewerConfig, ViewportConfig};
pub use dom::DomSurface;
pub use error::{Error, Result};
pub use headless::HeadlessSurface;
pub use index::MetadataIndex;
pub use preprocess::{LARGE_GRID_CLASS, ProcessedSvg, boost_factor, parse_view_box, process_svg};
pub use surface::{DiagramSurface, ScreenMatrix, matrix_attribute, svg_matrix};
pub use types::{
	ActionDetail, ActionTopology, AnalysisResult, DiagramPayload, EdgeInfo, EdgeMeta, FlowCategory, FlowDelta,
	Metadata, NodeEdgeRecord, NodeMeta, NominalVoltages, ViewRect,
};
pub use viewport::{TEXT_HIDDEN_CLASS, ViewportController, Wakeups, WheelInput};

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn exported_items_load_pan_and_reset_a_diagram() {
		let raw = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 400 200"><g id="n0"/></svg>"#;
		let processed = process_svg(raw, 1, &BoostConfig::default());
		assert_eq!(parse_view_box(&processed.markup), processed.view_box);

		let surface = HeadlessSurface::parse(&processed.markup, 400.0, 200.0).unwrap();
		let mut controller = ViewportController::new(ViewportConfig::default());
		controller.load(processed.view_box, processed.large_grid, &surface);
		controller.set_view(ViewRect::new(50.0, 25.0, 200.0, 100.0), &surface);
		assert_eq!(controller.committed_view(), Some(ViewRect::new(50.0, 25.0, 200.0, 100.0)));

		controller.reset(&surface);
		assert_eq!(controller.committed_view(), Some(ViewRect::new(0.0, 0.0, 400.0, 200.0)));
		assert!(controller.text_visible());
	}
}
