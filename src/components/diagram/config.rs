//! Tunable parameters for preprocessing, viewport interaction and zoom-to-target.
//!
//! This module centralizes every threshold the viewer uses, so that behavior
//! on very large grids can be tuned in one place.
//!
//! # Coordinate Spaces
//!
//! - **Diagram-space**: the coordinate system of the SVG `viewBox`. All
//!   rectangle sizes below are in diagram units.
//! - **Screen-space**: client pixels of the container holding the diagram.
//!
//! Every struct implements `Deserialize` with `#[serde(default)]`, so a
//! partial JSON document only overrides the fields it names.

use serde::Deserialize;

/// Size-dependent visual boost applied once to the raw markup.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
	/// Diagram extent considered "normal size".
	pub reference_size: f64,
	/// Element-count hint below which markup is never modified.
	pub min_element_count: usize,
	/// Size ratio at or below which markup is never modified.
	pub boost_ratio: f64,
	/// Size ratio above which the root is tagged large-grid.
	pub large_grid_ratio: f64,
}

impl Default for BoostConfig {
	fn default() -> Self {
		Self {
			reference_size: 1250.0,
			min_element_count: 500,
			boost_ratio: 3.0,
			large_grid_ratio: 6.0,
		}
	}
}

/// Wheel, drag and text-visibility behavior of the viewport controller.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
	/// Rectangle scale per wheel tick away from the viewer (zoom out).
	pub wheel_out_factor: f64,
	/// Rectangle scale per wheel tick towards the viewer (zoom in).
	pub wheel_in_factor: f64,
	/// Quiet period after the last wheel tick before the view is committed.
	pub quiet_period_ms: u32,
	/// Large-grid text is shown when the zoom ratio drops below this.
	pub text_show_ratio: f64,
	/// Large-grid text is hidden when the zoom ratio reaches this.
	pub text_hide_ratio: f64,
	/// Smallest allowed rectangle extent, in diagram units.
	pub min_extent: f64,
	/// Largest allowed rectangle extent, as a multiple of the native extent.
	pub max_zoom_out: f64,
}

impl Default for ViewportConfig {
	fn default() -> Self {
		Self {
			wheel_out_factor: 1.1,
			wheel_in_factor: 0.9,
			quiet_period_ms: 150,
			text_show_ratio: 0.45,
			text_hide_ratio: 0.55,
			min_extent: 1.0,
			max_zoom_out: 20.0,
		}
	}
}

/// Framing of zoom-to-target results.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
	/// Minimum width and height of the target bounding box.
	pub min_box: f64,
	/// Multiplier applied to the bounding box around its center.
	pub padding: f64,
}

impl Default for SpatialConfig {
	fn default() -> Self {
		Self {
			min_box: 50.0,
			padding: 1.8,
		}
	}
}

/// Complete viewer configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
	/// Markup boost for large diagrams.
	pub boost: BoostConfig,
	/// Pan, zoom and text visibility.
	pub viewport: ViewportConfig,
	/// Zoom-to-target framing.
	pub spatial: SpatialConfig,
}
