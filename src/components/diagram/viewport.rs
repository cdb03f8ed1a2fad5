//! Pan/zoom controller for one diagram slot.
//!
//! The controller keeps two rectangles: the *live* one, written into the
//! rendered `viewBox` on every paintable frame, and the *committed* one that
//! the rest of the application observes. Input never paints directly; it
//! accumulates pending state and asks the host for a frame through
//! [`Wakeups`]. The host owns the actual frame and timer scheduling and calls
//! back into [`on_frame`](ViewportController::on_frame) and
//! [`on_quiet_period`](ViewportController::on_quiet_period).
//!
//! Commit points:
//! - wheel: after `quiet_period_ms` without further ticks
//! - drag: immediately on release
//! - [`set_view`](ViewportController::set_view): immediately

use std::fmt;

use euclid::default::Point2D;
use log::debug;

use super::config::ViewportConfig;
use super::surface::{DiagramSurface, ScreenMatrix};
use super::types::ViewRect;

/// Class set on the root while large-grid text is hidden.
pub const TEXT_HIDDEN_CLASS: &str = "nad-text-hidden";

/// Scheduling requests returned by input handlers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct Wakeups {
	/// Request one paintable frame. Only set when none is outstanding.
	pub frame: bool,
	/// (Re)arm the quiet-period timer, replacing any armed one.
	pub quiet_timer: bool,
}

impl Wakeups {
	/// Nothing to schedule.
	pub const NONE: Wakeups = Wakeups {
		frame: false,
		quiet_timer: false,
	};
}

/// Hysteresis for large-grid text visibility.
///
/// Text is shown once the zoom ratio drops below `show_below` and hidden again
/// only when it climbs back to `hide_at`, so a ratio oscillating around a
/// single value never flickers.
#[derive(Clone, Debug)]
pub struct TextVisibility {
	visible: bool,
	show_below: f64,
	hide_at: f64,
}

impl TextVisibility {
	pub fn new(show_below: f64, hide_at: f64) -> Self {
		Self {
			visible: false,
			show_below,
			hide_at,
		}
	}

	pub fn is_visible(&self) -> bool {
		self.visible
	}

	pub fn reset(&mut self) {
		self.visible = false;
	}

	/// Feed the current zoom ratio. Returns `true` when visibility toggled.
	pub fn update(&mut self, ratio: f64) -> bool {
		let next = if self.visible {
			ratio < self.hide_at
		} else {
			ratio < self.show_below
		};
		let changed = next != self.visible;
		self.visible = next;
		changed
	}
}

/// One wheel tick in client coordinates.
#[derive(Clone, Copy, Debug)]
pub struct WheelInput {
	/// Cursor x in client pixels.
	pub client_x: f64,
	/// Cursor y in client pixels.
	pub client_y: f64,
	/// Positive when scrolling away from the viewer.
	pub delta_y: f64,
}

#[derive(Clone, Debug)]
struct WheelBurst {
	active: bool,
	pending_scale: f64,
	anchor: Option<(f64, f64)>,
	/// Screen → diagram, cached until the next repaint.
	screen_to_diagram: Option<ScreenMatrix>,
}

impl Default for WheelBurst {
	fn default() -> Self {
		Self {
			active: false,
			pending_scale: 1.0,
			anchor: None,
			screen_to_diagram: None,
		}
	}
}

#[derive(Clone, Debug, Default)]
struct DragState {
	active: bool,
	start_x: f64,
	start_y: f64,
	start_rect: Option<ViewRect>,
	/// Screen point of the last applied move.
	applied: (f64, f64),
	target: Option<(f64, f64)>,
}

type CommitObserver = Box<dyn FnMut(ViewRect)>;

/// Live and committed view state of one diagram slot.
pub struct ViewportController {
	config: ViewportConfig,
	initial: Option<ViewRect>,
	live: Option<ViewRect>,
	committed: Option<ViewRect>,
	large_grid: bool,
	text: TextVisibility,
	attached: bool,
	frame_requested: bool,
	wheel: WheelBurst,
	drag: DragState,
	observers: Vec<CommitObserver>,
}

impl fmt::Debug for ViewportController {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ViewportController")
			.field("initial", &self.initial)
			.field("live", &self.live)
			.field("committed", &self.committed)
			.field("large_grid", &self.large_grid)
			.field("attached", &self.attached)
			.finish_non_exhaustive()
	}
}

impl ViewportController {
	/// Inert controller; call [`load`](Self::load) and [`attach`](Self::attach) before input.
	pub fn new(config: ViewportConfig) -> Self {
		let text = TextVisibility::new(config.text_show_ratio, config.text_hide_ratio);
		Self {
			config,
			initial: None,
			live: None,
			committed: None,
			large_grid: false,
			text,
			attached: false,
			frame_requested: false,
			wheel: WheelBurst::default(),
			drag: DragState::default(),
			observers: Vec::new(),
		}
	}

	/// Register a callback run with every committed rectangle.
	pub fn subscribe(&mut self, observer: impl FnMut(ViewRect) + 'static) {
		self.observers.push(Box::new(observer));
	}

	/// Install freshly rendered content. `rect` is the native rectangle; with
	/// `None` the controller stays inert until a later load supplies one.
	pub fn load<S: DiagramSurface>(&mut self, rect: Option<ViewRect>, large_grid: bool, surface: &S) {
		self.initial = rect;
		self.live = rect;
		self.committed = rect;
		self.large_grid = large_grid;
		self.wheel = WheelBurst::default();
		self.drag = DragState::default();
		self.text.reset();

		if let Some(root) = surface.root() {
			if large_grid {
				surface.add_class(&root, TEXT_HIDDEN_CLASS);
			} else {
				surface.remove_class(&root, TEXT_HIDDEN_CLASS);
			}
		}
		if let Some(rect) = rect {
			self.paint(surface);
			self.notify(rect);
		}
	}

	/// Native rectangle of the loaded diagram.
	pub fn initial_view(&self) -> Option<ViewRect> {
		self.initial
	}

	/// Last committed rectangle.
	pub fn committed_view(&self) -> Option<ViewRect> {
		self.committed
	}

	/// Rectangle currently painted, possibly not yet committed.
	pub fn live_view(&self) -> Option<ViewRect> {
		self.live
	}

	/// Whether input is being accepted.
	pub fn is_attached(&self) -> bool {
		self.attached
	}

	/// Whether labels are shown. Always true outside large grids.
	pub fn text_visible(&self) -> bool {
		!self.large_grid || self.text.is_visible()
	}

	/// Tunables in use.
	pub fn config(&self) -> &ViewportConfig {
		&self.config
	}

	/// Replace both rectangles and repaint immediately.
	pub fn set_view<S: DiagramSurface>(&mut self, rect: ViewRect, surface: &S) {
		if surface.root().is_none() || rect.w <= 0.0 || rect.h <= 0.0 {
			return;
		}
		self.wheel = WheelBurst::default();
		self.drag = DragState::default();
		self.live = Some(rect);
		self.committed = Some(rect);
		self.paint(surface);
		self.notify(rect);
	}

	/// Return to the native rectangle.
	pub fn reset<S: DiagramSurface>(&mut self, surface: &S) {
		if let Some(initial) = self.initial {
			self.set_view(initial, surface);
		}
	}

	/// Start receiving input; repaints the committed rectangle.
	pub fn attach<S: DiagramSurface>(&mut self, surface: &S) {
		self.attached = true;
		if let Some(committed) = self.committed {
			self.live = Some(committed);
			self.paint(surface);
		}
	}

	/// Stop receiving input. Pending frame work is discarded; a live
	/// rectangle already painted but not yet committed is committed now.
	pub fn detach(&mut self) {
		self.attached = false;
		self.frame_requested = false;
		self.wheel = WheelBurst::default();
		self.drag = DragState::default();
		if let Some(live) = self.live {
			if self.committed != Some(live) {
				self.committed = Some(live);
				self.notify(live);
			}
		}
	}

	/// Drop every pending callback expectation, e.g. on unmount.
	pub fn cancel_pending(&mut self) {
		self.frame_requested = false;
		self.wheel = WheelBurst::default();
		self.drag = DragState::default();
	}

	fn accepts_input<S: DiagramSurface>(&self, surface: &S) -> bool {
		self.attached && self.live.is_some() && surface.root().is_some()
	}

	fn request_frame(&mut self) -> bool {
		!std::mem::replace(&mut self.frame_requested, true)
	}

	/// Queue one wheel tick. Ticks between two frames are merged.
	pub fn wheel<S: DiagramSurface>(&mut self, input: WheelInput, surface: &S) -> Wakeups {
		if !self.accepts_input(surface) || input.delta_y == 0.0 {
			return Wakeups::NONE;
		}
		if self.wheel.screen_to_diagram.is_none() {
			let Some(inverse) = surface
				.root()
				.and_then(|root| surface.screen_ctm(&root))
				.and_then(|ctm| ctm.inverse())
			else {
				return Wakeups::NONE;
			};
			self.wheel.screen_to_diagram = Some(inverse);
		}
		let Some(to_diagram) = self.wheel.screen_to_diagram else {
			return Wakeups::NONE;
		};

		let anchor = to_diagram.transform_point(Point2D::new(input.client_x, input.client_y));
		let factor = if input.delta_y > 0.0 {
			self.config.wheel_out_factor
		} else {
			self.config.wheel_in_factor
		};
		self.wheel.active = true;
		self.wheel.pending_scale *= factor;
		self.wheel.anchor = Some((anchor.x, anchor.y));

		Wakeups {
			frame: self.request_frame(),
			quiet_timer: true,
		}
	}

	/// Start a drag at the given client point.
	pub fn pointer_down<S: DiagramSurface>(&mut self, client_x: f64, client_y: f64, surface: &S) {
		if !self.accepts_input(surface) {
			return;
		}
		self.drag = DragState {
			active: true,
			start_x: client_x,
			start_y: client_y,
			start_rect: self.live,
			applied: (client_x, client_y),
			target: None,
		};
	}

	/// Record the drag position; applied on the next frame.
	pub fn pointer_move(&mut self, client_x: f64, client_y: f64) -> Wakeups {
		if !self.attached || !self.drag.active {
			return Wakeups::NONE;
		}
		self.drag.target = Some((client_x, client_y));
		Wakeups {
			frame: self.request_frame(),
			quiet_timer: false,
		}
	}

	/// End a drag (release or pointer leaving the container) and commit.
	pub fn pointer_up<S: DiagramSurface>(&mut self, surface: &S) {
		if !self.drag.active {
			return;
		}
		if surface.root().is_some() {
			if self.apply_drag(surface) {
				self.paint(surface);
			}
			if let Some(live) = self.live {
				self.committed = Some(live);
				self.notify(live);
			}
		}
		self.drag = DragState::default();
	}

	/// Whether a drag is in progress.
	pub fn is_dragging(&self) -> bool {
		self.drag.active
	}

	/// Apply the latest pending input and repaint. Called once per paintable frame.
	pub fn on_frame<S: DiagramSurface>(&mut self, surface: &S) {
		self.frame_requested = false;
		if surface.root().is_none() {
			return;
		}
		let zoomed = self.apply_wheel();
		let dragged = self.apply_drag(surface);
		if zoomed || dragged {
			self.paint(surface);
		}
	}

	/// Wheel burst ended: commit the live rectangle.
	pub fn on_quiet_period<S: DiagramSurface>(&mut self, surface: &S) {
		if !self.wheel.active || surface.root().is_none() {
			return;
		}
		if self.wheel.pending_scale != 1.0 && self.apply_wheel() {
			self.paint(surface);
		}
		self.wheel = WheelBurst::default();
		if let Some(live) = self.live {
			self.committed = Some(live);
			self.notify(live);
		}
	}

	fn apply_wheel(&mut self) -> bool {
		let (Some(live), Some((ax, ay))) = (self.live, self.wheel.anchor) else {
			return false;
		};
		let scale = std::mem::replace(&mut self.wheel.pending_scale, 1.0);
		// the cached transform is stale once the rectangle changes
		self.wheel.screen_to_diagram = None;
		if scale == 1.0 {
			return false;
		}
		let scale = self.clamp_scale(&live, scale);
		self.live = Some(live.scaled_about(scale, ax, ay));
		if self.drag.active {
			// later moves continue from the zoomed rectangle
			self.drag.start_rect = self.live;
			(self.drag.start_x, self.drag.start_y) = self.drag.applied;
		}
		true
	}

	/// Keep the zoomed extent within `[min_extent, max_zoom_out × native]`.
	fn clamp_scale(&self, rect: &ViewRect, scale: f64) -> f64 {
		let current = rect.max_extent();
		let max = self
			.initial
			.map_or(f64::INFINITY, |initial| initial.max_extent() * self.config.max_zoom_out);
		let target = (current * scale).clamp(self.config.min_extent.min(current), max.max(current));
		target / current
	}

	fn apply_drag<S: DiagramSurface>(&mut self, surface: &S) -> bool {
		let (Some(start_rect), Some((tx, ty))) = (self.drag.start_rect, self.drag.target.take()) else {
			return false;
		};
		let Some((container_w, _)) = surface.client_size().filter(|(w, _)| *w > 0.0) else {
			return false;
		};
		let per_pixel = start_rect.w / container_w;
		let dx = (tx - self.drag.start_x) * per_pixel;
		let dy = (ty - self.drag.start_y) * per_pixel;
		self.live = Some(start_rect.translated(-dx, -dy));
		self.drag.applied = (tx, ty);
		true
	}

	fn paint<S: DiagramSurface>(&mut self, surface: &S) {
		let (Some(root), Some(live)) = (surface.root(), self.live) else {
			return;
		};
		surface.set_attribute(&root, "viewBox", &live.to_view_box());
		self.update_text_visibility(surface, &root, &live);
	}

	fn update_text_visibility<S: DiagramSurface>(&mut self, surface: &S, root: &S::Element, live: &ViewRect) {
		let Some(initial) = self.initial.filter(|_| self.large_grid) else {
			return;
		};
		let ratio = live.max_extent() / initial.max_extent();
		if self.text.update(ratio) {
			if self.text.is_visible() {
				surface.remove_class(root, TEXT_HIDDEN_CLASS);
			} else {
				surface.add_class(root, TEXT_HIDDEN_CLASS);
			}
		}
	}

	fn notify(&mut self, rect: ViewRect) {
		debug!("nad-viewport: committed view {:?}", rect);
		for observer in &mut self.observers {
			observer(rect);
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;
	use crate::components::diagram::headless::HeadlessSurface;

	const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 1000 500"><g id="n"/></svg>"#;

	fn setup(large_grid: bool) -> (ViewportController, HeadlessSurface, Rc<RefCell<Vec<ViewRect>>>) {
		let surface = HeadlessSurface::parse(SVG, 1000.0, 500.0).unwrap();
		let mut controller = ViewportController::new(ViewportConfig::default());
		let commits = Rc::new(RefCell::new(Vec::new()));
		let sink = commits.clone();
		controller.subscribe(move |rect| sink.borrow_mut().push(rect));
		controller.load(surface.view_box(), large_grid, &surface);
		controller.attach(&surface);
		commits.borrow_mut().clear();
		(controller, surface, commits)
	}

	fn to_diagram(surface: &HeadlessSurface, sx: f64, sy: f64) -> (f64, f64) {
		let root = surface.root().unwrap();
		let p = surface
			.screen_ctm(&root)
			.unwrap()
			.inverse()
			.unwrap()
			.transform_point(Point2D::new(sx, sy));
		(p.x, p.y)
	}

	fn tick(x: f64, y: f64, delta_y: f64) -> WheelInput {
		WheelInput {
			client_x: x,
			client_y: y,
			delta_y,
		}
	}

	#[test]
	fn wheel_zoom_keeps_point_under_cursor() {
		let (mut controller, surface, _) = setup(false);
		let before = to_diagram(&surface, 250.0, 100.0);

		let _ = controller.wheel(tick(250.0, 100.0, -1.0), &surface);
		let _ = controller.wheel(tick(250.0, 100.0, -1.0), &surface);
		controller.on_frame(&surface);

		let after = to_diagram(&surface, 250.0, 100.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);
		let live = controller.live_view().unwrap();
		assert!((live.w - 1000.0 * 0.81).abs() < 1e-9);
	}

	#[test]
	fn wheel_ticks_collapse_into_one_frame_and_commit_after_quiet_period() {
		let (mut controller, surface, commits) = setup(false);

		let first = controller.wheel(tick(500.0, 250.0, 1.0), &surface);
		let second = controller.wheel(tick(500.0, 250.0, 1.0), &surface);
		assert_eq!(first, Wakeups { frame: true, quiet_timer: true });
		assert_eq!(second, Wakeups { frame: false, quiet_timer: true });

		controller.on_frame(&surface);
		assert!((controller.live_view().unwrap().w - 1210.0).abs() < 1e-9);
		assert_eq!(controller.committed_view(), Some(ViewRect::new(0.0, 0.0, 1000.0, 500.0)));
		assert!(commits.borrow().is_empty());

		controller.on_quiet_period(&surface);
		assert_eq!(controller.committed_view(), controller.live_view());
		assert_eq!(commits.borrow().len(), 1);

		// a new burst asks for a frame again
		assert!(controller.wheel(tick(500.0, 250.0, 1.0), &surface).frame);
	}

	#[test]
	fn drag_translates_once_per_frame_and_commits_on_release() {
		let (mut controller, surface, commits) = setup(false);

		controller.pointer_down(100.0, 100.0, &surface);
		assert!(controller.pointer_move(150.0, 120.0).frame);
		assert!(!controller.pointer_move(200.0, 100.0).frame);
		controller.on_frame(&surface);
		assert_eq!(controller.live_view(), Some(ViewRect::new(-100.0, 0.0, 1000.0, 500.0)));
		assert!(commits.borrow().is_empty());

		let _ = controller.pointer_move(100.0, 150.0);
		controller.pointer_up(&surface);
		assert_eq!(controller.committed_view(), Some(ViewRect::new(0.0, -50.0, 1000.0, 500.0)));
		assert_eq!(surface.view_box(), controller.committed_view());
		assert_eq!(commits.borrow().len(), 1);
		assert!(!controller.is_dragging());
	}

	#[test]
	fn absent_tree_makes_everything_inert() {
		let surface = HeadlessSurface::empty(800.0, 600.0);
		let mut controller = ViewportController::new(ViewportConfig::default());
		controller.load(None, false, &surface);
		controller.attach(&surface);
		assert_eq!(controller.wheel(tick(1.0, 1.0, 1.0), &surface), Wakeups::NONE);
		controller.pointer_down(1.0, 1.0, &surface);
		assert!(!controller.is_dragging());
		controller.set_view(ViewRect::new(0.0, 0.0, 10.0, 10.0), &surface);
		assert_eq!(controller.committed_view(), None);
	}

	#[test]
	fn missing_layout_abandons_wheel_tick() {
		let surface = HeadlessSurface::parse(SVG, 1000.0, 500.0).unwrap().without_layout();
		let mut controller = ViewportController::new(ViewportConfig::default());
		controller.load(surface.view_box(), false, &surface);
		controller.attach(&surface);
		assert_eq!(controller.wheel(tick(1.0, 1.0, 1.0), &surface), Wakeups::NONE);
	}

	#[test]
	fn detached_controller_ignores_input_and_repaints_on_attach() {
		let (mut controller, surface, commits) = setup(false);
		let _ = controller.wheel(tick(500.0, 250.0, -1.0), &surface);
		controller.on_frame(&surface);
		controller.detach();
		// painted but uncommitted zoom is committed on detach
		assert_eq!(commits.borrow().len(), 1);
		let kept = controller.committed_view();

		assert_eq!(controller.wheel(tick(500.0, 250.0, -1.0), &surface), Wakeups::NONE);
		assert_eq!(controller.pointer_move(1.0, 1.0), Wakeups::NONE);

		surface.set_attribute(&surface.root().unwrap(), "viewBox", "0 0 1 1");
		controller.attach(&surface);
		assert_eq!(surface.view_box(), kept);
	}

	#[test]
	fn zoom_during_drag_survives_later_moves() {
		let (mut controller, surface, commits) = setup(false);
		controller.pointer_down(100.0, 100.0, &surface);
		let _ = controller.wheel(tick(500.0, 250.0, -1.0), &surface);
		controller.on_frame(&surface);
		let zoomed = controller.live_view().unwrap();
		assert!((zoomed.w - 900.0).abs() < 1e-9);

		let _ = controller.pointer_move(110.0, 100.0);
		controller.on_frame(&surface);
		controller.pointer_up(&surface);

		// 10px at 900 units per 1000px
		let committed = controller.committed_view().unwrap();
		assert!((committed.w - 900.0).abs() < 1e-9);
		assert!((committed.x - (zoomed.x - 9.0)).abs() < 1e-9);
		assert!((committed.y - zoomed.y).abs() < 1e-9);
		assert_eq!(commits.borrow().last().copied(), Some(committed));
	}

	#[test]
	fn stale_callbacks_after_detach_change_nothing() {
		let (mut controller, surface, commits) = setup(false);
		let _ = controller.wheel(tick(500.0, 250.0, -1.0), &surface);
		controller.detach();
		// the frame and timer armed for the burst still fire
		controller.on_frame(&surface);
		controller.on_quiet_period(&surface);

		let initial = controller.initial_view();
		assert_eq!(controller.live_view(), initial);
		assert_eq!(controller.committed_view(), initial);
		assert_eq!(surface.view_box(), initial);
		assert!(commits.borrow().is_empty());
	}

	#[test]
	fn load_discards_a_pending_burst() {
		let (mut controller, surface, commits) = setup(false);
		let _ = controller.wheel(tick(500.0, 250.0, -1.0), &surface);
		let fresh = ViewRect::new(0.0, 0.0, 2000.0, 1000.0);
		controller.load(Some(fresh), false, &surface);
		controller.on_frame(&surface);
		controller.on_quiet_period(&surface);

		assert_eq!(controller.live_view(), Some(fresh));
		assert_eq!(surface.view_box(), Some(fresh));
		assert_eq!(commits.borrow().as_slice(), &[fresh]);
	}

	#[test]
	fn cancel_pending_drops_wheel_and_drag_work() {
		let (mut controller, surface, commits) = setup(false);
		let _ = controller.wheel(tick(500.0, 250.0, -1.0), &surface);
		controller.pointer_down(100.0, 100.0, &surface);
		let _ = controller.pointer_move(300.0, 100.0);
		controller.cancel_pending();

		controller.on_frame(&surface);
		controller.on_quiet_period(&surface);
		controller.pointer_up(&surface);

		assert_eq!(controller.live_view(), controller.initial_view());
		assert!(!controller.is_dragging());
		assert!(commits.borrow().is_empty());
		// a fresh tick asks for a frame again
		assert!(controller.wheel(tick(500.0, 250.0, -1.0), &surface).frame);
	}

	#[test]
	fn set_view_replaces_both_rectangles() {
		let (mut controller, surface, commits) = setup(false);
		let rect = ViewRect::new(10.0, 20.0, 30.0, 40.0);
		controller.set_view(rect, &surface);
		assert_eq!(controller.live_view(), Some(rect));
		assert_eq!(controller.committed_view(), Some(rect));
		assert_eq!(surface.view_box(), Some(rect));
		assert_eq!(commits.borrow().as_slice(), &[rect]);

		controller.reset(&surface);
		assert_eq!(controller.committed_view(), controller.initial_view());
	}

	#[test]
	fn zoom_out_is_clamped() {
		let (mut controller, surface, _) = setup(false);
		for _ in 0..200 {
			let _ = controller.wheel(tick(500.0, 250.0, 1.0), &surface);
			controller.on_frame(&surface);
		}
		let live = controller.live_view().unwrap();
		assert!((live.w - 1000.0 * 20.0).abs() < 1e-6);
	}

	#[test]
	fn hysteresis_never_flickers_around_one_value() {
		let mut text = TextVisibility::new(0.45, 0.55);
		let toggles = [0.6, 0.5, 0.46, 0.5, 0.6]
			.into_iter()
			.filter(|&r| text.update(r))
			.count();
		assert_eq!(toggles, 0);
		assert!(!text.is_visible());

		let mut text = TextVisibility::new(0.45, 0.55);
		let states: Vec<bool> = [0.6, 0.44, 0.5, 0.54, 0.55, 0.5]
			.into_iter()
			.map(|r| {
				text.update(r);
				text.is_visible()
			})
			.collect();
		assert_eq!(states, vec![false, true, true, true, false, false]);
	}

	#[test]
	fn large_grid_text_follows_zoom_ratio() {
		let (mut controller, surface, _) = setup(true);
		let root = surface.root().unwrap();
		assert!(surface.has_class(&root, TEXT_HIDDEN_CLASS));

		controller.set_view(ViewRect::new(0.0, 0.0, 400.0, 200.0), &surface);
		assert!(!surface.has_class(&root, TEXT_HIDDEN_CLASS));
		assert!(controller.text_visible());

		controller.set_view(ViewRect::new(0.0, 0.0, 500.0, 250.0), &surface);
		assert!(!surface.has_class(&root, TEXT_HIDDEN_CLASS));

		controller.set_view(ViewRect::new(0.0, 0.0, 600.0, 300.0), &surface);
		assert!(surface.has_class(&root, TEXT_HIDDEN_CLASS));
	}
}
