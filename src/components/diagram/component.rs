//! Leptos component hosting one diagram slot.
//!
//! The component owns the slot's container, controller and index. Input
//! events go straight to the controller; the frame and quiet-period wakeups it
//! returns are turned into `requestAnimationFrame` and `setTimeout` calls here.
//! Overlays are re-applied by effects whenever their inputs or the rendered
//! content change.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{Element, MouseEvent, WheelEvent};

use super::config::ViewerConfig;
use super::dom::DomSurface;
use super::index::MetadataIndex;
use super::overlay;
use super::preprocess::process_svg;
use super::spatial;
use super::types::{AnalysisResult, DiagramPayload, NominalVoltages, ViewRect};
use super::viewport::{ViewportController, Wakeups, WheelInput};

/// Everything one mounted slot owns.
struct SlotContext {
	controller: ViewportController,
	surface: DomSurface,
	index: Option<Rc<MetadataIndex>>,
	frame: Option<i32>,
	quiet_timer: Option<i32>,
}

impl SlotContext {
	/// Drop outstanding animation-frame and timer requests.
	fn cancel_scheduled(&mut self) {
		let Some(window) = web_sys::window() else {
			return;
		};
		if let Some(handle) = self.frame.take() {
			let _ = window.cancel_animation_frame(handle);
		}
		if let Some(handle) = self.quiet_timer.take() {
			window.clear_timeout_with_handle(handle);
		}
	}
}

type Slot = Rc<RefCell<Option<SlotContext>>>;

/// JS callbacks handed to the browser scheduler.
#[derive(Default)]
struct Callbacks {
	frame: RefCell<Option<Closure<dyn FnMut()>>>,
	quiet: RefCell<Option<Closure<dyn FnMut()>>>,
}

/// Run `f` on the slot while its container is still in the document.
fn with_slot<R>(slot: &Slot, f: impl FnOnce(&mut SlotContext) -> R) -> Option<R> {
	let mut guard = slot.try_borrow_mut().ok()?;
	let ctx = guard.as_mut()?;
	if !ctx.surface.is_connected() {
		return None;
	}
	Some(f(ctx))
}

fn schedule(slot: &Slot, callbacks: &Callbacks, wakeups: Wakeups) {
	if wakeups == Wakeups::NONE {
		return;
	}
	let Some(window) = web_sys::window() else {
		return;
	};
	with_slot(slot, |ctx| {
		if wakeups.frame {
			if let Some(cb) = callbacks.frame.borrow().as_ref() {
				ctx.frame = window
					.request_animation_frame(cb.as_ref().unchecked_ref::<js_sys::Function>())
					.ok();
			}
		}
		if wakeups.quiet_timer {
			if let Some(handle) = ctx.quiet_timer.take() {
				window.clear_timeout_with_handle(handle);
			}
			if let Some(cb) = callbacks.quiet.borrow().as_ref() {
				let delay = i32::try_from(ctx.controller.config().quiet_period_ms).unwrap_or(i32::MAX);
				ctx.quiet_timer = window
					.set_timeout_with_callback_and_timeout_and_arguments_0(
						cb.as_ref().unchecked_ref::<js_sys::Function>(),
						delay,
					)
					.ok();
			}
		}
	});
}

/// Renders one pannable, zoomable network diagram with its overlays.
///
/// Only the `active` slot reacts to input; an inactive slot keeps its
/// committed view and repaints it when activated again. `view` pushes a
/// rectangle in from outside (cross-slot synchronisation); `on_commit`
/// reports every committed rectangle.
#[component]
pub fn DiagramViewer(
	#[prop(into)] payload: Signal<Option<DiagramPayload>>,
	#[prop(into, default = Signal::stored(None))] analysis: Signal<Option<AnalysisResult>>,
	#[prop(into, default = Signal::stored(true))] active: Signal<bool>,
	#[prop(default = ViewerConfig::default())] config: ViewerConfig,
	#[prop(into, default = Signal::stored(false))] delta_mode: Signal<bool>,
	#[prop(into, default = Signal::stored(None))] voltages: Signal<Option<NominalVoltages>>,
	#[prop(into, default = Signal::stored(None))] voltage_range: Signal<Option<(f64, f64)>>,
	#[prop(into, default = Signal::stored(String::new()))] zoom_target: Signal<String>,
	#[prop(into, default = Signal::stored(None))] view: Signal<Option<ViewRect>>,
	#[prop(optional)] on_commit: Option<Callback<ViewRect>>,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let slot: Slot = Rc::new(RefCell::new(None));
	let callbacks = Rc::new(Callbacks::default());
	// bumped after every content load so overlays re-apply on the new tree
	let content_version = RwSignal::new(0u64);

	let slot_frame = slot.clone();
	*callbacks.frame.borrow_mut() = Some(Closure::new(move || {
		with_slot(&slot_frame, |ctx| {
			ctx.frame = None;
			ctx.controller.on_frame(&ctx.surface);
		});
	}));
	let slot_quiet = slot.clone();
	*callbacks.quiet.borrow_mut() = Some(Closure::new(move || {
		with_slot(&slot_quiet, |ctx| {
			ctx.quiet_timer = None;
			ctx.controller.on_quiet_period(&ctx.surface);
		});
	}));

	let (slot_load, load_config) = (slot.clone(), config.clone());
	Effect::new(move |_| {
		let Some(div) = container_ref.get() else {
			return;
		};
		let Some(payload) = payload.get() else {
			return;
		};
		let container: Element = div.into();

		let index = match MetadataIndex::from_metadata(&payload.metadata) {
			Ok(index) => Some(Rc::new(index)),
			Err(e) => {
				warn!("nad-viewport: {}", e);
				None
			}
		};
		let hint = index.as_ref().map_or(0, |index| index.node_count());
		let processed = process_svg(&payload.markup, hint, &load_config.boost);
		info!(
			"nad-viewport: loaded diagram, {} nodes, {} edges, boost {:?}, large grid {}",
			hint,
			index.as_ref().map_or(0, |index| index.edge_count()),
			processed.boost,
			processed.large_grid
		);

		let mut guard = slot_load.borrow_mut();
		let ctx = guard.get_or_insert_with(|| {
			let mut controller = ViewportController::new(load_config.viewport.clone());
			if let Some(cb) = on_commit {
				controller.subscribe(move |rect| cb.run(rect));
			}
			SlotContext {
				controller,
				surface: DomSurface::new(container),
				index: None,
				frame: None,
				quiet_timer: None,
			}
		});
		ctx.cancel_scheduled();
		ctx.controller.cancel_pending();
		ctx.surface.set_markup(&processed.markup);
		ctx.index = index;
		ctx.controller
			.load(processed.view_box, processed.large_grid, &ctx.surface);
		if active.get_untracked() {
			ctx.controller.attach(&ctx.surface);
		}
		drop(guard);
		content_version.update(|v| *v += 1);
	});

	let slot_active = slot.clone();
	Effect::new(move |_| {
		let active = active.get();
		with_slot(&slot_active, |ctx| {
			if active {
				ctx.controller.attach(&ctx.surface);
			} else {
				ctx.controller.detach();
				ctx.cancel_scheduled();
			}
		});
	});

	let slot_view = slot.clone();
	Effect::new(move |_| {
		let Some(rect) = view.get() else {
			return;
		};
		with_slot(&slot_view, |ctx| {
			if ctx.controller.committed_view() != Some(rect) {
				ctx.controller.set_view(rect, &ctx.surface);
			}
		});
	});

	let slot_overloads = slot.clone();
	Effect::new(move |_| {
		content_version.track();
		let lines = analysis.with(|a| a.as_ref().map(|a| a.overloaded_lines.clone()).unwrap_or_default());
		with_slot(&slot_overloads, |ctx| {
			overlay::apply_overloads(&ctx.surface, ctx.index.as_deref(), &lines)
		});
	});

	let slot_halo = slot.clone();
	Effect::new(move |_| {
		content_version.track();
		let action_id = payload.with(|p| p.as_ref().and_then(|p| p.action_id.clone()));
		let detail = action_id.as_ref().and_then(|id| {
			analysis.with(|a| a.as_ref().and_then(|a| a.actions.get(id).cloned()))
		});
		with_slot(&slot_halo, |ctx| match &action_id {
			Some(id) => {
				overlay::highlight_action(&ctx.surface, ctx.index.as_deref(), id, detail.as_ref());
			}
			None => overlay::clear_action_halo(&ctx.surface),
		});
	});

	let slot_deltas = slot.clone();
	Effect::new(move |_| {
		content_version.track();
		let active = delta_mode.get();
		let deltas = payload.with(|p| p.as_ref().and_then(|p| p.flow_deltas.clone()));
		with_slot(&slot_deltas, |ctx| {
			overlay::apply_delta_flows(&ctx.surface, ctx.index.as_deref(), deltas.as_ref(), active)
		});
	});

	let slot_voltage = slot.clone();
	Effect::new(move |_| {
		content_version.track();
		let range = voltage_range.get();
		voltages.with(|voltages| {
			with_slot(&slot_voltage, |ctx| {
				overlay::apply_voltage_filter(&ctx.surface, ctx.index.as_deref(), voltages.as_ref(), range)
			})
		});
	});

	let (slot_zoom, spatial_config) = (slot.clone(), config.spatial.clone());
	Effect::new(move |_| {
		content_version.track();
		let target = zoom_target.get();
		with_slot(&slot_zoom, |ctx| {
			if target.trim().is_empty() {
				spatial::clear_zoom_target(&ctx.surface, &mut ctx.controller);
			} else {
				spatial::zoom_to_target(
					&ctx.surface,
					&mut ctx.controller,
					ctx.index.as_deref(),
					&spatial_config,
					&target,
				);
			}
		});
	});

	let (slot_cleanup, callbacks_cleanup) = (
		StoredValue::new_local(slot.clone()),
		StoredValue::new_local(callbacks.clone()),
	);
	on_cleanup(move || {
		slot_cleanup.try_with_value(|slot| {
			if let Ok(mut guard) = slot.try_borrow_mut() {
				if let Some(ctx) = guard.as_mut() {
					ctx.controller.cancel_pending();
					ctx.cancel_scheduled();
				}
				*guard = None;
			}
		});
		callbacks_cleanup.try_with_value(|callbacks| {
			callbacks.frame.borrow_mut().take();
			callbacks.quiet.borrow_mut().take();
		});
	});

	let (slot_wh, callbacks_wh) = (slot.clone(), callbacks.clone());
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let input = WheelInput {
			client_x: ev.client_x() as f64,
			client_y: ev.client_y() as f64,
			delta_y: ev.delta_y(),
		};
		if let Some(wakeups) = with_slot(&slot_wh, |ctx| ctx.controller.wheel(input, &ctx.surface)) {
			schedule(&slot_wh, &callbacks_wh, wakeups);
		}
	};

	let slot_md = slot.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let (x, y) = (ev.client_x() as f64, ev.client_y() as f64);
		with_slot(&slot_md, |ctx| ctx.controller.pointer_down(x, y, &ctx.surface));
	};

	let (slot_mm, callbacks_mm) = (slot.clone(), callbacks.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let (x, y) = (ev.client_x() as f64, ev.client_y() as f64);
		if let Some(wakeups) = with_slot(&slot_mm, |ctx| ctx.controller.pointer_move(x, y)) {
			schedule(&slot_mm, &callbacks_mm, wakeups);
		}
	};

	let slot_mu = slot.clone();
	let on_mouseup = move |_: MouseEvent| {
		with_slot(&slot_mu, |ctx| ctx.controller.pointer_up(&ctx.surface));
	};

	let slot_ml = slot.clone();
	let on_mouseleave = move |_: MouseEvent| {
		with_slot(&slot_ml, |ctx| ctx.controller.pointer_up(&ctx.surface));
	};

	view! {
		<div
			node_ref=container_ref
			class="nad-viewport"
			on:wheel=on_wheel
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			style="width: 100%; height: 100%; overflow: hidden; cursor: grab;"
		/>
	}
}
