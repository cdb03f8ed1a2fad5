//! nad-viewport: Interactive viewer for large network area diagrams.
//!
//! This crate provides a WASM component that renders power-network diagrams
//! with batched pan/zoom, voltage-level filtering and analysis overlays
//! (overloads, action targets, flow deltas).

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::diagram::{
	AnalysisResult, DiagramPayload, DiagramViewer, MetadataIndex, NominalVoltages, ViewRect, ViewerConfig,
	ViewportController,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("nad-viewport: logging initialized");
}

/// Text of the `<script>` element with the given id.
fn script_text(id: &str) -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Parse a JSON script block, logging parse failures.
fn load_json<T: DeserializeOwned>(id: &str) -> Option<T> {
	let text = script_text(id)?;
	match serde_json::from_str::<T>(&text) {
		Ok(value) => Some(value),
		Err(e) => {
			warn!("nad-viewport: failed to parse #{}: {}", id, e);
			None
		}
	}
}

/// Load the diagram payload from a script element with id="diagram-data".
fn load_payload() -> Option<DiagramPayload> {
	let text = script_text("diagram-data")?;
	match DiagramPayload::from_json(&text) {
		Ok(payload) => {
			info!(
				"nad-viewport: loaded payload, {} bytes of markup, converged {:?}",
				payload.markup.len(),
				payload.converged
			);
			Some(payload)
		}
		Err(e) => {
			warn!("nad-viewport: {}", e);
			None
		}
	}
}

/// Main application component.
/// Loads the diagram and analysis data from the DOM and renders one viewer.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = load_json::<ViewerConfig>("viewer-config").unwrap_or_default();
	let payload = load_payload();
	let has_deltas = payload.as_ref().is_some_and(|p| p.flow_deltas.is_some());
	let analysis = load_json::<AnalysisResult>("analysis-data");
	let voltages = load_json::<NominalVoltages>("voltage-data");
	let range = voltages.as_ref().and_then(NominalVoltages::full_range);
	let action_summary = payload
		.as_ref()
		.and_then(|p| p.action_id.as_deref())
		.and_then(|id| {
			let detail = analysis.as_ref()?.actions.get(id)?;
			Some(format!("{}: {}", id, detail.summary()))
		});

	let (delta_mode, set_delta_mode) = signal(false);
	let (committed, set_committed) = signal(None::<ViewRect>);

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Network Area Diagram" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-diagram">
			<DiagramViewer
				payload=Signal::stored(payload)
				analysis=Signal::stored(analysis)
				config=config
				delta_mode=delta_mode
				voltages=Signal::stored(voltages)
				voltage_range=Signal::stored(range)
				on_commit=Callback::new(move |rect: ViewRect| set_committed.set(Some(rect)))
			/>
			<div class="diagram-overlay">
				<h1>"Network Area Diagram"</h1>
				<p class="subtitle">"Scroll to zoom. Drag to pan."</p>
				{action_summary.map(|text| view! { <p class="action-summary">{text}</p> })}
				<Show when=move || has_deltas>
					<label>
						<input type="checkbox" on:change=move |ev| set_delta_mode.set(event_target_checked(&ev)) />
						" Show flow deltas"
					</label>
				</Show>
				<p class="view-readout">
					{move || {
						committed
							.get()
							.map(|r| format!("{:.0}, {:.0} ({:.0} x {:.0})", r.x, r.y, r.w, r.h))
					}}
				</p>
			</div>
		</div>
	}
}
