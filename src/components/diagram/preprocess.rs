//! Raw diagram markup preprocessing.
//!
//! Extracts the native `viewBox` of a diagram and, for very large grids,
//! boosts node shapes, edge labels and legend styles so they stay legible
//! once the whole grid is fitted on screen.
//!
//! Inside embedded `<style>` blocks every `font-size` is multiplied by the
//! boost, whatever rule carries it. Box dimensions are only scaled in the
//! label-box and legend-square rules.
//!
//! The boost is not idempotent: callers apply [`process_svg`] exactly once
//! per raw payload.

use std::cell::Cell;
use std::sync::OnceLock;

use log::{info, warn};
use lol_html::{RewriteStrSettings, element, rewrite_str};
use regex::{Captures, Regex};

use super::config::BoostConfig;
use super::types::ViewRect;

/// Class added to the root element of grids large enough to need
/// hysteresis-driven text visibility.
pub const LARGE_GRID_CLASS: &str = "nad-large-grid";

/// Style rules whose box dimensions are scaled together with the font size.
const LEGEND_BOX_SELECTORS: [&str; 2] = [".nad-label-box", ".nad-legend-square"];

/// Box properties scaled inside [`LEGEND_BOX_SELECTORS`] rules.
const LEGEND_BOX_PROPERTIES: &str = "width|height|min-width|padding";

/// Result of preprocessing one raw payload.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessedSvg {
	/// Markup to render.
	pub markup: String,
	/// Native rectangle, `None` when the markup declares no usable viewBox.
	pub view_box: Option<ViewRect>,
	/// Boost factor applied, `None` when the markup was left untouched.
	pub boost: Option<f64>,
	/// Whether the diagram counts as a large grid.
	pub large_grid: bool,
}

fn view_box_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r#"viewBox\s*=\s*["']([^"']*)["']"#).expect("valid regex"))
}

fn style_block_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"(?s)(<style[^>]*>)(.*?)(</style>)").expect("valid regex"))
}

fn css_rule_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"([^{}]+)\{([^{}]*)\}").expect("valid regex"))
}

fn font_size_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"(font-size\s*:\s*)([0-9]*\.?[0-9]+)(px)?").expect("valid regex"))
}

fn box_property_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| {
		Regex::new(&format!(
			r"((?:^|[;\s])(?:{LEGEND_BOX_PROPERTIES})\s*:\s*)([0-9]*\.?[0-9]+)(px)?"
		))
		.expect("valid regex")
	})
}

fn translate_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| {
		Regex::new(r"^\s*translate\(\s*(-?[0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?)(?:\s*[,\s]\s*(-?[0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?))?\s*\)")
			.expect("valid regex")
	})
}

/// Parse the first `viewBox` declaration of the markup.
///
/// The four numbers may be separated by whitespace, commas or both.
pub fn parse_view_box(markup: &str) -> Option<ViewRect> {
	let caps = view_box_regex().captures(markup)?;
	let values: Vec<f64> = caps[1]
		.split(|c: char| c == ',' || c.is_whitespace())
		.filter(|part| !part.is_empty())
		.map(str::parse)
		.collect::<Result<_, _>>()
		.ok()?;
	match values.as_slice() {
		&[x, y, w, h] => ViewRect::checked(x, y, w, h),
		_ => None,
	}
}

/// Boost factor for a diagram of the given native size, `None` when the
/// markup must stay untouched.
pub fn boost_factor(rect: &ViewRect, element_count: usize, config: &BoostConfig) -> Option<f64> {
	if element_count < config.min_element_count {
		return None;
	}
	let ratio = rect.max_extent() / config.reference_size;
	(ratio > config.boost_ratio).then(|| (ratio / config.boost_ratio).sqrt())
}

/// Parse the native rectangle and apply the large-grid boost.
///
/// `element_count` is a size hint such as the number of voltage levels.
pub fn process_svg(markup: &str, element_count: usize, config: &BoostConfig) -> ProcessedSvg {
	let view_box = parse_view_box(markup);
	let untouched = ProcessedSvg {
		markup: markup.to_string(),
		view_box,
		boost: None,
		large_grid: false,
	};

	let Some(rect) = view_box else {
		return untouched;
	};
	let Some(boost) = boost_factor(&rect, element_count, config) else {
		return untouched;
	};
	let large_grid = rect.max_extent() / config.reference_size > config.large_grid_ratio;

	match boost_markup(markup, boost, large_grid) {
		Ok(markup) => {
			info!(
				"nad-viewport: boosted diagram by {:.2} ({} elements, large grid: {})",
				boost, element_count, large_grid
			);
			ProcessedSvg {
				markup,
				view_box,
				boost: Some(boost),
				large_grid,
			}
		}
		Err(e) => {
			warn!("nad-viewport: markup boost failed, keeping raw markup: {}", e);
			untouched
		}
	}
}

fn boost_markup(
	markup: &str,
	boost: f64,
	large_grid: bool,
) -> Result<String, lol_html::errors::RewritingError> {
	let styled = scale_styles(markup, boost);
	let root_seen = Cell::new(false);

	rewrite_str(
		&styled,
		RewriteStrSettings {
			element_content_handlers: vec![
				element!("svg", |el| {
					if large_grid && !root_seen.replace(true) {
						let class = match el.get_attribute("class") {
							Some(existing) if !existing.trim().is_empty() => {
								format!("{} {}", existing.trim(), LARGE_GRID_CLASS)
							}
							_ => LARGE_GRID_CLASS.to_string(),
						};
						el.set_attribute("class", &class)?;
					}
					Ok(())
				}),
				element!(".nad-vl-nodes > *", |el| {
					let transform = el.get_attribute("transform");
					let anchor = transform
						.as_deref()
						.and_then(translate_of)
						.or_else(|| center_of(el.get_attribute("cx"), el.get_attribute("cy")));
					if let Some((ax, ay)) = anchor {
						let wrapped = format!(
							"translate({},{}) scale({}) translate({},{})",
							fmt_num(ax),
							fmt_num(ay),
							fmt_num(boost),
							fmt_num(-ax),
							fmt_num(-ay)
						);
						let value = match transform {
							Some(inner) if !inner.trim().is_empty() => {
								format!("{} {}", wrapped, inner.trim())
							}
							_ => wrapped,
						};
						el.set_attribute("transform", &value)?;
					}
					Ok(())
				}),
				element!(".nad-edge-infos g[transform]", |el| {
					if let Some(transform) = el.get_attribute("transform") {
						if translate_of(&transform).is_some() {
							let value = format!("{} scale({})", transform.trim(), fmt_num(boost));
							el.set_attribute("transform", &value)?;
						}
					}
					Ok(())
				}),
			],
			..RewriteStrSettings::new()
		},
	)
}

/// Scale font sizes and legend box dimensions inside embedded style blocks.
fn scale_styles(markup: &str, boost: f64) -> String {
	style_block_regex()
		.replace_all(markup, |block: &Captures| {
			let css = css_rule_regex().replace_all(&block[2], |rule: &Captures| {
				let selector = &rule[1];
				let mut body = scale_values(font_size_regex(), &rule[2], boost);
				if LEGEND_BOX_SELECTORS.iter().any(|s| selector.contains(s)) {
					body = scale_values(box_property_regex(), &body, boost);
				}
				format!("{}{{{}}}", selector, body)
			});
			format!("{}{}{}", &block[1], css, &block[3])
		})
		.into_owned()
}

fn scale_values(re: &Regex, body: &str, boost: f64) -> String {
	re.replace_all(body, |caps: &Captures| {
		let value: f64 = caps[2].parse().unwrap_or(0.0);
		format!(
			"{}{}{}",
			&caps[1],
			fmt_num(value * boost),
			caps.get(3).map_or("", |m| m.as_str())
		)
	})
	.into_owned()
}

fn translate_of(transform: &str) -> Option<(f64, f64)> {
	let caps = translate_regex().captures(transform)?;
	let x = caps[1].parse().ok()?;
	let y = caps.get(2).map_or(Some(0.0), |m| m.as_str().parse().ok())?;
	Some((x, y))
}

fn center_of(cx: Option<String>, cy: Option<String>) -> Option<(f64, f64)> {
	Some((cx?.trim().parse().ok()?, cy?.trim().parse().ok()?))
}

/// Compact number formatting for attribute values (at most 4 decimals).
fn fmt_num(value: f64) -> String {
	let text = format!("{:.4}", value);
	let text = text.trim_end_matches('0').trim_end_matches('.');
	if text == "-0" { "0".to_string() } else { text.to_string() }
}
