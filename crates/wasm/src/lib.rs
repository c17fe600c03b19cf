use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use borough_lens_core::config::ExplorerConfig;
use borough_lens_core::detail::{CacheEntry, DetailError, DetailView, slug_from_url};
use borough_lens_core::model::{BoroughDetail, ElementSpec, SceneTree};
use borough_lens_core::scroll::{ScrollGeometry, SectionGeometry};
use borough_lens_core::viz::{Pointer, SurfaceKind};
use borough_lens_core::Explorer;
use borough_lens_protocol::Viewport;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

static EXPLORERS: Mutex<Vec<Explorer>> = Mutex::new(Vec::new());

fn explorers() -> Result<MutexGuard<'static, Vec<Explorer>>, JsError> {
    EXPLORERS
        .lock()
        .map_err(|_| JsError::new("explorer state poisoned"))
}

fn with_explorer<T>(handle: usize, f: impl FnOnce(&mut Explorer) -> T) -> Result<T, JsError> {
    let mut explorers = explorers()?;
    let explorer = explorers
        .get_mut(handle)
        .ok_or_else(|| JsError::new("invalid explorer handle"))?;
    Ok(f(explorer))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&e.to_string()))
}

fn surface_kind(surface: &str) -> Result<SurfaceKind, JsError> {
    match surface {
        "map" => Ok(SurfaceKind::Map),
        "line" => Ok(SurfaceKind::Line),
        "rank" => Ok(SurfaceKind::Rank),
        _ => Err(JsError::new(&format!("unknown surface: {surface}"))),
    }
}

/// Browsers report time as fractional milliseconds.
fn millis(now_ms: f64) -> u64 {
    if now_ms.is_finite() && now_ms > 0.0 { now_ms as u64 } else { 0 }
}

/// Create an explorer over a mirror of the page (a JSON array of
/// `{tag, id, classes, listeners, children}`). `config_json` may be `"{}"`;
/// `now_ms` is `performance.now()` and seeds the clock.
/// Returns a handle for later calls.
#[wasm_bindgen]
pub fn create_explorer(config_json: &str, page_json: &str, now_ms: f64) -> Result<usize, JsError> {
    let config = ExplorerConfig::from_json(config_json.as_bytes())
        .map_err(|e| JsError::new(&e.to_string()))?;
    let page: Vec<ElementSpec> =
        serde_json::from_str(page_json).map_err(|e| JsError::new(&e.to_string()))?;
    let explorer = Explorer::starting_at(config, SceneTree::from_elements(&page), millis(now_ms));
    let mut explorers = explorers()?;
    explorers.push(explorer);
    Ok(explorers.len() - 1)
}

/// Load the housing CSV and the borough topology. On failure the error is
/// logged, returned, and the charts stay empty.
#[wasm_bindgen]
pub fn load_datasets(handle: usize, csv: &[u8], topology: &[u8]) -> Result<(), JsError> {
    with_explorer(handle, |ex| ex.load_datasets(csv, topology))?
        .map_err(|e| JsError::new(&e.to_string()))
}

/// Scroll listener. `true` means the page should request an animation frame.
#[wasm_bindgen]
pub fn on_scroll(handle: usize) -> Result<bool, JsError> {
    with_explorer(handle, Explorer::scroll)
}

#[derive(Deserialize)]
struct FrameInput {
    scroll_y: f64,
    viewport_height: f64,
    sections: BTreeMap<String, SectionGeometry>,
}

/// Animation frame. `frame_json` is
/// `{scroll_y, viewport_height, sections: {id: {rect_top, height}}}`.
/// Returns the section status list so the page can mirror styles.
#[wasm_bindgen]
pub fn on_frame(handle: usize, frame_json: &str) -> Result<String, JsError> {
    let input: FrameInput =
        serde_json::from_str(frame_json).map_err(|e| JsError::new(&e.to_string()))?;
    let scroll = ScrollGeometry {
        scroll_y: input.scroll_y,
        viewport_height: input.viewport_height,
    };
    let status = with_explorer(handle, |ex| {
        ex.frame(&scroll, &input.sections);
        ex.status()
    })?;
    to_json(&status)
}

/// Fullscreen button of section `id`. Returns whether it is now fullscreen.
#[wasm_bindgen]
pub fn toggle_fullscreen(handle: usize, id: &str) -> Result<bool, JsError> {
    with_explorer(handle, |ex| ex.toggle_fullscreen(id))?
        .ok_or_else(|| JsError::new(&format!("unknown section: {id}")))
}

/// Escape key. Returns how many sections left fullscreen.
#[wasm_bindgen]
pub fn escape(handle: usize) -> Result<usize, JsError> {
    with_explorer(handle, Explorer::escape)
}

/// Advance the clock (`performance.now()`), running due hide and play tasks.
#[wasm_bindgen]
pub fn advance_clock(handle: usize, now_ms: f64) -> Result<(), JsError> {
    with_explorer(handle, |ex| ex.advance_clock(millis(now_ms)))
}

/// The mirrored scene tree, for applying relocations and styles to the DOM.
#[wasm_bindgen]
pub fn scene(handle: usize) -> Result<String, JsError> {
    with_explorer(handle, |ex| to_json(ex.tree()))?
}

#[wasm_bindgen]
pub fn section_status(handle: usize) -> Result<String, JsError> {
    with_explorer(handle, |ex| to_json(&ex.status()))?
}

/// Slider input. Returns the index actually shown.
#[wasm_bindgen]
pub fn set_date(handle: usize, index: usize) -> Result<usize, JsError> {
    with_explorer(handle, |ex| ex.set_date(index))?
        .ok_or_else(|| JsError::new("datasets not loaded"))
}

#[wasm_bindgen]
pub fn date_label(handle: usize) -> Result<Option<String>, JsError> {
    with_explorer(handle, |ex| ex.date_label().map(str::to_string))
}

/// Play/pause button. Returns whether playback is running.
#[wasm_bindgen]
pub fn toggle_play(handle: usize) -> Result<bool, JsError> {
    with_explorer(handle, Explorer::toggle_play)
}

#[wasm_bindgen]
pub fn hover(handle: usize, surface: &str, borough: &str, page_x: f64, page_y: f64) -> Result<bool, JsError> {
    let kind = surface_kind(surface)?;
    let pointer = Pointer { x: page_x, y: page_y };
    with_explorer(handle, |ex| ex.hover(kind, borough, pointer))
}

#[wasm_bindgen]
pub fn pointer_move(handle: usize, page_x: f64, page_y: f64) -> Result<(), JsError> {
    with_explorer(handle, |ex| ex.pointer_move(Pointer { x: page_x, y: page_y }))
}

#[wasm_bindgen]
pub fn leave(handle: usize) -> Result<(), JsError> {
    with_explorer(handle, Explorer::leave)
}

/// Render one surface ("map", "line" or "rank") as render commands JSON.
#[wasm_bindgen]
pub fn render_view(handle: usize, surface: &str, width: f64, height: f64) -> Result<String, JsError> {
    let kind = surface_kind(surface)?;
    let viewport = Viewport::new(width, height);
    with_explorer(handle, |ex| to_json(&ex.render(kind, &viewport)))?
}

#[wasm_bindgen]
pub fn render_tooltip(handle: usize) -> Result<String, JsError> {
    with_explorer(handle, |ex| to_json(&ex.render_tooltip()))?
}

/// Render one surface as a standalone SVG string.
#[wasm_bindgen]
pub fn render_svg(handle: usize, surface: &str, width: f64, height: f64, dark: bool) -> Result<String, JsError> {
    let kind = surface_kind(surface)?;
    let viewport = Viewport::new(width, height);
    with_explorer(handle, |ex| ex.render_svg(kind, &viewport, dark))
}

/// `?borough=` from the page URL, or the "No borough specified" error.
#[wasm_bindgen]
pub fn borough_slug(page_url: &str) -> Result<String, JsError> {
    slug_from_url(page_url).map_err(|e| JsError::new(&e.to_string()))
}

/// The cached record inside a `localStorage` value if it is still fresh.
/// `None` tells the page to drop the entry and fetch.
#[wasm_bindgen]
pub fn fresh_cached_detail(raw_entry: &str, now_ms: f64, ttl_ms: f64) -> Option<String> {
    let entry: CacheEntry = serde_json::from_str(raw_entry).ok()?;
    if !entry.is_fresh(millis(now_ms), millis(ttl_ms)) {
        return None;
    }
    serde_json::to_string(&entry.data).ok()
}

/// Wrap an API body for `localStorage`.
#[wasm_bindgen]
pub fn cache_entry(borough_json: &str, now_ms: f64) -> Result<String, JsError> {
    let data: BoroughDetail =
        serde_json::from_str(borough_json).map_err(|e| JsError::new(&e.to_string()))?;
    to_json(&CacheEntry {
        data,
        timestamp: millis(now_ms),
    })
}

/// View model for the detail page: the API body on success, or the HTTP
/// status when the fetch failed (`0` for network errors).
#[wasm_bindgen]
pub fn detail_view(borough_json: Option<String>, status: u16) -> Result<String, JsError> {
    let result = match (borough_json, DetailError::from_status(status)) {
        (_, Some(e)) => Err(e),
        (Some(body), None) => serde_json::from_str::<BoroughDetail>(&body)
            .map_err(|e| DetailError::LoadFailure(e.to_string())),
        (None, None) => Err(DetailError::load_failure()),
    };
    to_json(&DetailView::from_result(result))
}
