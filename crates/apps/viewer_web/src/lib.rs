use std::cell::RefCell;

use console_error_panic_hook::set_once;
use gloo_net::http::Request;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use explorer::{ExplorerController, PanelSize, filter_features};
use formats::paths::{chunk_mapping_path, features_path, metadata_path, sample_chunk_path};
use formats::{
    ChunkMapping, FeatureTableReader, JsonRowsReader, ModelMetadata, rows_to_records,
    table_version,
};
use foundation::ids::FeatureId;
use store::FeatureStore;
use streaming::{CacheKey, ChunkCache, LoadTracker, MemoryBudget, ResidencyState};

// Decoded sample chunks kept in memory at once.
const CHUNK_CACHE_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug)]
pub struct AppState {
    pub base_url: String,
    pub controller: Option<ExplorerController>,
    pub loads: LoadTracker,
    pub metadata: Option<ModelMetadata>,
    pub chunk_mapping: Option<ChunkMapping>,
    pub chunk_cache: ChunkCache,
    pub panel: PanelSize,
}

thread_local! {
    static STATE: RefCell<AppState> = RefCell::new(AppState {
        base_url: "/models".to_string(),
        controller: None,
        loads: LoadTracker::new(),
        metadata: None,
        chunk_mapping: None,
        chunk_cache: ChunkCache::new(MemoryBudget::new(CHUNK_CACHE_BYTES)),
        panel: PanelSize {
            width: 1280.0,
            height: 720.0,
        },
    });
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

#[wasm_bindgen]
pub fn configure(base_url: &str) {
    STATE.with(|state| {
        state.borrow_mut().base_url = base_url.to_string();
    });
}

#[wasm_bindgen]
pub fn set_panel_size(width: f64, height: f64) {
    STATE.with(|state| {
        state.borrow_mut().panel = PanelSize { width, height };
    });
}

/// Kicks off the JSON loads for `model` and marks it as the current model.
///
/// The feature table itself is columnar; the host decodes it (range fetch +
/// parquet reader) and hands the rows to `commit_features`. The URL to
/// fetch is returned so the host doesn't duplicate the path scheme.
#[wasm_bindgen]
pub fn load_model(model: String) -> String {
    let (base, ticket) = STATE.with(|state| {
        let mut s = state.borrow_mut();
        let ticket = s.loads.begin(model.clone());
        (s.base_url.clone(), ticket)
    });

    spawn_local(async move {
        let meta_url = metadata_path(&base, ticket.model());
        let mapping_url = chunk_mapping_path(&base, ticket.model());

        let metadata = fetch_json(&meta_url)
            .await
            .and_then(|t| ModelMetadata::from_json(&t).map_err(|e| e.to_string()));
        let metadata = match metadata {
            Ok(m) => Some(m),
            Err(err) => {
                log(&format!("metadata load failed for {}: {err}", ticket.model()));
                None
            }
        };
        let mapping = fetch_json(&mapping_url)
            .await
            .and_then(|t| ChunkMapping::from_json(&t).map_err(|e| e.to_string()));
        let mapping = match mapping {
            Ok(m) => Some(m),
            Err(err) => {
                log(&format!(
                    "chunk mapping load failed for {}: {err}",
                    ticket.model()
                ));
                None
            }
        };

        STATE.with(|state| {
            let mut s = state.borrow_mut();
            // A response for a superseded model must not overwrite state.
            if !s.loads.is_current(&ticket) {
                log(&format!("discarding stale load for {}", ticket.model()));
                return;
            }
            if metadata.is_some() {
                s.metadata = metadata;
            }
            if mapping.is_some() {
                s.chunk_mapping = mapping;
            }
        });
    });

    STATE.with(|state| features_path(&state.borrow().base_url, &model))
}

/// Commits the decoded feature table for `model`.
///
/// Rejected (returning `false`) when `model` is no longer the current
/// model or the rows fail to parse; accepted commits rebuild the
/// controller, pin the chunk cache to the table's content version, and
/// leave selection restoration to a following `restore_from_hash` call.
#[wasm_bindgen]
pub fn commit_features(model: &str, rows_json: &str) -> bool {
    let rows = match JsonRowsReader.read_feature_table(rows_json.as_bytes()) {
        Ok(rows) => rows,
        Err(err) => {
            log(&format!("feature table decode failed for {model}: {err}"));
            return false;
        }
    };
    let version = table_version(rows_json.as_bytes());

    STATE.with(|state| {
        let mut s = state.borrow_mut();
        if s.loads.current_model() != Some(model) {
            log(&format!("discarding stale feature table for {model}"));
            return false;
        }

        let store = FeatureStore::from_records(rows_to_records(rows));
        s.chunk_cache.pin_model_version(model, version);
        match s.controller.as_mut() {
            Some(c) => c.set_model(model, store),
            None => s.controller = Some(ExplorerController::new(model, store)),
        }
        true
    })
}

/// Re-applies the fragment in `window.location.hash`; returns the index
/// list the host must mirror onto the scatter widget.
///
/// Call after `commit_features` (the store may not have been loaded when
/// the page opened) — reapplying an already-applied fragment is a no-op.
#[wasm_bindgen]
pub fn restore_from_hash() -> Vec<u32> {
    let fragment = location_hash().unwrap_or_default();
    let mut mirrored: Vec<u32> = Vec::new();
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        if let Some(c) = s.controller.as_mut() {
            c.restore_from_url(&fragment, |idxs| {
                mirrored = idxs.iter().map(|i| *i as u32).collect();
            });
        }
    });
    mirrored
}

/// Scatter widget `onSelect` callback: positional indices, 0 or 1 in
/// practice.
#[wasm_bindgen]
pub fn on_select(indices: Vec<u32>) {
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        let Some(c) = s.controller.as_mut() else {
            return;
        };
        match indices.first() {
            Some(i) => c.select_by_index(*i as usize),
            None => c.clear_selection(),
        }
        sync_location_hash(&c.state().fragment);
        let cleared = c.state().selected_index.is_none();
        if cleared {
            s.chunk_cache.focus(None);
        }
    });
}

/// Scatter widget `onHover` callback; `None` when the pointer leaves all
/// points.
#[wasm_bindgen]
pub fn on_hover(index: Option<u32>) {
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        if let Some(c) = s.controller.as_mut() {
            c.set_hovered_index(index.map(|i| i as usize));
        }
    });
}

/// Scatter widget `onView` callback; fires every pan/zoom frame.
#[wasm_bindgen]
pub fn on_view(x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        if let Some(c) = s.controller.as_mut() {
            c.update_view([x_min, x_max], [y_min, y_max]);
        }
    });
}

/// Selection from the search control or the similar-features list; returns
/// the index list to mirror onto the widget.
#[wasm_bindgen]
pub fn select_feature(id: Option<u32>) -> Vec<u32> {
    let mut mirrored: Vec<u32> = Vec::new();
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        let Some(c) = s.controller.as_mut() else {
            return;
        };
        c.select_by_feature(id.map(FeatureId), |idxs| {
            mirrored = idxs.iter().map(|i| *i as u32).collect();
        });
        sync_location_hash(&c.state().fragment);
        let cleared = c.state().selected_index.is_none();
        if cleared {
            s.chunk_cache.focus(None);
        }
    });
    mirrored
}

/// Hover from the similar-features list.
#[wasm_bindgen]
pub fn hover_feature(id: Option<u32>) {
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        if let Some(c) = s.controller.as_mut() {
            c.set_hovered_feature(id.map(FeatureId));
        }
    });
}

/// Runs the text search and applies it as the highlight filter; returns
/// the highlighted indices (empty when filtering is a no-op).
#[wasm_bindgen]
pub fn search(query: &str) -> Vec<u32> {
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        let Some(c) = s.controller.as_mut() else {
            return Vec::new();
        };
        let matches = filter_features(c.store(), query);
        c.apply_text_filter(&matches);
        c.state()
            .filtered_indices
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(|i| *i as u32)
            .collect()
    })
}

#[derive(Debug, Serialize)]
struct FeatureOut {
    id: u32,
    label: String,
    max_activation: f64,
    order: f64,
}

#[derive(Debug, Serialize)]
struct TooltipOut {
    x_px: f64,
    y_px: f64,
    id: u32,
    label: String,
}

/// `[top10_x, top10_y, order]` rows for the scatter widget, in index order.
#[wasm_bindgen]
pub fn plot_points_json() -> String {
    STATE.with(|state| {
        let s = state.borrow();
        let points = s
            .controller
            .as_ref()
            .map(|c| c.store().plot_points())
            .unwrap_or_default();
        serde_json::to_string(&points).unwrap_or_else(|_| "[]".to_string())
    })
}

/// Similar-features list for the detail panel, nearest first.
#[wasm_bindgen]
pub fn neighbors_json() -> String {
    STATE.with(|state| {
        let s = state.borrow();
        let out: Vec<FeatureOut> = s
            .controller
            .as_ref()
            .map(|c| {
                c.neighbors()
                    .iter()
                    .map(|r| FeatureOut {
                        id: r.id.0,
                        label: r.label.clone(),
                        max_activation: r.max_activation,
                        order: r.order,
                    })
                    .collect()
            })
            .unwrap_or_default();
        serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
    })
}

/// Tooltip anchor + label for the current hover, or `null`.
#[wasm_bindgen]
pub fn hover_tooltip_json() -> Option<String> {
    STATE.with(|state| {
        let s = state.borrow();
        let c = s.controller.as_ref()?;
        let anchor = c.hover_tooltip(s.panel)?;
        let record = c.hovered_feature()?;
        serde_json::to_string(&TooltipOut {
            x_px: anchor.x_px,
            y_px: anchor.y_px,
            id: record.id.0,
            label: record.label.clone(),
        })
        .ok()
    })
}

#[wasm_bindgen]
pub fn metadata_json() -> Option<String> {
    STATE.with(|state| {
        let s = state.borrow();
        s.metadata
            .as_ref()
            .and_then(|m| serde_json::to_string(m).ok())
    })
}

/// Resolves the sample-chunk URL for the selected feature and registers
/// the fetch with the chunk cache. `None` when nothing is selected or the
/// mapping has no entry for the feature.
#[wasm_bindgen]
pub fn sample_chunk_url() -> Option<String> {
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        let id = s
            .controller
            .as_ref()
            .and_then(|c| c.selected_feature())
            .map(|r| r.id)?;
        let model = s.loads.current_model()?.to_string();
        let chunk = s.chunk_mapping.as_ref()?.chunk_for(id)?;

        let key = CacheKey::new(model.clone(), format!("chunk_{chunk}"));
        if s.chunk_cache.state(&key) == Some(ResidencyState::Resident) {
            let _ = s.chunk_cache.touch(&key);
        } else {
            s.chunk_cache.begin_fetch(key.clone());
        }
        // The chunk backing the detail panel must survive eviction.
        s.chunk_cache.focus(Some(key));

        Some(sample_chunk_path(&s.base_url, &model, chunk))
    })
}

/// Host callback once a sample chunk has been fetched and decoded.
#[wasm_bindgen]
pub fn note_chunk_resident(chunk: u32, bytes: usize) {
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        let Some(model) = s.loads.current_model().map(|m| m.to_string()) else {
            return;
        };
        let key = CacheKey::new(model, format!("chunk_{chunk}"));
        if let Err(err) = s.chunk_cache.mark_resident(&key, bytes) {
            log(&format!("chunk cache: {err}"));
        }
    });
}

async fn fetch_json(url: &str) -> Result<String, String> {
    let resp = Request::get(url).send().await.map_err(|e| e.to_string())?;
    resp.text().await.map_err(|e| e.to_string())
}

fn location_hash() -> Option<String> {
    let win = web_sys::window()?;
    win.location().hash().ok()
}

fn sync_location_hash(fragment: &str) {
    if let Some(win) = web_sys::window() {
        let _ = win.location().set_hash(fragment);
    }
}

fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}
