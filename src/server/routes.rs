use crate::state::{AppState, EngineEvent, ViewSnapshot};
use crate::view::{Moneyness, MAX_WINDOW_SIZE};
use axum::extract::State;
use axum::response::Json;
use portable_atomic::Ordering;
use std::sync::Arc;

#[derive(serde::Deserialize)]
pub struct WindowBody {
    pub size: usize,
}

#[derive(serde::Deserialize)]
pub struct FilterBody {
    pub mode: String,
}

/// GET /api/view -- current view snapshot (from watch channel, no lock)
pub async fn get_view(State(state): State<Arc<AppState>>) -> Json<ViewSnapshot> {
    let snapshot = state.snapshot_rx.borrow().clone();
    Json(snapshot)
}

/// POST /api/window -- change the strike window size.
/// Out-of-range values are clamped to the slider bounds before reaching the
/// engine; the selector itself has no upper-bound check.
pub async fn set_window(
    State(state): State<Arc<AppState>>,
    Json(body): Json<WindowBody>,
) -> Json<serde_json::Value> {
    let size = body.size.min(MAX_WINDOW_SIZE);
    state.counters.window_updates.fetch_add(1, Ordering::Relaxed);
    match state.engine_tx.send(EngineEvent::WindowSize(size)).await {
        Ok(()) => Json(serde_json::json!({ "window_size": size })),
        Err(e) => Json(serde_json::json!({ "error": format!("engine unavailable: {e}") })),
    }
}

/// POST /api/filter -- change the moneyness mode. Unknown modes fall back
/// to "All".
pub async fn set_filter(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FilterBody>,
) -> Json<serde_json::Value> {
    let mode = Moneyness::parse(&body.mode);
    state.counters.filter_updates.fetch_add(1, Ordering::Relaxed);
    match state.engine_tx.send(EngineEvent::MoneynessMode(mode)).await {
        Ok(()) => Json(serde_json::json!({ "moneyness": mode })),
        Err(e) => Json(serde_json::json!({ "error": format!("engine unavailable: {e}") })),
    }
}

/// POST /api/refresh -- fetch a fresh chain snapshot on demand. Exactly one
/// attempt, refused outright if a fetch is already outstanding; a failure is
/// reported in the reply and leaves the current view untouched.
pub async fn refresh(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    if !state.begin_fetch() {
        return Json(serde_json::json!({ "error": "a fetch is already in flight" }));
    }

    let result = state.chain_client.get_chain().await;
    state.end_fetch();

    match result {
        Ok(records) => {
            let rows = records.len();
            match state.engine_tx.send(EngineEvent::ChainSnapshot(records)).await {
                Ok(()) => Json(serde_json::json!({ "status": "refreshed", "rows": rows })),
                Err(e) => Json(serde_json::json!({ "error": format!("engine unavailable: {e}") })),
            }
        }
        Err(e) => {
            state.counters.fetch_errors.fetch_add(1, Ordering::Relaxed);
            Json(serde_json::json!({ "error": e.to_string() }))
        }
    }
}

/// GET /api/counters -- performance counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    use portable_atomic::Ordering::Relaxed;
    Json(serde_json::json!({
        "events_processed": state.counters.events_processed.load(Relaxed),
        "snapshots_loaded": state.counters.snapshots_loaded.load(Relaxed),
        "window_updates": state.counters.window_updates.load(Relaxed),
        "filter_updates": state.counters.filter_updates.load(Relaxed),
        "fetch_errors": state.counters.fetch_errors.load(Relaxed),
        "ws_messages_sent": state.counters.ws_messages_sent.load(Relaxed),
    }))
}
