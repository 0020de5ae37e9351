mod chain;
mod config;
mod errors;
mod server;
mod state;
mod view;

use crate::chain::client::ChainClient;
use crate::state::*;
use crate::view::ChainView;
use portable_atomic::Ordering;
use smallvec::SmallVec;
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    // Structured logging (stderr, env-filtered)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("strikeview starting");

    // Load config
    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    // Create bounded event channel
    let (engine_tx, engine_rx) = mpsc::channel::<EngineEvent>(64);

    let chain_client = ChainClient::new(&cfg.chain_api_base_url);

    // Create shared state
    let app_state = AppState::new(cfg.clone(), chain_client.clone(), engine_tx.clone());

    // ── Spawn tasks ──

    // 1. Chain feed task (one fetch per session, retried until it lands)
    let feed_state = app_state.clone();
    tokio::spawn(async move {
        chain::feed::run_chain_feed(feed_state).await;
    });

    // 2. Shutdown signal
    let shutdown_tx = engine_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(EngineEvent::Shutdown).await;
        }
    });

    // 3. Engine task (owns the view, processes events serially)
    let engine_state = app_state.clone();
    let engine_cfg = cfg.clone();
    tokio::spawn(async move {
        run_engine(engine_state, engine_cfg, engine_rx).await;
    });

    // 4. Axum HTTP + WS server
    let server_state = app_state.clone();
    let port = cfg.server_port;

    let app = axum::Router::new()
        .route("/api/view", axum::routing::get(server::routes::get_view))
        .route("/api/window", axum::routing::post(server::routes::set_window))
        .route("/api/filter", axum::routing::post(server::routes::set_filter))
        .route("/api/refresh", axum::routing::post(server::routes::refresh))
        .route("/api/counters", axum::routing::get(server::routes::get_counters))
        .route("/ws", axum::routing::get(server::ws::ws_handler))
        .fallback_service(
            tower_http::services::ServeDir::new("dashboard/dist")
                .fallback(tower_http::services::ServeFile::new("dashboard/dist/index.html")),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(server_state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}

/// Core engine loop. Owns the chain view; each event is applied to completion
/// before the next is read, so there is never a half-updated view in flight.
async fn run_engine(
    state: Arc<AppState>,
    config: config::AppConfig,
    mut rx: mpsc::Receiver<EngineEvent>,
) {
    tracing::info!(
        symbol = %config.symbol,
        reference_price = config.reference_price,
        "engine task started"
    );

    let mut view = ChainView::new(config.reference_price, config.default_window_size);
    let mut engine_state = EngineState::Loading;

    while let Some(event) = rx.recv().await {
        state.counters.events_processed.fetch_add(1, Ordering::Relaxed);

        let shutdown = matches!(event, EngineEvent::Shutdown);
        let messages = apply_event(event, &mut view, &mut engine_state, &state);

        for msg in messages {
            state.broadcast(msg);
        }

        publish_snapshot(&state, &config, &view, engine_state);

        if shutdown {
            break;
        }
    }

    tracing::info!("engine task shutting down");
}

/// Apply one event to the view. Pure state transition plus the WS messages
/// it should produce; channel sends stay in the caller.
fn apply_event(
    event: EngineEvent,
    view: &mut ChainView,
    engine_state: &mut EngineState,
    state: &Arc<AppState>,
) -> SmallVec<[WsMessage; 4]> {
    let mut messages: SmallVec<[WsMessage; 4]> = SmallVec::new();

    match event {
        EngineEvent::ChainSnapshot(records) => {
            state.counters.snapshots_loaded.fetch_add(1, Ordering::Relaxed);
            let rows = records.len();
            view.on_snapshot(records);

            if *engine_state == EngineState::Loading {
                *engine_state = EngineState::Serving;
                tracing::info!(rows = rows, "first snapshot received, entering Serving");
                messages.push(WsMessage::EngineStateMsg {
                    state: "serving".into(),
                    reason: "first snapshot received".into(),
                });
            } else {
                tracing::info!(rows = rows, "snapshot replaced");
            }

            messages.push(WsMessage::ChainLoaded {
                rows,
                timestamp: chrono::Utc::now().to_rfc3339(),
            });
            messages.push(view_update(view));
        }

        EngineEvent::WindowSize(size) => {
            view.on_window_size_changed(size);
            tracing::debug!(window_size = size, visible = view.visible().len(), "window resized");
            messages.push(view_update(view));
        }

        EngineEvent::MoneynessMode(mode) => {
            view.on_moneyness_changed(mode);
            tracing::debug!(moneyness = %mode, visible = view.visible().len(), "filter changed");
            messages.push(view_update(view));
        }

        EngineEvent::Shutdown => {
            tracing::info!("shutdown event received");
        }
    }

    messages
}

fn view_update(view: &ChainView) -> WsMessage {
    WsMessage::ViewUpdate {
        window_size: view.window_size(),
        moneyness: view.moneyness(),
        rows: view.visible().to_vec(),
    }
}

fn publish_snapshot(
    state: &Arc<AppState>,
    config: &config::AppConfig,
    view: &ChainView,
    engine_state: EngineState,
) {
    let snapshot = ViewSnapshot {
        engine_state,
        symbol: config.symbol.clone(),
        reference_price: config.reference_price,
        window_size: view.window_size(),
        moneyness: view.moneyness(),
        total_rows: view.snapshot_len(),
        visible: view.visible().to_vec(),
        max_return_over_risk: view.max_return_over_risk(),
        last_update: chrono::Utc::now().to_rfc3339(),
    };
    let _ = state.snapshot_tx.send(snapshot);
}
