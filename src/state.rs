use crate::chain::client::ChainClient;
use crate::chain::types::OptionRecord;
use crate::config::AppConfig;
use crate::view::Moneyness;
use portable_atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

// ── Engine State Machine ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Loading,
    Serving,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Serving => write!(f, "serving"),
        }
    }
}

// ── Messages INTO the engine (bounded channel) ──

#[derive(Debug, Clone)]
pub enum EngineEvent {
    ChainSnapshot(Vec<OptionRecord>),
    WindowSize(usize),
    MoneynessMode(Moneyness),
    Shutdown,
}

// ── Messages OUT of the engine ──

#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type")]
pub enum WsMessage {
    #[serde(rename = "chain_loaded")]
    ChainLoaded { rows: usize, timestamp: String },

    #[serde(rename = "view_update")]
    ViewUpdate {
        window_size: usize,
        moneyness: Moneyness,
        rows: Vec<OptionRecord>,
    },

    #[serde(rename = "engine_state")]
    EngineStateMsg { state: String, reason: String },
}

// ── View snapshot for REST / initial WS payload (sent via watch channel) ──

#[derive(Debug, Clone, serde::Serialize)]
pub struct ViewSnapshot {
    pub engine_state: EngineState,
    pub symbol: String,
    pub reference_price: f64,
    pub window_size: usize,
    pub moneyness: Moneyness,
    pub total_rows: usize,
    pub visible: Vec<OptionRecord>,
    /// Max of percent_return_1_sigma_max_risk across the full snapshot,
    /// for display bar scaling. None before the first fetch.
    pub max_return_over_risk: Option<f64>,
    pub last_update: String,
}

impl ViewSnapshot {
    pub fn initial(config: &AppConfig) -> Self {
        Self {
            engine_state: EngineState::Loading,
            symbol: config.symbol.clone(),
            reference_price: config.reference_price,
            window_size: config.default_window_size,
            moneyness: Moneyness::All,
            total_rows: 0,
            visible: Vec::new(),
            max_return_over_risk: None,
            last_update: String::new(),
        }
    }
}

// ── Performance Counters (lock-free) ──

pub struct PerfCounters {
    pub events_processed: AtomicU64,
    pub snapshots_loaded: AtomicU64,
    pub window_updates: AtomicU64,
    pub filter_updates: AtomicU64,
    pub fetch_errors: AtomicU64,
    pub ws_messages_sent: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            events_processed: AtomicU64::new(0),
            snapshots_loaded: AtomicU64::new(0),
            window_updates: AtomicU64::new(0),
            filter_updates: AtomicU64::new(0),
            fetch_errors: AtomicU64::new(0),
            ws_messages_sent: AtomicU64::new(0),
        }
    }
}

// ── Application shared state (channels, not locks) ──

pub struct AppState {
    pub config: AppConfig,
    pub chain_client: ChainClient,

    // Engine -> server: latest view (watch = single producer, multi consumer)
    pub snapshot_tx: watch::Sender<ViewSnapshot>,
    pub snapshot_rx: watch::Receiver<ViewSnapshot>,

    // Engine -> server: event stream (broadcast for WS clients)
    pub ws_tx: broadcast::Sender<WsMessage>,

    // Server / feed -> engine: bounded event channel
    pub engine_tx: mpsc::Sender<EngineEvent>,

    // Lock-free performance counters
    pub counters: PerfCounters,

    // One snapshot fetch outstanding at a time (startup feed or refresh)
    fetch_in_flight: AtomicBool,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        chain_client: ChainClient,
        engine_tx: mpsc::Sender<EngineEvent>,
    ) -> Arc<Self> {
        let (ws_tx, _) = broadcast::channel(256);
        let (snapshot_tx, snapshot_rx) = watch::channel(ViewSnapshot::initial(&config));

        Arc::new(Self {
            config,
            chain_client,
            snapshot_tx,
            snapshot_rx,
            ws_tx,
            engine_tx,
            counters: PerfCounters::new(),
            fetch_in_flight: AtomicBool::new(false),
        })
    }

    /// Fan a message out to WS clients. Per-client delivery (and the
    /// ws_messages_sent counter) is accounted in the socket handler.
    #[inline]
    pub fn broadcast(&self, msg: WsMessage) {
        let _ = self.ws_tx.send(msg);
    }

    /// Claim the fetch slot. Returns false if a fetch is already running.
    #[inline]
    pub fn begin_fetch(&self) -> bool {
        use portable_atomic::Ordering;
        self.fetch_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[inline]
    pub fn end_fetch(&self) {
        use portable_atomic::Ordering;
        self.fetch_in_flight.store(false, Ordering::Release);
    }
}
