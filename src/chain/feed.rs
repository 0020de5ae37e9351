use crate::state::{AppState, EngineEvent};
use portable_atomic::Ordering;
use std::sync::Arc;

/// Startup chain feed. Fetches the snapshot once, retrying with capped
/// backoff until it succeeds, then hands it to the engine and exits.
/// The in-flight slot is shared with the refresh endpoint, so at most one
/// request is ever outstanding against the source.
pub async fn run_chain_feed(state: Arc<AppState>) {
    tracing::info!("chain feed started");

    let mut consecutive_errors: u32 = 0;

    loop {
        if !state.begin_fetch() {
            // A refresh request holds the slot; check back shortly.
            tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
            continue;
        }

        let result = state.chain_client.get_chain().await;
        state.end_fetch();

        match result {
            Ok(records) => {
                tracing::info!(rows = records.len(), "chain snapshot fetched");

                if state
                    .engine_tx
                    .send(EngineEvent::ChainSnapshot(records))
                    .await
                    .is_err()
                {
                    tracing::error!("engine channel closed, chain feed shutting down");
                }
                return;
            }
            Err(e) => {
                consecutive_errors += 1;
                state.counters.fetch_errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    error = %e,
                    consecutive = consecutive_errors,
                    "chain snapshot fetch failed"
                );

                // Exponential backoff on repeated failures (cap at 30s)
                let backoff = std::cmp::min(consecutive_errors * 2, 30);
                tokio::time::sleep(tokio::time::Duration::from_secs(backoff as u64)).await;
            }
        }
    }
}
