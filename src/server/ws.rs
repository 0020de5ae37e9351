use crate::state::{AppState, ViewSnapshot, WsMessage};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use portable_atomic::Ordering;
use std::sync::Arc;

/// WebSocket endpoint. Every frame a client receives is a tagged
/// `WsMessage`, starting with a `view_update` carrying the rows visible
/// right now, so clients parse a single format for the whole session.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// The opening frame mirrors what a later window or filter change pushes.
fn initial_view_message(snapshot: &ViewSnapshot) -> WsMessage {
    WsMessage::ViewUpdate {
        window_size: snapshot.window_size,
        moneyness: snapshot.moneyness,
        rows: snapshot.visible.clone(),
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.ws_tx.subscribe();

    let opening = initial_view_message(&state.snapshot_rx.borrow());
    if send_frame(&mut sender, &opening, &state).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            broadcast = rx.recv() => {
                use tokio::sync::broadcast::error::RecvError;
                match broadcast {
                    Ok(msg) => {
                        if send_frame(&mut sender, &msg, &state).await.is_err() {
                            break;
                        }
                    }
                    // Client fell behind the broadcast buffer. The view is
                    // last-value semantics, so resync from the watch channel
                    // instead of replaying the missed frames.
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped = skipped, "ws client lagged, resyncing");
                        let resync = initial_view_message(&state.snapshot_rx.borrow());
                        if send_frame(&mut sender, &resync, &state).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {} // Ignore client messages
                }
            }
        }
    }
}

/// Serialize and send one frame, counting each per-client delivery.
async fn send_frame(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &WsMessage,
    state: &Arc<AppState>,
) -> Result<(), ()> {
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    sender.send(Message::Text(json.into())).await.map_err(|_| ())?;
    state
        .counters
        .ws_messages_sent
        .fetch_add(1, Ordering::Relaxed);
    Ok(())
}
