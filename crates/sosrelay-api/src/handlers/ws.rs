//! WebSocket upgrade handler.
//!
//! Each socket gets a writer task draining the connection's bounded
//! outbound queue, a heartbeat task, and a reader loop on the upgrade
//! task. All three stop when the connection's cancellation token fires,
//! which happens on client close, heartbeat timeout, slow-consumer
//! disconnect, or server shutdown.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{error, info, warn};

use sosrelay_realtime::connection::heartbeat::run_heartbeat;
use sosrelay_realtime::message::serializer::serialize_envelope;

use crate::state::AppState;

const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// GET /ws
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_ws_connection(state, socket))
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(state: AppState, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let engine = state.realtime.clone();

    let (handle, mut outbound_rx) = engine.connections.register();
    let conn_id = handle.id;
    let cancel = handle.cancellation();

    let heartbeat_task = tokio::spawn(run_heartbeat(handle.clone(), engine.heartbeat_config()));

    let writer_cancel = cancel.clone();
    let outbound_task = tokio::spawn(async move {
        loop {
            let envelope = tokio::select! {
                _ = writer_cancel.cancelled() => break,
                next = outbound_rx.recv() => match next {
                    Some(envelope) => envelope,
                    None => break,
                },
            };

            let text = match serialize_envelope(&envelope) {
                Ok(text) => text,
                Err(e) => {
                    error!(
                        conn_id = %conn_id,
                        kind = envelope.kind(),
                        error = %e,
                        "Failed to serialize outbound message"
                    );
                    continue;
                }
            };

            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = ws_rx.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => {
                engine.handle_inbound(&conn_id, text.as_str()).await;
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Cleanup
    handle.mark_dead();
    engine.connections.unregister(&conn_id);
    heartbeat_task.abort();
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, outbound_task)
        .await
        .is_err()
    {
        warn!(conn_id = %conn_id, "Outbound writer did not stop in time");
    }

    info!(conn_id = %conn_id, "WebSocket connection closed");
}
