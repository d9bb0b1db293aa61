//! WebSocket upgrade handler

use std::ops::ControlFlow;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler. No authentication: every socket gets a fresh id.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (ws_sink, ws_stream) = socket.split();

    let (conn_id, outbound_rx) = open_connection(&state);
    let writer_handle = tokio::spawn(write_loop(conn_id, ws_sink, outbound_rx));

    read_loop(conn_id, ws_stream, &state).await;

    close_connection(conn_id, &state).await;
    writer_handle.abort();
}

/// Register a fresh connection and queue its `welcome`
fn open_connection(state: &AppState) -> (Uuid, mpsc::UnboundedReceiver<ServerMsg>) {
    let conn_id = Uuid::new_v4();
    let outbound_rx = state.connections.register(conn_id);
    info!(conn_id = %conn_id, connections = state.connections.len(), "New WebSocket connection");

    state.connections.send(
        &conn_id,
        ServerMsg::Welcome {
            id: conn_id,
            server_time: unix_millis(),
        },
    );

    (conn_id, outbound_rx)
}

/// Stop routing to this socket, then let the relay announce the departure
async fn close_connection(conn_id: Uuid, state: &AppState) {
    let connected_secs = state
        .connections
        .unregister(&conn_id)
        .map(|handle| handle.connected_at.elapsed().as_secs())
        .unwrap_or_default();

    if !state.relay.disconnect(conn_id).await {
        warn!(conn_id = %conn_id, "Relay stopped before disconnect was recorded");
    }

    info!(conn_id = %conn_id, connected_secs, "WebSocket connection closed");
}

/// Outbound queue -> WebSocket
async fn write_loop(
    conn_id: Uuid,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::UnboundedReceiver<ServerMsg>,
) {
    while let Some(msg) = outbound_rx.recv().await {
        if let Err(e) = send_msg(&mut ws_sink, &msg).await {
            debug!(conn_id = %conn_id, error = %e, "WebSocket send failed");
            break;
        }
    }
}

/// WebSocket -> relay
async fn read_loop(conn_id: Uuid, mut ws_stream: SplitStream<WebSocket>, state: &AppState) {
    while let Some(result) = ws_stream.next().await {
        let frame = match result {
            Ok(frame) => frame,
            Err(e) => {
                error!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        };

        if handle_frame(conn_id, frame, state).is_break() {
            break;
        }
    }
}

/// Act on one inbound frame. Rejected text frames are answered with an
/// `error` to the sender only.
fn handle_frame(conn_id: Uuid, frame: Message, state: &AppState) -> ControlFlow<()> {
    match frame {
        Message::Text(text) => match ClientMsg::parse(&text) {
            Ok(msg) => {
                if !state.relay.message(conn_id, msg) {
                    debug!(conn_id = %conn_id, "Relay channel closed");
                    return ControlFlow::Break(());
                }
            }
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "Rejected client message");
                state.connections.send(
                    &conn_id,
                    ServerMsg::Error {
                        code: e.code().to_string(),
                        message: e.to_string(),
                    },
                );
            }
        },
        Message::Binary(_) => {
            warn!(conn_id = %conn_id, "Received binary message, ignoring");
        }
        Message::Ping(_) | Message::Pong(_) => {}
        Message::Close(_) => {
            info!(conn_id = %conn_id, "Client initiated close");
            return ControlFlow::Break(());
        }
    }

    ControlFlow::Continue(())
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> anyhow::Result<()> {
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}
