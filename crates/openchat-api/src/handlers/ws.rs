//! WebSocket upgrade handler for live rooms.
//!
//! The upgrade itself never rejects: session and room-key problems are
//! reported in-band as a single error frame after the socket opens, then
//! the socket closes. That keeps the join protocol observable to clients
//! instead of burying it in HTTP status codes.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use tracing::{info, warn};

use openchat_realtime::ChatFrame;

use crate::state::AppState;

/// GET /rooms/{room_key}/live — WebSocket upgrade into a chat room.
pub async fn room_live(
    State(state): State<AppState>,
    Path(room_key): Path<String>,
    jar: CookieJar,
    ws: WebSocketUpgrade,
) -> Response {
    let session = jar
        .get(state.sessions.cookie_name())
        .map(|c| c.value().to_string());

    // Friendly room name when the key matches a channel. Lookup failures
    // must not block the join; unknown keys still open rooms lazily.
    let room_name = match state.channels.find_by_slug(&room_key).await {
        Ok(channel) => channel.map(|c| c.name),
        Err(_) => None,
    };

    ws.on_upgrade(move |socket| drive_room_socket(state, socket, session, room_key, room_name))
}

/// Runs one room socket from join to teardown.
async fn drive_room_socket(
    state: AppState,
    socket: WebSocket,
    session: Option<String>,
    raw_key: String,
    room_name: Option<String>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let manager = &state.manager;

    // The manager enforces the handshake deadline itself; an outer
    // timeout could cancel the join after admission and strand the
    // member in the room.
    let admitted = manager
        .join(session.as_deref(), &raw_key, room_name.as_deref())
        .await;

    let (joined, mut outbound_rx) = match admitted {
        Ok(pair) => pair,
        Err(rejection) => {
            send_terminal_frame(&mut ws_tx, &rejection.to_frame()).await;
            return;
        }
    };

    manager.complete_join(&joined).await;

    let conn_id = joined.handle.id;

    // Outbound forwarder: drains the connection's queue onto the socket.
    let outbound = tokio::spawn(async move {
        while let Some(text) = outbound_rx.recv().await {
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Inbound loop: one reader per socket preserves per-connection order.
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => {
                manager.handle_frame(&joined, text.as_str()).await;
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "WebSocket transport error");
                break;
            }
        }
    }

    outbound.abort();
    manager.finish(&joined).await;

    info!(conn_id = %conn_id, room = %joined.room.key, "WebSocket connection closed");
}

/// Sends one frame, then closes. Used for every pre-join failure.
async fn send_terminal_frame(ws_tx: &mut SplitSink<WebSocket, Message>, frame: &ChatFrame) {
    if let Ok(text) = frame.to_text() {
        let _ = ws_tx.send(Message::Text(text.into())).await;
    }
    let _ = ws_tx.close().await;
}
