use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use herald_core::notification::Notification;
use herald_core::types::RecipientId;
use serde::Serialize;

use crate::middleware::auth::CurrentUser;
use crate::state::AppState;

/// Outbound frame wrapping one pushed notification.
#[derive(Serialize)]
struct NotificationFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    data: &'a Notification,
}

/// GET /api/v1/notifications/ws
///
/// Upgrades to a WebSocket that streams the caller's new notifications as
/// JSON text frames. Notifications created while the socket is not
/// connected are available through the listing endpoints instead.
pub async fn notification_feed(
    user: CurrentUser,
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, user.user_id))
}

/// Manage a single WebSocket session after upgrade.
///
/// Subscribes to the recipient's topic, then:
///   1. Spawns a sender task that forwards the feed and sends pings.
///   2. Processes inbound frames on the current task.
///   3. Releases the subscription on disconnect.
async fn handle_socket(socket: WebSocket, state: AppState, recipient_id: RecipientId) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let (mut feed, release) = state
        .notifications
        .subscribe_to_notifications(&recipient_id);
    tracing::info!(conn_id = %conn_id, recipient = %recipient_id, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();
    let ping_every = Duration::from_secs(state.config.ws_ping_interval_secs);

    let sender_conn_id = conn_id.clone();
    let mut send_task = tokio::spawn(async move {
        let mut ping = tokio::time::interval(ping_every);
        // The first tick completes immediately.
        ping.tick().await;

        loop {
            tokio::select! {
                next = feed.recv() => {
                    let Some(notification) = next else { break };
                    if send_notification(&mut sink, &notification).await.is_err() {
                        tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                        break;
                    }
                }
                _ = ping.tick() => {
                    if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                        tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                        break;
                    }
                }
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut send_task => break,
            incoming = stream.next() => match incoming {
                None | Some(Ok(Message::Close(_))) => break,
                Some(Ok(Message::Pong(_))) => {
                    tracing::trace!(conn_id = %conn_id, "Pong received");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                    break;
                }
            },
        }
    }

    release.release();
    send_task.abort();
    tracing::info!(conn_id = %conn_id, recipient = %recipient_id, "WebSocket disconnected");
}

async fn send_notification(
    sink: &mut SplitSink<WebSocket, Message>,
    notification: &Notification,
) -> Result<(), axum::Error> {
    let frame = NotificationFrame {
        kind: "notification",
        data: notification,
    };
    match serde_json::to_string(&frame) {
        Ok(text) => sink.send(Message::Text(text.into())).await,
        Err(e) => {
            tracing::error!(
                notification_id = %notification.id,
                error = %e,
                "Failed to serialize notification frame"
            );
            Ok(())
        }
    }
}
