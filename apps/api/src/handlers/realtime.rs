use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use resoluty_application::{RealtimeHub, RealtimeNotification, RealtimeSubscription};
use resoluty_core::AppError;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::{
    DataResponse, EmitRequest, EmitResponse, RealtimeClientMessage, RealtimeServerMessage,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn emit_handler(
    State(state): State<AppState>,
    payload: Result<Json<EmitRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<EmitResponse>>> {
    let Json(payload) = payload?;
    let event = payload
        .event
        .filter(|event| !event.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Event é obrigatório".to_owned()))?;

    let notification =
        RealtimeNotification::new(event, payload.data.unwrap_or(Value::Null), payload.room)?;
    let event = notification.event.clone();
    let room = notification.room.clone();
    let delivered = state.realtime_hub.publish(notification);
    info!(event = %event, room = ?room, delivered, "realtime event emitted");

    Ok(Json(DataResponse::new(EmitResponse { delivered })))
}

pub async fn realtime_socket_handler(
    State(state): State<AppState>,
    upgrade: WebSocketUpgrade,
) -> Response {
    upgrade.on_upgrade(move |socket| serve_realtime_socket(socket, state.realtime_hub))
}

enum SocketStep {
    Notify(Option<RealtimeNotification>),
    Incoming(Option<Result<Message, axum::Error>>),
}

async fn serve_realtime_socket(socket: WebSocket, hub: RealtimeHub) {
    let connection_id = Uuid::new_v4();
    let mut subscription = hub.subscribe();
    let (mut sender, mut receiver) = socket.split();
    info!(
        %connection_id,
        subscribers = hub.subscriber_count(),
        "realtime client connected"
    );

    loop {
        let step = tokio::select! {
            notification = subscription.next() => SocketStep::Notify(notification),
            incoming = receiver.next() => SocketStep::Incoming(incoming),
        };

        match step {
            SocketStep::Notify(None) => break,
            SocketStep::Notify(Some(notification)) => {
                let message = RealtimeServerMessage {
                    event: notification.event,
                    data: notification.data,
                };
                let text = match serde_json::to_string(&message) {
                    Ok(text) => text,
                    Err(error) => {
                        warn!(%connection_id, error = %error, "failed to encode realtime message");
                        continue;
                    }
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            SocketStep::Incoming(Some(Ok(Message::Text(text)))) => {
                apply_client_message(connection_id, &mut subscription, text.as_str());
            }
            SocketStep::Incoming(Some(Ok(Message::Close(_)))) | SocketStep::Incoming(None) => {
                break;
            }
            SocketStep::Incoming(Some(Ok(_))) => {}
            SocketStep::Incoming(Some(Err(error))) => {
                warn!(%connection_id, error = %error, "realtime socket error");
                break;
            }
        }
    }

    info!(%connection_id, "realtime client disconnected");
}

fn apply_client_message(connection_id: Uuid, subscription: &mut RealtimeSubscription, raw: &str) {
    match serde_json::from_str::<RealtimeClientMessage>(raw) {
        Ok(RealtimeClientMessage::JoinRoom { room }) => {
            info!(%connection_id, room = %room, "realtime client joined room");
            subscription.join(room);
        }
        Ok(RealtimeClientMessage::LeaveRoom { room }) => {
            info!(%connection_id, room = %room, "realtime client left room");
            subscription.leave(&room);
        }
        Err(error) => {
            warn!(%connection_id, error = %error, "ignoring malformed realtime client message");
        }
    }
}
