//! WebSocket transport.
//!
//! Each socket gets a reader loop that decodes frames and forwards them to
//! the hub, plus a writer task that drains the connection's outbox.

use crate::hub::HubHandle;
use crate::invite::InviteCode;
use crate::protocol::ClientMessage;
use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, Request, State};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tracing::{debug, info, instrument, warn};

/// Query parameters accepted on the WebSocket route.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// Invite code from a shared link; joins that private entry on connect.
    pub invite: Option<String>,
}

impl ConnectParams {
    /// The invite code, ignoring blanks.
    pub fn invite_code(&self) -> Option<InviteCode> {
        self.invite
            .as_deref()
            .map(InviteCode::parse)
            .filter(|code| !code.as_str().is_empty())
    }
}

/// Builds the HTTP router: `/ws` for game traffic, `/health` for probes.
pub fn router(hub: HubHandle) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(ServiceBuilder::new().map_request(log_request))
        .with_state(hub)
}

fn log_request(req: Request) -> Request {
    debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
    req
}

async fn health() -> &'static str {
    "ok"
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(hub): State<HubHandle>,
) -> impl IntoResponse {
    let invite = params.invite_code();
    ws.on_upgrade(move |socket| handle_socket(socket, hub, invite))
}

#[instrument(skip(socket, hub))]
async fn handle_socket(socket: WebSocket, hub: HubHandle, invite: Option<InviteCode>) {
    let (outbox, mut outbound) = mpsc::unbounded_channel();
    let conn = match hub.connect(outbox, invite).await {
        Ok(conn) => conn,
        Err(e) => {
            warn!(error = %e, "Could not register connection");
            return;
        }
    };
    info!(%conn, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let text = match message.encode() {
                Ok(text) => text,
                Err(e) => {
                    warn!(%conn, error = %e, "Failed to encode outbound message");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                debug!(%conn, "Socket closed while sending");
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match ClientMessage::decode(text.as_str()) {
                Ok(message) => {
                    if hub.inbound(conn, message).is_err() {
                        warn!(%conn, "Hub stopped, closing socket");
                        break;
                    }
                }
                Err(e) => debug!(%conn, error = %e, "Dropping malformed frame"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(%conn, error = %e, "WebSocket error");
                break;
            }
        }
    }

    if hub.disconnect(conn).is_err() {
        debug!(%conn, "Hub already stopped");
    }
    writer.abort();
    info!(%conn, "WebSocket disconnected");
}
