//! Per-connection handler: credential check, hub registration, relay loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Extract bearer token from the handshake → verify → UserId
//!   2. Register with the hub (the `connected` ack arrives through the
//!      outbound channel like any other frame)
//!   3. Loop: relay hub frames out, route client frames in
//!   4. On any exit the guard hands cleanup to the hub

use std::sync::Arc;

use huddle_auth::{extract_bearer, Authenticator};
use huddle_hub::HubHandle;
use huddle_protocol::{event, now_millis, ClientCommand, Codec, ConnectionId, Frame, UserId};
use huddle_transport::{Connection, WebSocketConnection};
use serde_json::json;
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::state::ConnPhase;
use crate::GatewayError;

/// Drop guard that unregisters a connection when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since
/// `Drop` is synchronous, the async unregister goes out as a
/// fire-and-forget task.
struct CleanupGuard {
    conn: ConnectionId,
    hub: HubHandle,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let hub = self.hub.clone();
        let conn = self.conn;
        tokio::spawn(async move {
            let _ = hub.unregister(conn).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A, C>>,
) -> Result<(), GatewayError>
where
    A: Authenticator,
    C: Codec,
{
    let conn_id = conn.id();
    let mut phase = ConnPhase::Connecting;
    tracing::debug!(%conn_id, phase = %phase, "handling new connection");

    // --- Step 1: authenticate from handshake credentials ---
    let user = match authenticate(&conn, &state).await {
        Ok(user) => user,
        Err(e) => {
            // Rejected connections never touch shared state; close
            // the socket and let the accept loop log the reason.
            tracing::warn!(%conn_id, error = %e, "rejecting unauthenticated connection");
            let _ = conn.close().await;
            return Err(e);
        }
    };
    phase = ConnPhase::Authenticated;
    tracing::info!(%conn_id, user = %user, phase = %phase, "connection authenticated");

    // --- Step 2: register with the hub ---
    let (tx, mut outbound) = mpsc::unbounded_channel();
    state.hub.register(conn_id, user.clone(), tx).await?;
    let _guard = CleanupGuard {
        conn: conn_id,
        hub: state.hub.clone(),
    };
    phase = ConnPhase::Active;

    // --- Step 3: relay loop ---
    while phase.is_active() {
        tokio::select! {
            frame = outbound.recv() => {
                match frame {
                    Some(frame) => {
                        let bytes = state.codec.encode(&frame)?;
                        conn.send(&bytes).await?;
                    }
                    // Hub dropped our channel; nothing more will come.
                    None => phase = ConnPhase::Disconnected,
                }
            }
            inbound = conn.recv() => {
                match inbound {
                    Ok(Some(data)) => {
                        handle_frame(&state, conn_id, &user, &data).await?;
                    }
                    Ok(None) => {
                        tracing::info!(%conn_id, user = %user, "connection closed");
                        phase = ConnPhase::Disconnected;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, user = %user, error = %e, "recv error");
                        phase = ConnPhase::Disconnected;
                    }
                }
            }
        }
    }

    // _guard drops here → hub unregister fires.
    Ok(())
}

/// Pulls the bearer token out of the handshake and verifies it.
async fn authenticate<A, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<A, C>>,
) -> Result<UserId, GatewayError>
where
    A: Authenticator,
    C: Codec,
{
    let token = extract_bearer(conn.handshake())?;
    let claims = state.auth.authenticate(token).await?;
    Ok(claims.user_id())
}

/// Decodes and routes one inbound frame.
///
/// Undecodable bytes and unroutable events are swallowed here (the
/// connection stays up); hub failures propagate and end the handler.
async fn handle_frame<A, C>(
    state: &Arc<ServerState<A, C>>,
    conn_id: ConnectionId,
    user: &UserId,
    data: &[u8],
) -> Result<(), GatewayError>
where
    A: Authenticator,
    C: Codec,
{
    let frame: Frame = match state.codec.decode(data) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(%conn_id, user = %user, error = %e, "failed to decode frame");
            return Ok(());
        }
    };

    let Some(cmd) = state.router.dispatch(frame) else {
        return Ok(());
    };

    match cmd {
        ClientCommand::Join { scope, id } => {
            state.hub.join(conn_id, scope.room(&id)).await?;
        }
        ClientCommand::Leave { scope, id } => {
            state.hub.leave(conn_id, scope.room(&id)).await?;
        }
        ClientCommand::Typing {
            room,
            field,
            is_typing,
        } => {
            // The client does not name itself; the authenticated user
            // id is stamped here so typing cannot be spoofed.
            let frame = Frame::new(
                event::TYPING,
                json!({
                    "userId": user,
                    "roomName": room,
                    "field": field,
                    "isTyping": is_typing,
                    "timestamp": now_millis(),
                }),
            );
            state
                .hub
                .broadcast_to_room(room, frame, Some(user.clone()))
                .await?;
        }
    }

    Ok(())
}
