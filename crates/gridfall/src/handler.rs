//! Per-connection handler: decode inbound actions, pump outbound
//! events.
//!
//! Each accepted connection gets its own task running
//! [`handle_connection`], plus a writer task that drains the router's
//! events to the socket. The handler does no game logic and holds no
//! game state — everything goes through the router.

use std::sync::Arc;

use gridfall_protocol::{ClientAction, Codec, JsonCodec, PlayerId};
use gridfall_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::GridfallError;
use crate::router::RouterHandle;

/// Drop guard that detaches the player from the router when the
/// handler exits, even if it exits by panic. `Drop` is synchronous, so
/// the notification is a fire-and-forget task.
struct DisconnectGuard {
    player: PlayerId,
    router: RouterHandle,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let player = self.player;
        let router = self.router.clone();
        tokio::spawn(async move {
            let _ = router.disconnect(player).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    router: RouterHandle,
    codec: JsonCodec,
) -> Result<(), GridfallError> {
    // The connection id IS the player's ephemeral handle.
    let player = PlayerId(conn.id().into_inner());
    let conn = Arc::new(conn);
    tracing::debug!(%player, "handling new connection");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    router.connect(player, event_tx).await?;
    let _guard = DisconnectGuard { player, router: router.clone() };

    // Writer: drains router events to the socket. Ends when the router
    // drops the sender on disconnect or the socket breaks.
    let writer_conn = Arc::clone(&conn);
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let bytes = match codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(%player, error = %e, "failed to encode event");
                    continue;
                }
            };
            if writer_conn.send(&bytes).await.is_err() {
                break;
            }
        }
    });

    // Reader: decode actions and forward them. A frame that does not
    // parse is skipped, never fatal.
    loop {
        match conn.recv().await {
            Ok(Some(data)) => {
                match codec.decode::<ClientAction>(&data) {
                    Ok(action) => router.action(player, action).await?,
                    Err(e) => {
                        tracing::debug!(%player, error = %e, "failed to decode action");
                    }
                }
            }
            Ok(None) => {
                tracing::info!(%player, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%player, error = %e, "recv error");
                break;
            }
        }
    }

    // _guard drops here → router disconnect fires.
    Ok(())
}
