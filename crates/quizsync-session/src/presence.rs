//! Presence hooks: what the store does to a player's record when
//! their connection dies.
//!
//! Registered immediately after a client lands in a session:
//! - every player arms `players/{id}/connected = false`;
//! - the host additionally arms `status = "ended"`, because a session
//!   whose host vanishes cannot progress and must not leave the
//!   remaining players waiting forever.
//!
//! A graceful leave clears the hooks first, so an orderly departure
//! never ends the game for everyone else.

use serde_json::json;
use tracing::debug;

use quizsync_protocol::{ClientId, SessionCode, paths};
use quizsync_store::{StoreConnection, StoreError};

/// Arms the disconnect hooks for a client that just entered `code`.
pub(crate) async fn register(
    conn: &StoreConnection,
    code: &SessionCode,
    client_id: &ClientId,
    is_host: bool,
) -> Result<(), StoreError> {
    conn.on_disconnect_set(&paths::player_connected(code, client_id), json!(false))
        .await?;
    if is_host {
        conn.on_disconnect_set(&paths::status(code), json!("ended"))
            .await?;
    }
    debug!(%code, %client_id, is_host, "presence hooks armed");
    Ok(())
}

/// Disarms the hooks before a graceful departure.
pub(crate) async fn clear(
    conn: &StoreConnection,
    code: &SessionCode,
    client_id: &ClientId,
    is_host: bool,
) -> Result<(), StoreError> {
    conn.on_disconnect_cancel(&paths::player_connected(code, client_id))
        .await?;
    if is_host {
        conn.on_disconnect_cancel(&paths::status(code)).await?;
    }
    debug!(%code, %client_id, "presence hooks cleared");
    Ok(())
}
