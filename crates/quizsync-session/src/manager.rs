//! The session manager: creating, joining and leaving sessions.
//!
//! ## Lifecycle
//!
//! ```text
//! create_session() ──→ [Host handle]  ──→ leave_session() ──→ record removed
//! join_session()   ──→ [Player handle] ─→ leave_session() ──→ entry removed
//!                          │
//!                          ▼ (handle dropped without leaving)
//!                     presence hooks fire: connected=false
//!                     (host: status="ended" too)
//! ```
//!
//! The manager is a thin, cheaply clonable front over the store
//! handle; all state lives in the store so any number of clients in
//! any number of tasks can share one manager.

use serde_json::{Map, Value, json};
use tracing::{debug, info};

use quizsync_protocol::{
    ClientId, GameSettings, SessionCode, SessionRecord, paths,
};
use quizsync_store::{ServerValue, StoreError, StoreHandle};

use crate::{Role, SessionError, SessionHandle, presence};

/// Creates and resolves sessions in one shared store.
#[derive(Clone)]
pub struct SessionManager {
    store: StoreHandle,
}

impl SessionManager {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Creates a fresh session and returns the host's handle.
    ///
    /// The code is random; if it collides with a live session the
    /// store rejects the creation and a new code is drawn. The whole
    /// initial record (status `waiting`, the host as sole player)
    /// lands in one atomic creation, so no observer ever sees a
    /// half-built session.
    pub async fn create_session(
        &self,
        client_id: ClientId,
        name: &str,
        settings: GameSettings,
    ) -> Result<SessionHandle, SessionError> {
        self.create_with(&mut SessionCode::generate, client_id, name, settings)
            .await
    }

    /// Creation with a caller-supplied code source, so collision
    /// handling is testable with a deterministic sequence.
    async fn create_with(
        &self,
        next_code: &mut dyn FnMut() -> SessionCode,
        client_id: ClientId,
        name: &str,
        settings: GameSettings,
    ) -> Result<SessionHandle, SessionError> {
        loop {
            let code = next_code();
            let record = initial_record(&code, &client_id, name, &settings)?;
            match self.store.create(&paths::game(&code), record).await {
                Ok(()) => {
                    info!(%code, host = %client_id, "session created");
                    return self.enter(code, client_id, Role::Host).await;
                }
                Err(StoreError::PathExists(_)) => {
                    debug!(%code, "session code taken, drawing another");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Joins an existing session by its code and returns the player's
    /// handle.
    ///
    /// The joinability check and the player write are two separate
    /// store operations; a start racing between them can admit a
    /// player into a game that just began. The player's entry is
    /// complete either way, so the game stays consistent.
    pub async fn join_session(
        &self,
        client_id: ClientId,
        name: &str,
        code_input: &str,
    ) -> Result<SessionHandle, SessionError> {
        let code = SessionCode::parse(code_input)?;
        let snapshot = self.store.read_once(&paths::game(&code)).await?;
        if snapshot == Value::Null {
            return Err(SessionError::SessionNotFound(code));
        }
        let record: SessionRecord = serde_json::from_value(snapshot)?;
        if !record.status.is_joinable() {
            return Err(SessionError::SessionNotJoinable {
                code,
                status: record.status,
            });
        }

        self.store
            .write(&paths::player(&code, &client_id), player_entry(name, false)?)
            .await?;
        info!(%code, player = %client_id, "player joined");
        self.enter(code, client_id, Role::Player).await
    }

    /// Leaves a session gracefully, consuming the handle.
    ///
    /// Hooks are disarmed first, so leaving never marks the departing
    /// client as dropped. A player removes their own entry (scores
    /// and all); the host tears down the entire session, since a
    /// hostless session cannot progress.
    pub async fn leave_session(
        &self,
        handle: SessionHandle,
    ) -> Result<(), SessionError> {
        let (code, client_id, role, store, conn) = handle.into_parts();
        presence::clear(&conn, &code, &client_id, role == Role::Host).await?;
        match role {
            Role::Host => {
                store.remove(&paths::game(&code)).await?;
                info!(%code, "session cancelled by host");
            }
            Role::Player => {
                store.remove(&paths::player(&code, &client_id)).await?;
                info!(%code, player = %client_id, "player left");
            }
        }
        Ok(())
    }

    async fn enter(
        &self,
        code: SessionCode,
        client_id: ClientId,
        role: Role,
    ) -> Result<SessionHandle, SessionError> {
        let conn = self.store.connect().await?;
        presence::register(&conn, &code, &client_id, role == Role::Host).await?;
        Ok(SessionHandle::new(
            code,
            client_id,
            role,
            self.store.clone(),
            conn,
        ))
    }
}

/// A freshly joined player's entry. `joinedAt` resolves to the store's
/// monotonic clock, so join order is recoverable from timestamps.
fn player_entry(name: &str, is_host: bool) -> Result<Value, SessionError> {
    Ok(json!({
        "name": name,
        "characterId": "",
        "score": 0,
        "correctAnswers": 0,
        "isHost": is_host,
        "connected": true,
        "hasAnswered": false,
        "joinedAt": ServerValue::timestamp(),
    }))
}

fn initial_record(
    code: &SessionCode,
    host_id: &ClientId,
    host_name: &str,
    settings: &GameSettings,
) -> Result<Value, SessionError> {
    let mut players = Map::new();
    players.insert(host_id.0.clone(), player_entry(host_name, true)?);
    Ok(json!({
        "code": code.as_str(),
        "hostId": host_id.0,
        "status": "waiting",
        "settings": serde_json::to_value(settings)?,
        "createdAt": ServerValue::timestamp(),
        "players": players,
    }))
}

// =========================================================================
// Tests
// =========================================================================
