//! The per-client session handle.

use serde_json::Value;

use quizsync_protocol::{ClientId, SessionCode, SessionRecord, paths};
use quizsync_store::{StoreConnection, StoreHandle};

use crate::SessionError;

/// What this client is allowed to drive.
///
/// The role is fixed when the handle is created — creating a session
/// makes you [`Role::Host`], joining one makes you [`Role::Player`] —
/// and host-only operations check it explicitly instead of inferring
/// it from the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Created the session. Drives progression: start, advance, reset.
    Host,
    /// Joined an existing session. Answers and picks characters only.
    Player,
}

/// One client's membership in one session.
///
/// Owns the client's store connection; dropping the handle without
/// leaving first counts as an abrupt disconnect, and the presence
/// hooks registered at join time fire.
pub struct SessionHandle {
    code: SessionCode,
    client_id: ClientId,
    role: Role,
    store: StoreHandle,
    conn: StoreConnection,
}

impl SessionHandle {
    pub(crate) fn new(
        code: SessionCode,
        client_id: ClientId,
        role: Role,
        store: StoreHandle,
        conn: StoreConnection,
    ) -> Self {
        Self {
            code,
            client_id,
            role,
            store,
            conn,
        }
    }

    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_host(&self) -> bool {
        self.role == Role::Host
    }

    /// Guard for host-only operations.
    pub fn require_host(&self) -> Result<(), SessionError> {
        if self.is_host() {
            Ok(())
        } else {
            Err(SessionError::NotHost)
        }
    }

    /// The store this session lives in.
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// This client's store connection (carrier of its presence hooks).
    pub fn connection(&self) -> &StoreConnection {
        &self.conn
    }

    /// Reads and decodes the current session record.
    ///
    /// # Errors
    /// [`SessionError::SessionNotFound`] if the record has been removed
    /// since this handle was created (the host cancelled the session).
    pub async fn read_record(&self) -> Result<SessionRecord, SessionError> {
        let snapshot = self.store.read_once(&paths::game(&self.code)).await?;
        if snapshot == Value::Null {
            return Err(SessionError::SessionNotFound(self.code.clone()));
        }
        Ok(serde_json::from_value(snapshot)?)
    }

    pub(crate) fn into_parts(self) -> (SessionCode, ClientId, Role, StoreHandle, StoreConnection) {
        (self.code, self.client_id, self.role, self.store, self.conn)
    }
}
