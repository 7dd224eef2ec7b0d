//! Identity hook for naming clients in the shared store.
//!
//! The protocol doesn't care where identities come from — only that
//! each client holds a stable opaque ID before touching a session.
//! The [`IdentityProvider`] trait captures that: one async method that
//! resolves to a [`ClientId`] or fails. Production deployments plug in
//! their auth system; tests and local play use [`AnonymousIdentity`],
//! which mints a random ID per sign-in the way anonymous auth
//! providers do.

use quizsync_protocol::ClientId;
use rand::Rng;

use crate::SessionError;

/// Issues the client's identity.
///
/// `Send + Sync + 'static` so a provider can be shared across client
/// tasks for the lifetime of the process.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Resolves this client's identity. Called once per client before
    /// its first session operation; every subsequent write is keyed by
    /// the returned ID.
    ///
    /// # Errors
    /// [`SessionError::IdentityUnavailable`] when no identity can be
    /// issued. Callers must not fall back to a made-up ID.
    fn sign_in(
        &self,
    ) -> impl std::future::Future<Output = Result<ClientId, SessionError>> + Send;
}

/// Anonymous identities: every sign-in mints a fresh random ID.
///
/// 128 bits of entropy, hex-encoded, so two clients can't collide in
/// practice and an ID can't be guessed from outside.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousIdentity;

impl IdentityProvider for AnonymousIdentity {
    async fn sign_in(&self) -> Result<ClientId, SessionError> {
        let mut rng = rand::rng();
        let bytes: [u8; 16] = rng.random();
        let id: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        Ok(ClientId(id))
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_returns_32_hex_chars() {
        let id = AnonymousIdentity.sign_in().await.unwrap();
        assert_eq!(id.0.len(), 32);
        assert!(id.0.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_sign_in_twice_yields_distinct_identities() {
        let a = AnonymousIdentity.sign_in().await.unwrap();
        let b = AnonymousIdentity.sign_in().await.unwrap();
        assert_ne!(a, b);
    }
}
