//! Session lifecycle for QuizSync.
//!
//! This crate gets a client in and out of sessions:
//!
//! 1. **Identity** — each client resolves a stable ID before touching
//!    any session ([`IdentityProvider`] trait, [`AnonymousIdentity`])
//! 2. **Create / join / leave** — code-addressed session records in
//!    the shared store ([`SessionManager`])
//! 3. **Presence** — disconnect hooks that mark a vanished player as
//!    disconnected, and end the game if the host vanishes
//!
//! # How it fits in the stack
//!
//! ```text
//! Game layer (above)   ← drives the quiz through a SessionHandle
//!     ↕
//! Session layer (this crate)  ← membership, roles, presence
//!     ↕
//! Store layer (below)  ← the shared tree all clients watch
//! ```

#![allow(async_fn_in_trait)]

mod error;
mod handle;
mod identity;
mod manager;
mod presence;

pub use error::SessionError;
pub use handle::{Role, SessionHandle};
pub use identity::{AnonymousIdentity, IdentityProvider};
pub use manager::SessionManager;
