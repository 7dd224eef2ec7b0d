//! Shared session store for QuizSync.
//!
//! A path-addressed JSON tree owned by a single Tokio actor task. Every
//! game client holds a cheap-clone [`StoreHandle`] and talks to the tree
//! through commands; the actor serializes all mutations, so observers of
//! any single path see a monotonically consistent sequence of values.
//!
//! The store provides the five primitives the session protocol is built
//! on:
//!
//! - **Reads/writes by path** — `read_once`, `write`, `remove`, plus
//!   `create` which fails if the path is already occupied (used for
//!   session-code collision detection).
//! - **Multi-path updates** — [`StoreHandle::update`] applies a batch of
//!   path/value pairs before any watch fires, so related fields never
//!   tear apart for observers.
//! - **Atomic increment** — counter updates that never lose a
//!   concurrent write, either via [`StoreHandle::increment`] or the
//!   [`ServerValue::increment`] sentinel inside a batch update.
//! - **Watches** — [`StoreHandle::watch`] subscribes to a path and
//!   delivers the current value immediately, then a snapshot on every
//!   change. Dropping the returned [`Watch`] unsubscribes.
//! - **Disconnect hooks** — a client registers "if my connection drops,
//!   write this value at this path" via [`StoreConnection`]; the store
//!   runs the hook itself when the connection goes away, which is the
//!   only mechanism for detecting involuntary disconnects.
//!
//! # Server values
//!
//! Written values may embed [`ServerValue`] sentinels that the actor
//! resolves at apply time: a server-assigned timestamp (strictly
//! monotonic across the store, so two joins never share one) or an
//! increment relative to the value currently stored at that path.

mod error;
mod store;
mod value;

pub use error::StoreError;
pub use store::{
    ConnectionId, SharedStore, StoreConnection, StoreHandle, Watch, WatchId,
};
pub use value::ServerValue;
