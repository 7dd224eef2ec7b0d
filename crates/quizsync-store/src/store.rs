//! Store actor: a Tokio task that owns the JSON tree.
//!
//! All commands flow through one mpsc channel, so mutations are
//! serialized and watch notifications for a given path are delivered in
//! the order the mutations landed. There is no cross-path atomicity
//! beyond a single [`StoreHandle::update`] batch, which applies every
//! path before any watch fires.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};

use crate::StoreError;
use crate::value::{
    get_at, parent_exists, resolve_server_values, set_at, split_path,
};

/// Identifies one client connection to the store. Disconnect hooks are
/// keyed by this, so one client dropping never fires another's hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Identifies one watch subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

impl std::fmt::Display for WatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

/// Commands sent to the store actor. Fallible operations carry a
/// oneshot reply channel.
enum StoreCommand {
    ReadOnce {
        path: String,
        reply: oneshot::Sender<Result<Value, StoreError>>,
    },
    Create {
        path: String,
        value: Value,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    Write {
        path: String,
        value: Value,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    Update {
        changes: Vec<(String, Value)>,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    Remove {
        path: String,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    Increment {
        path: String,
        delta: i64,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    Watch {
        path: String,
        sender: mpsc::UnboundedSender<Value>,
        reply: oneshot::Sender<Result<WatchId, StoreError>>,
    },
    Unwatch {
        id: WatchId,
    },
    Connect {
        reply: oneshot::Sender<Result<ConnectionId, StoreError>>,
    },
    OnDisconnectSet {
        conn: ConnectionId,
        path: String,
        value: Value,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    OnDisconnectCancel {
        conn: ConnectionId,
        path: String,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    ConnectionClosed {
        conn: ConnectionId,
    },
}

/// Spawns the store actor.
pub struct SharedStore;

impl SharedStore {
    /// Spawns a new, empty store and returns a handle to it. The actor
    /// runs until every handle (and every live watch and connection,
    /// which each hold one) is dropped.
    pub fn spawn() -> StoreHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = StoreActor {
            root: Value::Object(Map::new()),
            watches: Vec::new(),
            hooks: HashMap::new(),
            next_watch_id: 1,
            next_conn_id: 1,
            last_timestamp: 0,
            receiver: rx,
        };
        tokio::spawn(actor.run());
        StoreHandle { sender: tx }
    }
}

/// Handle to a running store actor. Cheap to clone.
#[derive(Clone)]
pub struct StoreHandle {
    sender: mpsc::UnboundedSender<StoreCommand>,
}

impl StoreHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, StoreError>>) -> StoreCommand,
    ) -> Result<T, StoreError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .map_err(|_| StoreError::Closed)?;
        rx.await.map_err(|_| StoreError::Closed)?
    }

    /// Reads the value at `path` once. Missing paths read as null.
    pub async fn read_once(&self, path: &str) -> Result<Value, StoreError> {
        let path = path.to_string();
        self.request(|reply| StoreCommand::ReadOnce { path, reply })
            .await
    }

    /// Writes `value` at `path`, failing with [`StoreError::PathExists`]
    /// if the path already holds a value.
    pub async fn create(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let path = path.to_string();
        self.request(|reply| StoreCommand::Create { path, value, reply })
            .await
    }

    /// Writes `value` at `path`, replacing whatever is there. Writing
    /// null deletes the node.
    pub async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let path = path.to_string();
        self.request(|reply| StoreCommand::Write { path, value, reply })
            .await
    }

    /// Applies a batch of path/value writes as one mutation: watchers
    /// never observe a state where only part of the batch has landed.
    pub async fn update(
        &self,
        changes: Vec<(String, Value)>,
    ) -> Result<(), StoreError> {
        self.request(|reply| StoreCommand::Update { changes, reply })
            .await
    }

    /// Removes the node at `path` (and everything under it).
    pub async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let path = path.to_string();
        self.request(|reply| StoreCommand::Remove { path, reply })
            .await
    }

    /// Atomically adds `delta` to the number at `path` (missing reads
    /// as 0).
    pub async fn increment(&self, path: &str, delta: i64) -> Result<(), StoreError> {
        let path = path.to_string();
        self.request(|reply| StoreCommand::Increment { path, delta, reply })
            .await
    }

    /// Subscribes to the value at `path`. The current value (null if
    /// absent) is delivered immediately, then a snapshot on every
    /// change. Dropping the returned [`Watch`] unsubscribes.
    pub async fn watch(&self, path: &str) -> Result<Watch, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let path = path.to_string();
        let id = self
            .request(|reply| StoreCommand::Watch { path, sender: tx, reply })
            .await?;
        Ok(Watch {
            id,
            receiver: rx,
            handle: self.clone(),
        })
    }

    /// Opens a connection scope for disconnect hooks.
    pub async fn connect(&self) -> Result<StoreConnection, StoreError> {
        let id = self
            .request(|reply| StoreCommand::Connect { reply })
            .await?;
        Ok(StoreConnection {
            id,
            handle: self.clone(),
        })
    }
}

/// A live watch subscription. Receives value snapshots; unsubscribes on
/// drop.
pub struct Watch {
    id: WatchId,
    receiver: mpsc::UnboundedReceiver<Value>,
    handle: StoreHandle,
}

impl Watch {
    /// The subscription's id.
    pub fn id(&self) -> WatchId {
        self.id
    }

    /// Receives the next value snapshot. Returns `None` once the store
    /// is gone.
    pub async fn recv(&mut self) -> Option<Value> {
        self.receiver.recv().await
    }
}

impl Drop for Watch {
    fn drop(&mut self) {
        let _ = self
            .handle
            .sender
            .send(StoreCommand::Unwatch { id: self.id });
    }
}

/// A client's connection scope. Disconnect hooks registered through it
/// run server-side when the connection goes away — including an abrupt
/// drop of this value. Voluntary teardown cancels its hooks first, so
/// the close becomes a no-op.
pub struct StoreConnection {
    id: ConnectionId,
    handle: StoreHandle,
}

impl StoreConnection {
    /// This connection's id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Registers "write `value` at `path` when this connection drops".
    /// Re-registering for the same path replaces the previous hook.
    pub async fn on_disconnect_set(
        &self,
        path: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let conn = self.id;
        let path = path.to_string();
        self.handle
            .request(|reply| StoreCommand::OnDisconnectSet {
                conn,
                path,
                value,
                reply,
            })
            .await
    }

    /// Cancels a pending disconnect hook for `path`. Cancelling a hook
    /// that was never registered is a no-op.
    pub async fn on_disconnect_cancel(&self, path: &str) -> Result<(), StoreError> {
        let conn = self.id;
        let path = path.to_string();
        self.handle
            .request(|reply| StoreCommand::OnDisconnectCancel { conn, path, reply })
            .await
    }
}

impl Drop for StoreConnection {
    fn drop(&mut self) {
        let _ = self
            .handle
            .sender
            .send(StoreCommand::ConnectionClosed { conn: self.id });
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct WatchEntry {
    id: WatchId,
    segs: Vec<String>,
    sender: mpsc::UnboundedSender<Value>,
}

struct Hook {
    segs: Vec<String>,
    path: String,
    value: Value,
}

struct StoreActor {
    root: Value,
    watches: Vec<WatchEntry>,
    /// Pending disconnect hooks per connection, in registration order.
    hooks: HashMap<ConnectionId, Vec<Hook>>,
    next_watch_id: u64,
    next_conn_id: u64,
    /// Last timestamp handed out; server timestamps are strictly
    /// monotonic even when the wall clock does not move between writes.
    last_timestamp: i64,
    receiver: mpsc::UnboundedReceiver<StoreCommand>,
}

impl StoreActor {
    async fn run(mut self) {
        tracing::debug!("store actor started");
        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }
        tracing::debug!("store actor stopped");
    }

    fn handle_command(&mut self, cmd: StoreCommand) {
        match cmd {
            StoreCommand::ReadOnce { path, reply } => {
                let result = split_path(&path).map(|segs| {
                    get_at(&self.root, &segs)
                        .cloned()
                        .unwrap_or(Value::Null)
                });
                let _ = reply.send(result);
            }
            StoreCommand::Create { path, value, reply } => {
                let result = split_path(&path).and_then(|segs| {
                    if get_at(&self.root, &segs).is_some() {
                        return Err(StoreError::PathExists(path.clone()));
                    }
                    self.mutate(|root, now| {
                        let mut value = value;
                        resolve_server_values(&mut value, None, now);
                        set_at(root, &segs, value);
                    });
                    Ok(())
                });
                let _ = reply.send(result);
            }
            StoreCommand::Write { path, value, reply } => {
                let result = split_path(&path).map(|segs| {
                    self.mutate(|root, now| {
                        apply_write(root, &segs, value, now);
                    });
                });
                let _ = reply.send(result);
            }
            StoreCommand::Update { changes, reply } => {
                let mut parsed = Vec::with_capacity(changes.len());
                let mut result = Ok(());
                for (path, value) in changes {
                    match split_path(&path) {
                        Ok(segs) => parsed.push((segs, value)),
                        Err(e) => {
                            result = Err(e);
                            break;
                        }
                    }
                }
                if result.is_ok() {
                    // One mutation: all paths land before any watch fires.
                    self.mutate(|root, now| {
                        for (segs, value) in parsed {
                            apply_write(root, &segs, value, now);
                        }
                    });
                }
                let _ = reply.send(result);
            }
            StoreCommand::Remove { path, reply } => {
                let result = split_path(&path).map(|segs| {
                    self.mutate(|root, _| {
                        set_at(root, &segs, Value::Null);
                    });
                });
                let _ = reply.send(result);
            }
            StoreCommand::Increment { path, delta, reply } => {
                let result = split_path(&path).map(|segs| {
                    self.mutate(|root, _| {
                        let base = get_at(root, &segs)
                            .and_then(Value::as_i64)
                            .unwrap_or(0);
                        set_at(root, &segs, Value::from(base + delta));
                    });
                });
                let _ = reply.send(result);
            }
            StoreCommand::Watch { path, sender, reply } => {
                let result = split_path(&path).map(|segs| {
                    let id = WatchId(self.next_watch_id);
                    self.next_watch_id += 1;
                    // Deliver the current value immediately, like any
                    // later change notification.
                    let current = get_at(&self.root, &segs)
                        .cloned()
                        .unwrap_or(Value::Null);
                    let _ = sender.send(current);
                    self.watches.push(WatchEntry { id, segs, sender });
                    id
                });
                let _ = reply.send(result);
            }
            StoreCommand::Unwatch { id } => {
                self.watches.retain(|w| w.id != id);
            }
            StoreCommand::Connect { reply } => {
                let id = ConnectionId(self.next_conn_id);
                self.next_conn_id += 1;
                self.hooks.insert(id, Vec::new());
                let _ = reply.send(Ok(id));
            }
            StoreCommand::OnDisconnectSet { conn, path, value, reply } => {
                let result = split_path(&path).map(|segs| {
                    let hooks = self.hooks.entry(conn).or_default();
                    hooks.retain(|h| h.path != path);
                    hooks.push(Hook { segs, path, value });
                });
                let _ = reply.send(result);
            }
            StoreCommand::OnDisconnectCancel { conn, path, reply } => {
                if let Some(hooks) = self.hooks.get_mut(&conn) {
                    hooks.retain(|h| h.path != path);
                }
                let _ = reply.send(Ok(()));
            }
            StoreCommand::ConnectionClosed { conn } => {
                self.run_disconnect_hooks(conn);
            }
        }
    }

    /// Runs the pending hooks of a dropped connection, in registration
    /// order. A hook whose target's parent node no longer exists is
    /// skipped: a player that already left must not be resurrected.
    fn run_disconnect_hooks(&mut self, conn: ConnectionId) {
        let Some(hooks) = self.hooks.remove(&conn) else {
            return;
        };
        if !hooks.is_empty() {
            tracing::debug!(%conn, count = hooks.len(), "running disconnect hooks");
        }
        for hook in hooks {
            if !parent_exists(&self.root, &hook.segs) {
                tracing::debug!(%conn, path = %hook.path, "hook target gone, skipping");
                continue;
            }
            self.mutate(|root, now| {
                apply_write(root, &hook.segs, hook.value, now);
            });
        }
    }

    /// Applies one mutation and notifies every watch whose value
    /// changed. Each watch gets at most one notification per mutation.
    fn mutate(&mut self, apply: impl FnOnce(&mut Value, i64)) {
        let now = self.monotonic_now();
        let before: Vec<Option<Value>> = self
            .watches
            .iter()
            .map(|w| get_at(&self.root, &w.segs).cloned())
            .collect();

        apply(&mut self.root, now);

        for (watch, old) in self.watches.iter().zip(before) {
            let new = get_at(&self.root, &watch.segs);
            if new != old.as_ref() {
                let snapshot = new.cloned().unwrap_or(Value::Null);
                let _ = watch.sender.send(snapshot);
            }
        }
        // Forget watches whose receivers are gone.
        self.watches.retain(|w| !w.sender.is_closed());
    }

    fn monotonic_now(&mut self) -> i64 {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        let ts = wall.max(self.last_timestamp + 1);
        self.last_timestamp = ts;
        ts
    }
}

/// One write inside a mutation: resolve sentinels against the existing
/// value at the path, then set (null deletes).
fn apply_write(root: &mut Value, segs: &[String], mut value: Value, now: i64) {
    let existing = get_at(root, segs).cloned();
    resolve_server_values(&mut value, existing.as_ref(), now);
    set_at(root, segs, value);
}
