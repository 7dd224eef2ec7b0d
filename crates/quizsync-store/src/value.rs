//! Tree operations on the store's JSON value, plus server-value
//! sentinels.
//!
//! Paths are slash-delimited (`games/ABC234/players/u1/score`). Writing
//! `Value::Null` at a path deletes the node — clients clear fields by
//! writing null in a batch update, exactly like they set them.

use serde_json::{Map, Value, json};

use crate::StoreError;

/// Builders for values the store fills in server-side at apply time.
///
/// A sentinel is an object of the shape `{".sv": ...}` embedded anywhere
/// inside a written value. The actor resolves it against the value
/// currently stored at the same path before the write lands, so the
/// client never has to read-modify-write.
pub struct ServerValue;

impl ServerValue {
    /// A server-assigned timestamp in milliseconds. Timestamps are
    /// strictly monotonic across the whole store: two writes never
    /// resolve to the same value, which keeps join order unambiguous.
    pub fn timestamp() -> Value {
        json!({ ".sv": "timestamp" })
    }

    /// Adds `delta` to the number currently stored at the target path
    /// (missing or non-numeric counts as 0). Applied inside the actor,
    /// so concurrent increments from different clients never lose
    /// updates.
    pub fn increment(delta: i64) -> Value {
        json!({ ".sv": { "increment": delta } })
    }
}

/// Splits a path into segments, rejecting empty paths and empty
/// segments (`"a//b"`, `"/a"`).
pub(crate) fn split_path(path: &str) -> Result<Vec<String>, StoreError> {
    if path.is_empty() {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    let segs: Vec<String> = path.split('/').map(str::to_string).collect();
    if segs.iter().any(String::is_empty) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(segs)
}

/// Returns the value at the path, or `None` if any segment is missing.
pub(crate) fn get_at<'a>(root: &'a Value, segs: &[String]) -> Option<&'a Value> {
    let mut cur = root;
    for seg in segs {
        cur = cur.as_object()?.get(seg)?;
    }
    Some(cur)
}

/// Writes `value` at the path, creating intermediate objects as needed.
/// A null `value` deletes the node instead.
pub(crate) fn set_at(root: &mut Value, segs: &[String], value: Value) {
    if value.is_null() {
        remove_at(root, segs);
        return;
    }
    let (last, parents) = segs.split_last().expect("split_path rejects empty paths");
    let mut cur = root;
    for seg in parents {
        if !cur.is_object() {
            *cur = Value::Object(Map::new());
        }
        cur = cur
            .as_object_mut()
            .expect("just ensured object")
            .entry(seg.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if !cur.is_object() {
        *cur = Value::Object(Map::new());
    }
    cur.as_object_mut()
        .expect("just ensured object")
        .insert(last.clone(), value);
}

/// Removes the node at the path. Missing paths are a no-op.
pub(crate) fn remove_at(root: &mut Value, segs: &[String]) {
    let (last, parents) = segs.split_last().expect("split_path rejects empty paths");
    let mut cur = root;
    for seg in parents {
        cur = match cur.as_object_mut().and_then(|m| m.get_mut(seg)) {
            Some(next) => next,
            None => return,
        };
    }
    if let Some(map) = cur.as_object_mut() {
        map.remove(last);
    }
}

/// Returns `true` if the parent of the path exists (a path with a single
/// segment always has a parent: the root). Disconnect hooks check this
/// so a hook firing after its target was removed does not resurrect it.
pub(crate) fn parent_exists(root: &Value, segs: &[String]) -> bool {
    let (_, parents) = segs.split_last().expect("split_path rejects empty paths");
    parents.is_empty() || get_at(root, parents).is_some()
}

/// Recursively replaces server-value sentinels inside `value`.
///
/// `existing` is the value currently stored at the corresponding path,
/// used as the base for increments.
pub(crate) fn resolve_server_values(
    value: &mut Value,
    existing: Option<&Value>,
    now_ms: i64,
) {
    if let Some(resolved) = resolve_sentinel(value, existing, now_ms) {
        *value = resolved;
        return;
    }
    if let Some(obj) = value.as_object_mut() {
        for (key, child) in obj.iter_mut() {
            let prior = existing.and_then(|e| e.get(key));
            resolve_server_values(child, prior, now_ms);
        }
    }
}

fn resolve_sentinel(
    value: &Value,
    existing: Option<&Value>,
    now_ms: i64,
) -> Option<Value> {
    let obj = value.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    let sv = obj.get(".sv")?;
    if sv == "timestamp" {
        return Some(json!(now_ms));
    }
    if let Some(delta) = sv.get("increment").and_then(Value::as_i64) {
        let base = existing.and_then(Value::as_i64).unwrap_or(0);
        return Some(json!(base + delta));
    }
    None
}

// =========================================================================
// Tests
// =========================================================================
