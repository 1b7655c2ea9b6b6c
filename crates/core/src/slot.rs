//! Durable key-value slot used to persist shopper state between sessions.
//!
//! Stores never hold the slot open: each mutation performs one `write` and
//! hydration performs one `read`. Values are JSON snapshots of the shape
//! `{"state":{"items":[...]},"version":0}`.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Snapshot format version written alongside the items.
pub const SNAPSHOT_VERSION: u32 = 0;

/// Errors raised by a [`DurableSlot`] implementation.
#[derive(Debug, Error)]
pub enum SlotError {
    /// Underlying storage I/O failed.
    #[error("slot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The slot refused the write because it is full.
    #[error("slot quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    /// The slot lock was poisoned by a panicking writer.
    #[error("slot lock poisoned")]
    Poisoned,
}

/// Errors decoding or encoding a persisted snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("slot error: {0}")]
    Slot(#[from] SlotError),
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Client-local persistent key-value storage.
///
/// All methods take `&self`; implementations use interior mutability so one
/// slot can be shared by the cart and wishlist stores.
pub trait DurableSlot: Send + Sync + Debug {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, SlotError>;

    /// Insert or replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage rejects the write.
    fn write(&self, key: &str, value: &str) -> Result<(), SlotError>;
}

/// A slot shared between stores.
pub type SharedSlot = Arc<dyn DurableSlot>;

/// In-memory slot.
///
/// Optionally enforces a byte capacity across all keys, which models a
/// browser storage quota.
#[derive(Debug, Default)]
pub struct MemorySlot {
    values: Mutex<HashMap<String, String>>,
    capacity: Option<usize>,
}

impl MemorySlot {
    /// Create an unbounded slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot that rejects writes once stored values exceed `bytes`.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            capacity: Some(bytes),
        }
    }

    /// Wrap this slot for sharing between stores.
    #[must_use]
    pub fn shared(self) -> SharedSlot {
        Arc::new(self)
    }
}

impl DurableSlot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        let values = self.values.lock().map_err(|_| SlotError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SlotError> {
        let mut values = self.values.lock().map_err(|_| SlotError::Poisoned)?;

        if let Some(capacity) = self.capacity {
            let others: usize = values
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let available = capacity.saturating_sub(others);
            if value.len() > available {
                return Err(SlotError::QuotaExceeded {
                    needed: value.len(),
                    available,
                });
            }
        }

        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<S> {
    state: S,
    version: u32,
}

#[derive(Serialize, Deserialize)]
struct ItemsState<T> {
    items: Vec<T>,
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    state: ItemsStateRef<'a, T>,
    version: u32,
}

#[derive(Serialize)]
struct ItemsStateRef<'a, T> {
    items: &'a [T],
}

/// Encode items into the persisted snapshot format.
///
/// # Errors
///
/// Returns an error if an item fails to serialize.
pub fn encode_items<T: Serialize>(items: &[T]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&EnvelopeRef {
        state: ItemsStateRef { items },
        version: SNAPSHOT_VERSION,
    })
}

/// Decode items from the persisted snapshot format.
///
/// # Errors
///
/// Returns an error if the JSON does not match the snapshot shape.
pub fn decode_items<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>, serde_json::Error> {
    let envelope: Envelope<ItemsState<T>> = serde_json::from_str(raw)?;
    Ok(envelope.state.items)
}

/// Read and decode the items stored under `key`.
///
/// # Errors
///
/// Returns an error if the slot read fails or the stored JSON is corrupt.
pub fn load_items<T: DeserializeOwned>(
    slot: &dyn DurableSlot,
    key: &str,
) -> Result<Vec<T>, SnapshotError> {
    match slot.read(key)? {
        Some(raw) => Ok(decode_items(&raw)?),
        None => Ok(Vec::new()),
    }
}

/// Encode and write items under `key`, logging instead of failing.
///
/// In-memory state stays authoritative when the write is rejected.
pub(crate) fn persist_items<T: Serialize>(slot: &dyn DurableSlot, key: &str, items: &[T]) {
    let raw = match encode_items(items) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to encode snapshot, skipping persist");
            return;
        }
    };

    if let Err(e) = slot.write(key, &raw) {
        tracing::warn!(key, error = %e, "Failed to persist snapshot, keeping in-memory state");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_slot_read_missing_key() {
        let slot = MemorySlot::new();
        assert!(slot.read("nothing").unwrap().is_none());
    }

    #[test]
    fn test_memory_slot_write_then_read() {
        let slot = MemorySlot::new();
        slot.write("k", "v1").unwrap();
        slot.write("k", "v2").unwrap();
        assert_eq!(slot.read("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn test_memory_slot_quota() {
        let slot = MemorySlot::with_capacity(8);
        slot.write("a", "12345").unwrap();
        // Replacing a key only counts the other keys against the quota.
        slot.write("a", "12345678").unwrap();
        let err = slot.write("b", "1").unwrap_err();
        assert!(matches!(
            err,
            SlotError::QuotaExceeded {
                needed: 1,
                available: 0
            }
        ));
    }

    #[test]
    fn test_snapshot_shape() {
        let raw = encode_items(&["x".to_string()]).unwrap();
        assert_eq!(raw, r#"{"state":{"items":["x"]},"version":0}"#);
        let items: Vec<String> = decode_items(&raw).unwrap();
        assert_eq!(items, vec!["x".to_string()]);
    }

    #[test]
    fn test_load_items_missing_and_corrupt() {
        let slot = MemorySlot::new();
        let items: Vec<String> = load_items(&slot, "k").unwrap();
        assert!(items.is_empty());

        slot.write("k", "not json").unwrap();
        let result: Result<Vec<String>, _> = load_items(&slot, "k");
        assert!(matches!(result, Err(SnapshotError::Json(_))));
    }
}
