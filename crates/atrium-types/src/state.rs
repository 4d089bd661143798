//! Event identity and room-state projection types.
//!
//! [`EventId`] and [`ReferenceHash`] are the durable identities an event
//! keeps across the federation; the NID types in [`crate::nids`] are local
//! compressions of them. [`StateEntry`] and [`StateAtEvent`] are the
//! read-side projections the state resolver consumes in bulk.

use serde::{Deserialize, Serialize};

use crate::nids::{EventNid, EventStateKeyNid, EventTypeNid, StateSnapshotNid};

/// The textual identifier of a protocol event.
///
/// Globally unique across the federation and the natural key external
/// callers use; the store maps it to an [`EventNid`] exactly once.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Wrap a textual event identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner [`String`].
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The length in bytes of a [`ReferenceHash`].
pub const REFERENCE_HASH_LEN: usize = 32;

/// The SHA-256 reference hash of an event.
///
/// Fixed-width content identity, independent of the assigned NID. Other
/// events cite this hash when they list the event in their auth chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceHash([u8; REFERENCE_HASH_LEN]);

impl ReferenceHash {
    /// Wrap a raw 32-byte hash.
    pub const fn new(bytes: [u8; REFERENCE_HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Return the hash as a byte slice.
    pub const fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the wrapper and return the inner byte array.
    pub const fn into_inner(self) -> [u8; REFERENCE_HASH_LEN] {
        self.0
    }
}

impl From<[u8; REFERENCE_HASH_LEN]> for ReferenceHash {
    fn from(bytes: [u8; REFERENCE_HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for ReferenceHash {
    type Error = InvalidReferenceHash;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        <[u8; REFERENCE_HASH_LEN]>::try_from(bytes)
            .map(Self)
            .map_err(|_src| InvalidReferenceHash { actual: bytes.len() })
    }
}

/// A byte sequence of the wrong length was offered as a reference hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("reference hash must be {REFERENCE_HASH_LEN} bytes, got {actual}")]
pub struct InvalidReferenceHash {
    /// The length of the rejected byte sequence.
    pub actual: usize,
}

/// The (event type, state key) slot a state event occupies.
///
/// Ordering is lexicographic on `(event_type_nid, event_state_key_nid)`,
/// which is the order bulk state reads return entries in, so sorted slices
/// of entries can be binary-searched by this tuple.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct StateKeyTuple {
    /// The interned event type.
    pub event_type_nid: EventTypeNid,
    /// The interned state key; [`EventStateKeyNid::NONE`] for non-state events.
    pub event_state_key_nid: EventStateKeyNid,
}

/// A single entry of room state: which event currently fills a state slot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct StateEntry {
    /// The slot this entry fills.
    pub state_key: StateKeyTuple,
    /// The event occupying the slot.
    pub event_nid: EventNid,
}

/// The resolved room state immediately preceding an event.
///
/// Well-formed only when `before_state_snapshot_nid` is resolved; the store
/// refuses to hand out values where it is still zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateAtEvent {
    /// The event's own state entry.
    pub state_entry: StateEntry,
    /// The snapshot of room state active before the event.
    pub before_state_snapshot_nid: StateSnapshotNid,
}

impl StateAtEvent {
    /// Whether the preceding state snapshot has been resolved.
    pub const fn is_resolved(&self) -> bool {
        self.before_state_snapshot_nid.is_resolved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(type_nid: i64, key_nid: i64, event_nid: i64) -> StateEntry {
        StateEntry {
            state_key: StateKeyTuple {
                event_type_nid: EventTypeNid::new(type_nid),
                event_state_key_nid: EventStateKeyNid::new(key_nid),
            },
            event_nid: EventNid::new(event_nid),
        }
    }

    #[test]
    fn state_entries_order_by_type_then_key() {
        let mut entries = vec![entry(3, 1, 10), entry(1, 2, 30), entry(1, 1, 20)];
        entries.sort();
        let keys: Vec<(i64, i64)> = entries
            .iter()
            .map(|e| {
                (
                    e.state_key.event_type_nid.into_inner(),
                    e.state_key.event_state_key_nid.into_inner(),
                )
            })
            .collect();
        assert_eq!(keys, vec![(1, 1), (1, 2), (3, 1)]);
    }

    #[test]
    fn sorted_entries_support_binary_search_by_slot() {
        let entries = vec![entry(1, 1, 20), entry(1, 2, 30), entry(3, 1, 10)];
        let target = StateKeyTuple {
            event_type_nid: EventTypeNid::new(1),
            event_state_key_nid: EventStateKeyNid::new(2),
        };
        let found = entries.binary_search_by_key(&target, |e| e.state_key);
        assert_eq!(found, Ok(1));
    }

    #[test]
    fn reference_hash_rejects_wrong_length() {
        let short = [0_u8; 16];
        let result = ReferenceHash::try_from(short.as_slice());
        assert_eq!(result, Err(InvalidReferenceHash { actual: 16 }));

        let exact = [7_u8; REFERENCE_HASH_LEN];
        let hash = ReferenceHash::try_from(exact.as_slice()).ok();
        assert_eq!(hash, Some(ReferenceHash::new(exact)));
    }

    #[test]
    fn event_id_roundtrip_serde() {
        let original = EventId::new("$abc123:example.org");
        let json = serde_json::to_string(&original).ok();
        // serde(transparent) serializes as a bare string.
        assert_eq!(json.as_deref(), Some("\"$abc123:example.org\""));
        let restored: Result<EventId, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn state_at_event_resolution_tracks_snapshot() {
        let unresolved = StateAtEvent {
            state_entry: entry(1, 1, 1),
            before_state_snapshot_nid: StateSnapshotNid::UNRESOLVED,
        };
        assert!(!unresolved.is_resolved());

        let resolved = StateAtEvent {
            before_state_snapshot_nid: StateSnapshotNid::new(7),
            ..unresolved
        };
        assert!(resolved.is_resolved());
    }
}
