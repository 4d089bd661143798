//! Type-safe numeric identifier (NID) wrappers.
//!
//! The roomserver substitutes compact 64-bit integers for verbose protocol
//! identifiers: room IDs, event types, and state keys are interned once by
//! the lookup tables and referenced by NID everywhere else. Strongly-typed
//! wrappers prevent accidental mixing of identifier spaces at compile time.
//!
//! Event NIDs are issued by the database sequence at insert time; the other
//! NID spaces are assigned by the (external) interning tables and consumed
//! here as given.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `i64` with standard derives.
macro_rules! define_nid {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Default,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Wrap a raw numeric identifier.
            pub const fn new(nid: i64) -> Self {
                Self(nid)
            }

            /// Return the inner `i64` value.
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(nid: i64) -> Self {
                Self(nid)
            }
        }

        impl From<$name> for i64 {
            fn from(nid: $name) -> Self {
                nid.0
            }
        }
    };
}

define_nid! {
    /// Local numeric identifier for an event.
    ///
    /// Issued by the store's monotonic sequence at first insert and never
    /// reused, even across duplicate inserts that do not consume one.
    EventNid
}

define_nid! {
    /// Local numeric identifier for a room. Never zero.
    RoomNid
}

define_nid! {
    /// Local numeric identifier for an event type. Never zero.
    EventTypeNid
}

define_nid! {
    /// Local numeric identifier for an event's state key.
    ///
    /// Zero is the sentinel for "not a state event".
    EventStateKeyNid
}

define_nid! {
    /// Local numeric identifier for a computed room-state snapshot.
    ///
    /// Zero is the sentinel for "state before this event not yet resolved".
    StateSnapshotNid
}

impl EventStateKeyNid {
    /// Sentinel for events that are not state events.
    pub const NONE: Self = Self(0);

    /// Whether this NID identifies a real state slot.
    pub const fn is_state(self) -> bool {
        self.0 != 0
    }
}

impl StateSnapshotNid {
    /// Sentinel for events whose preceding state has not been resolved.
    pub const UNRESOLVED: Self = Self(0);

    /// Whether state resolution has assigned a snapshot.
    pub const fn is_resolved(self) -> bool {
        self.0 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nids_are_distinct_types() {
        let event = EventNid::new(1);
        let room = RoomNid::new(1);
        // These are different types -- the compiler enforces no mixing.
        assert_eq!(event.into_inner(), room.into_inner());
    }

    #[test]
    fn sentinel_predicates() {
        assert!(!EventStateKeyNid::NONE.is_state());
        assert!(EventStateKeyNid::new(5).is_state());
        assert!(!StateSnapshotNid::UNRESOLVED.is_resolved());
        assert!(StateSnapshotNid::new(7).is_resolved());
    }

    #[test]
    fn nid_roundtrip_serde() {
        let original = EventNid::new(42);
        let json = serde_json::to_string(&original).ok();
        // serde(transparent) serializes as a bare integer.
        assert_eq!(json.as_deref(), Some("42"));
        let restored: Result<EventNid, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn nid_display_matches_inner() {
        let nid = StateSnapshotNid::new(99);
        assert_eq!(nid.to_string(), "99");
    }
}
