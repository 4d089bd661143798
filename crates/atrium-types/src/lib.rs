//! Shared type definitions for the Atrium roomserver storage layer.
//!
//! This crate is the single source of truth for the compact numeric
//! identifiers (NIDs) the roomserver substitutes for verbose protocol
//! identifiers, and for the state projections the state resolver reads in
//! bulk from the event metadata store.
//!
//! # Modules
//!
//! - [`nids`] -- Type-safe `i64` wrappers for each interned identifier space
//! - [`state`] -- Event identity (`EventId`, `ReferenceHash`) and the
//!   `StateEntry`/`StateAtEvent` projections

pub mod nids;
pub mod state;

// Re-export all public types at crate root for convenience.
pub use nids::{EventNid, EventStateKeyNid, EventTypeNid, RoomNid, StateSnapshotNid};
pub use state::{
    EventId, InvalidReferenceHash, REFERENCE_HASH_LEN, ReferenceHash, StateAtEvent, StateEntry,
    StateKeyTuple,
};
