//! Event metadata persistence for the Atrium roomserver (`PostgreSQL`).
//!
//! This crate sits between the ingestion pipeline, which hands it newly
//! received events with their already-interned numeric IDs, and the state
//! resolution engine, which queries it in bulk to discover type/state-key
//! pairs and the state snapshot active before each event.
//!
//! ```text
//! Ingestion                        State resolution
//!     |                                 |
//!     +-- insert_event -------> events <+-- bulk_state_entries
//!                                table  +-- bulk_state_at_events
//!                                   ^   +-- update_event_state
//!                                   |
//!                          (JSON bodies, interning tables,
//!                           and snapshots live elsewhere)
//! ```
//!
//! Every operation is a single round trip; no in-process locks are held
//! across calls and nothing links an insert to the later state update --
//! callers tolerate the observable window where an event exists with an
//! unresolved snapshot.
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`event_store`] -- Insert, bulk state lookup, and state update operations
//! - [`error`] -- Shared error types

pub mod error;
pub mod event_store;
pub mod postgres;

// Re-export primary types for convenience.
pub use error::DbError;
pub use event_store::{EventRow, EventStore};
pub use postgres::{PostgresConfig, PostgresPool};
