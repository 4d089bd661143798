//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`]. Backend failures are wrapped
//! [`sqlx`] errors surfaced verbatim; the store performs no retries and no
//! local recovery -- the ingestion and resolution callers own that policy.

use atrium_types::EventNid;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A bulk lookup found fewer rows than distinct event IDs requested.
    ///
    /// Deliberately carries counts rather than the absent identifiers:
    /// naming them would cost a second query on the hot path. Use
    /// [`crate::EventStore::missing_event_ids`] for offline diagnostics.
    #[error("event IDs missing from the database ({found} != {requested})")]
    MissingEventIds {
        /// Rows actually located.
        found: usize,
        /// Distinct event IDs requested.
        requested: usize,
    },

    /// A state-at-event lookup located an event whose preceding state has
    /// not been resolved yet.
    #[error("missing state for event NID {0}")]
    UnresolvedState(EventNid),

    /// A state update targeted an event NID that does not exist.
    #[error("no event with NID {0}")]
    UnknownEventNid(EventNid),
}
