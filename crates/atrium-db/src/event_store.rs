//! Event metadata operations for the `events` table.
//!
//! One row per protocol event ever seen: the interned numeric IDs, the
//! textual event ID, the reference hash, the ordered auth-event NIDs, and
//! the state snapshot computed for the event by state resolution. The
//! resolver reads this table in bulk and binary-searches the results, so
//! the ordering and completeness behavior of the bulk lookups is contract,
//! not implementation detail.

use std::collections::HashSet;

use atrium_types::{
    EventId, EventNid, EventStateKeyNid, EventTypeNid, ReferenceHash, RoomNid, StateAtEvent,
    StateEntry, StateKeyTuple, StateSnapshotNid,
};
use sqlx::PgPool;

use crate::error::DbError;

/// Operations on the `events` table.
pub struct EventStore<'a> {
    pool: &'a PgPool,
}

impl<'a> EventStore<'a> {
    /// Create a new event store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert metadata for a newly received event, or return the existing
    /// record's identity if the event ID has been seen before.
    ///
    /// A fresh event draws its NID from the `event_nid_seq` sequence and
    /// starts with an unresolved state snapshot. A duplicate event ID
    /// mutates nothing: the conflict clause re-affirms the existing row so
    /// that `RETURNING` can hand back the stored NID and whatever snapshot
    /// is currently recorded. This makes ingestion safe under at-least-once
    /// delivery -- replays and races produce no duplicate rows and no lost
    /// state.
    ///
    /// `room_nid` and `event_type_nid` are never zero; the interning tables
    /// guarantee that before this call. `auth_event_nids` is stored exactly
    /// as given -- callers insert auth events before their dependents, and
    /// this store does not re-check referential existence.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert_event(
        &self,
        room_nid: RoomNid,
        event_type_nid: EventTypeNid,
        event_state_key_nid: EventStateKeyNid,
        event_id: &EventId,
        reference_hash: &ReferenceHash,
        auth_event_nids: &[EventNid],
    ) -> Result<(EventNid, StateSnapshotNid), DbError> {
        let auth_nids: Vec<i64> = auth_event_nids.iter().map(|nid| nid.into_inner()).collect();

        let (event_nid, state_snapshot_nid): (i64, i64) = sqlx::query_as(
            r"INSERT INTO events (room_nid, event_type_nid, event_state_key_nid, event_id, reference_sha256, auth_event_nids)
              VALUES ($1, $2, $3, $4, $5, $6)
              ON CONFLICT ON CONSTRAINT event_id_unique
              DO UPDATE SET event_id = EXCLUDED.event_id
              RETURNING event_nid, state_snapshot_nid",
        )
        .bind(room_nid.into_inner())
        .bind(event_type_nid.into_inner())
        .bind(event_state_key_nid.into_inner())
        .bind(event_id.as_str())
        .bind(reference_hash.as_bytes())
        .bind(&auth_nids)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(%event_id, event_nid, "Inserted event metadata");
        Ok((
            EventNid::new(event_nid),
            StateSnapshotNid::new(state_snapshot_nid),
        ))
    }

    /// Bulk lookup of state entries by textual event ID.
    ///
    /// The result is sorted ascending by `(event_type_nid,
    /// event_state_key_nid)`, not by input order: the resolver
    /// binary-searches the returned slice by that tuple. Exactly one entry
    /// is returned per distinct requested ID or the whole call fails.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MissingEventIds`] if any requested ID is absent,
    /// and [`DbError::Postgres`] if the query fails.
    pub async fn bulk_state_entries(
        &self,
        event_ids: &[EventId],
    ) -> Result<Vec<StateEntry>, DbError> {
        let ids = distinct_ids(event_ids);

        let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
            r"SELECT event_type_nid, event_state_key_nid, event_nid FROM events
              WHERE event_id = ANY($1)
              ORDER BY event_type_nid, event_state_key_nid ASC",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        // The unique constraint on event_id guarantees at most one row per
        // requested identifier, so fewer rows than distinct IDs means some
        // were never stored. Which ones is left to offline diagnostics
        // (missing_event_ids) rather than slowing down this path.
        if rows.len() != ids.len() {
            return Err(DbError::MissingEventIds {
                found: rows.len(),
                requested: ids.len(),
            });
        }

        Ok(rows
            .into_iter()
            .map(|(event_type_nid, event_state_key_nid, event_nid)| StateEntry {
                state_key: StateKeyTuple {
                    event_type_nid: EventTypeNid::new(event_type_nid),
                    event_state_key_nid: EventStateKeyNid::new(event_state_key_nid),
                },
                event_nid: EventNid::new(event_nid),
            })
            .collect())
    }

    /// Bulk lookup of the resolved state preceding each event.
    ///
    /// Same completeness rule as [`EventStore::bulk_state_entries`], and
    /// additionally every located event must already have a resolved
    /// snapshot: the resolver must never silently receive partial state, so
    /// an unresolved snapshot here is a hard error distinct from a missing
    /// row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MissingEventIds`] if any requested ID is absent,
    /// [`DbError::UnresolvedState`] if any located event's snapshot is
    /// still unresolved, and [`DbError::Postgres`] if the query fails.
    pub async fn bulk_state_at_events(
        &self,
        event_ids: &[EventId],
    ) -> Result<Vec<StateAtEvent>, DbError> {
        let ids = distinct_ids(event_ids);

        let rows: Vec<(i64, i64, i64, i64)> = sqlx::query_as(
            r"SELECT event_type_nid, event_state_key_nid, event_nid, state_snapshot_nid
              FROM events
              WHERE event_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        if rows.len() != ids.len() {
            return Err(DbError::MissingEventIds {
                found: rows.len(),
                requested: ids.len(),
            });
        }

        let mut results = Vec::with_capacity(rows.len());
        for (event_type_nid, event_state_key_nid, event_nid, state_snapshot_nid) in rows {
            let before_state_snapshot_nid = StateSnapshotNid::new(state_snapshot_nid);
            if !before_state_snapshot_nid.is_resolved() {
                return Err(DbError::UnresolvedState(EventNid::new(event_nid)));
            }
            results.push(StateAtEvent {
                state_entry: StateEntry {
                    state_key: StateKeyTuple {
                        event_type_nid: EventTypeNid::new(event_type_nid),
                        event_state_key_nid: EventStateKeyNid::new(event_state_key_nid),
                    },
                    event_nid: EventNid::new(event_nid),
                },
                before_state_snapshot_nid,
            });
        }
        Ok(results)
    }

    /// Record the state snapshot computed for an event.
    ///
    /// A single-row point write, idempotent on repeat. Concurrent updates
    /// to the same row are ordered by `PostgreSQL` but not coordinated
    /// here: last write wins. Callers needing resolve-exactly-once
    /// semantics coordinate that in the resolution engine.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::UnknownEventNid`] if no event has the given NID,
    /// and [`DbError::Postgres`] if the update fails.
    pub async fn update_event_state(
        &self,
        event_nid: EventNid,
        state_snapshot_nid: StateSnapshotNid,
    ) -> Result<(), DbError> {
        let result = sqlx::query(r"UPDATE events SET state_snapshot_nid = $2 WHERE event_nid = $1")
            .bind(event_nid.into_inner())
            .bind(state_snapshot_nid.into_inner())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::UnknownEventNid(event_nid));
        }

        tracing::debug!(
            event_nid = event_nid.into_inner(),
            state_snapshot_nid = state_snapshot_nid.into_inner(),
            "Updated event state snapshot"
        );
        Ok(())
    }

    /// Point read of a single event's full metadata row.
    ///
    /// Not part of the resolver's hot path; used by consistency checks and
    /// tests that need to see the stored record as-is.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn select_event(&self, event_id: &EventId) -> Result<Option<EventRow>, DbError> {
        let row = sqlx::query_as::<_, EventRow>(
            r"SELECT event_nid, room_nid, event_type_nid, event_state_key_nid,
                     state_snapshot_nid, event_id, reference_sha256, auth_event_nids
              FROM events
              WHERE event_id = $1",
        )
        .bind(event_id.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Report which of the given event IDs are absent from storage.
    ///
    /// The slow-path companion to the bulk lookups: their missing-entries
    /// error carries only counts, and this query names the offenders for
    /// out-of-band debugging against the upstream ingestion log. Never
    /// called from the bulk read paths.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn missing_event_ids(&self, event_ids: &[EventId]) -> Result<Vec<EventId>, DbError> {
        let ids = distinct_ids(event_ids);

        let present: Vec<(String,)> =
            sqlx::query_as(r"SELECT event_id FROM events WHERE event_id = ANY($1)")
                .bind(&ids)
                .fetch_all(self.pool)
                .await?;
        let present: HashSet<String> = present.into_iter().map(|(id,)| id).collect();

        Ok(ids
            .into_iter()
            .filter(|id| !present.contains(id))
            .map(EventId::new)
            .collect())
    }
}

/// A full row from the `events` table.
///
/// Uses runtime types rather than compile-time checked types to
/// avoid requiring a live database during builds.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Sequence-issued numeric ID for the event.
    pub event_nid: i64,
    /// Interned numeric ID of the room.
    pub room_nid: i64,
    /// Interned numeric ID of the event type.
    pub event_type_nid: i64,
    /// Interned numeric ID of the state key; 0 for non-state events.
    pub event_state_key_nid: i64,
    /// Snapshot of room state before the event; 0 while unresolved.
    pub state_snapshot_nid: i64,
    /// The textual event ID.
    pub event_id: String,
    /// The SHA-256 reference hash.
    pub reference_sha256: Vec<u8>,
    /// Ordered auth-event NIDs, exactly as supplied at insert.
    pub auth_event_nids: Vec<i64>,
}

impl EventRow {
    /// Decode the stored reference hash into its fixed-width type.
    ///
    /// # Errors
    ///
    /// Returns [`atrium_types::InvalidReferenceHash`] if the stored bytes
    /// are not exactly the reference-hash width, which would indicate
    /// corruption.
    pub fn reference_hash(&self) -> Result<ReferenceHash, atrium_types::InvalidReferenceHash> {
        ReferenceHash::try_from(self.reference_sha256.as_slice())
    }
}

/// Deduplicate the requested IDs so the completeness check counts each
/// distinct identifier once, however the caller batched them.
fn distinct_ids(event_ids: &[EventId]) -> Vec<String> {
    let mut ids: Vec<String> = event_ids.iter().map(|id| id.as_str().to_owned()).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
