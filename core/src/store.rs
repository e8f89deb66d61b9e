//! SQLite journal of play sessions.
//!
//! RULE: Only store.rs talks to the database.
//! The engine never touches it. The runner drains engine events
//! and appends them here.

use crate::{
    error::CityResult,
    event::{CityEvent, JournalEntry},
    state::CityState,
    types::{SessionId, Tick},
};
use rusqlite::{params, Connection, OptionalExtension};

/// The session row as persisted to SQLite.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub city_name:  String,
    pub version:    String,
    pub started_at: String, // RFC 3339, UTC
}

pub struct CityJournal {
    conn: Connection,
}

impl CityJournal {
    /// Open (or create) the journal database at `path`.
    pub fn open(path: &str) -> CityResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> CityResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> CityResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_journal.sql"))?;
        Ok(())
    }

    // ── Sessions ───────────────────────────────────────────────

    /// Record a new session and return its id.
    pub fn start_session(&self, city_name: &str, version: &str) -> CityResult<SessionId> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let started_at = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO session (session_id, city_name, version, started_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id, city_name, version, started_at],
        )?;
        log::debug!("Journal session {session_id} started for '{city_name}'");
        Ok(session_id)
    }

    pub fn session(&self, session_id: &str) -> CityResult<Option<SessionRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT session_id, city_name, version, started_at
                 FROM session WHERE session_id = ?1",
                params![session_id],
                |row| {
                    Ok(SessionRecord {
                        session_id: row.get(0)?,
                        city_name:  row.get(1)?,
                        version:    row.get(2)?,
                        started_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    // ── Event log ──────────────────────────────────────────────

    /// Append a batch of engine events in one transaction.
    pub fn append_events(&mut self, session_id: &str, events: &[CityEvent]) -> CityResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO event_log (session_id, day, event_type, payload)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for event in events {
                let entry = JournalEntry::from_event(session_id, event)?;
                stmt.execute(params![
                    entry.session_id,
                    entry.day as i64,
                    entry.event_type,
                    entry.payload,
                ])?;
            }
        }
        tx.commit()?;
        Ok(events.len())
    }

    pub fn events_for_session(&self, session_id: &str) -> CityResult<Vec<JournalEntry>> {
        self.query_events(
            "SELECT id, session_id, day, event_type, payload
             FROM event_log WHERE session_id = ?1
             ORDER BY id ASC",
            params![session_id],
        )
    }

    pub fn events_for_day(&self, session_id: &str, day: Tick) -> CityResult<Vec<JournalEntry>> {
        self.query_events(
            "SELECT id, session_id, day, event_type, payload
             FROM event_log WHERE session_id = ?1 AND day = ?2
             ORDER BY id ASC",
            params![session_id, day as i64],
        )
    }

    pub fn event_count(&self, session_id: &str, event_type: &str) -> CityResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE session_id = ?1 AND event_type = ?2",
            params![session_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn query_events(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> CityResult<Vec<JournalEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let entries = stmt
            .query_map(params, |row| {
                Ok(JournalEntry {
                    id:         Some(row.get(0)?),
                    session_id: row.get(1)?,
                    day:        row.get::<_, i64>(2)? as u64,
                    event_type: row.get(3)?,
                    payload:    row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // ── Snapshot ───────────────────────────────────────────────

    /// Store the full state at `state.day`. A reset can revisit a day,
    /// so a later snapshot for the same day replaces the earlier one.
    pub fn save_snapshot(&self, session_id: &str, state: &CityState) -> CityResult<()> {
        let state_json = serde_json::to_string(state)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO snapshot (session_id, day, state_json) VALUES (?1, ?2, ?3)",
            params![session_id, state.day as i64, state_json],
        )?;
        Ok(())
    }

    pub fn latest_snapshot(&self, session_id: &str) -> CityResult<Option<CityState>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT state_json FROM snapshot WHERE session_id = ?1
                 ORDER BY rowid DESC LIMIT 1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(json.map(|j| serde_json::from_str(&j)).transpose()?)
    }
}
