use std::{fs, path::Path};

use alloy::primitives::B256;
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::{
    message::{IndexedEvent, RampEvent},
    state::{PersistentState, STATE_VERSION},
};

/// Bumped whenever the table layout changes.
const CURRENT_DB_VERSION: u32 = 1;

const DB_FILE: &str = "ramp.sqlite3";

/// Durable storage for a bridge instance: its persistent state, the ids of forwarded messages
/// and the append-only event log.
#[derive(Debug)]
pub struct Db {
    conn: Connection,
    path: Option<Box<Path>>,
}

impl Db {
    /// Opens the database under `data_dir`, or an in-memory database if no directory is given.
    pub fn new<P>(data_dir: Option<P>) -> Result<Db>
    where
        P: AsRef<Path>,
    {
        let (conn, path) = match data_dir {
            Some(dir) => {
                let dir = dir.as_ref();
                fs::create_dir_all(dir).context(format!("Unable to create {dir:?}"))?;
                let path = dir.join(DB_FILE);
                let conn = Connection::open(&path)
                    .with_context(|| format!("Unable to open {path:?}"))?;
                (conn, Some(path.into_boxed_path()))
            }
            None => (Connection::open_in_memory()?, None),
        };

        conn.trace_v2(
            rusqlite::trace::TraceEventCodes::SQLITE_TRACE_STMT,
            Some(|statement| {
                if let rusqlite::trace::TraceEvent::Stmt(_, statement) = statement {
                    tracing::trace!(statement, "sql executed");
                }
            }),
        );

        let db = Db { conn, path };
        db.ensure_schema()?;
        Ok(db)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);
            CREATE TABLE IF NOT EXISTS ramp_state (
                id INTEGER PRIMARY KEY CHECK (id = 0),
                state TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS forwarded (message_id BLOB PRIMARY KEY);
            CREATE TABLE IF NOT EXISTS events (
                idx INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                event TEXT NOT NULL
            );",
        )?;

        let version: Option<u32> = self
            .conn
            .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
            .optional()?;
        match version {
            Some(version) if version == CURRENT_DB_VERSION => {}
            Some(version) => {
                return Err(anyhow!(
                    "database has schema version {version} but {CURRENT_DB_VERSION} is required - please delete the data"
                ));
            }
            None => {
                self.conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![CURRENT_DB_VERSION],
                )?;
                info!(path = ?self.path, "database created");
            }
        }
        Ok(())
    }

    pub fn load_state(&self) -> Result<Option<PersistentState>> {
        let state: Option<String> = self
            .conn
            .query_row("SELECT state FROM ramp_state WHERE id = 0", [], |row| {
                row.get(0)
            })
            .optional()?;
        let Some(state) = state else {
            return Ok(None);
        };

        let state: PersistentState =
            serde_json::from_str(&state).context("Unable to decode bridge state")?;
        if state.version != STATE_VERSION {
            return Err(anyhow!(
                "bridge state has version {} but {STATE_VERSION} is required",
                state.version
            ));
        }
        Ok(Some(state))
    }

    pub fn is_forwarded(&self, message_id: &B256) -> Result<bool> {
        let found: Option<u8> = self
            .conn
            .prepare_cached("SELECT 1 FROM forwarded WHERE message_id = ?1")?
            .query_row(params![message_id.as_slice()], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    pub fn forwarded_count(&self) -> Result<u64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM forwarded", [], |row| row.get(0))?)
    }

    /// Stores `state`, records `forwarded` message ids and appends `events` to the log in a single
    /// transaction. Returns the events with the indices they were stored at.
    pub fn commit(
        &mut self,
        state: &PersistentState,
        forwarded: &[B256],
        events: &[RampEvent],
    ) -> Result<Vec<IndexedEvent>> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO ramp_state (id, state) VALUES (0, ?1)
            ON CONFLICT (id) DO UPDATE SET state = excluded.state",
            params![serde_json::to_string(state)?],
        )?;
        for message_id in forwarded {
            tx.execute(
                "INSERT INTO forwarded (message_id) VALUES (?1)",
                params![message_id.as_slice()],
            )
            .with_context(|| format!("Unable to record {message_id} as forwarded"))?;
        }

        let next: u64 = tx.query_row(
            "SELECT COALESCE(MAX(idx) + 1, 0) FROM events",
            [],
            |row| row.get(0),
        )?;
        let mut indexed = Vec::with_capacity(events.len());
        for (index, event) in (next..).zip(events) {
            tx.execute(
                "INSERT INTO events (idx, name, event) VALUES (?1, ?2, ?3)",
                params![index, event.name(), serde_json::to_string(event)?],
            )?;
            indexed.push(IndexedEvent {
                index,
                event: event.clone(),
            });
        }
        tx.commit()?;

        debug!(events = indexed.len(), "state committed");
        Ok(indexed)
    }

    /// All events with an index of at least `index`, oldest first.
    pub fn events_since(&self, index: u64) -> Result<Vec<IndexedEvent>> {
        let mut statement = self
            .conn
            .prepare_cached("SELECT idx, event FROM events WHERE idx >= ?1 ORDER BY idx")?;
        let rows = statement.query_map(params![index], |row| {
            Ok((row.get::<_, u64>(0)?, row.get::<_, String>(1)?))
        })?;

        let events = rows
            .map(|row| -> Result<IndexedEvent> {
                let (index, event) = row?;
                let event = serde_json::from_str(&event)
                    .with_context(|| format!("Unable to decode event {index}"))?;
                Ok(IndexedEvent { index, event })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(events)
    }
}

/// The forwarded message ids as seen from inside a call: those already committed, plus those the
/// call itself has accepted so far.
#[derive(Debug)]
pub struct ForwardedIds<'a> {
    db: &'a Db,
    pending: Vec<B256>,
}

impl<'a> ForwardedIds<'a> {
    pub fn new(db: &'a Db) -> ForwardedIds<'a> {
        ForwardedIds {
            db,
            pending: Vec::new(),
        }
    }

    pub fn contains(&self, message_id: &B256) -> Result<bool> {
        Ok(self.pending.contains(message_id) || self.db.is_forwarded(message_id)?)
    }

    /// Returns `false` if `message_id` was already forwarded.
    pub fn insert(&mut self, message_id: B256) -> Result<bool> {
        if self.contains(&message_id)? {
            return Ok(false);
        }
        self.pending.push(message_id);
        Ok(true)
    }

    /// The ids accepted since this view was created, which are yet to be committed.
    pub fn into_pending(self) -> Vec<B256> {
        self.pending
    }
}
