use crate::error::Result;
use crate::stats::WordRecord;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Everything that is persisted: per-word records plus the config map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub words: BTreeMap<String, WordRecord>,
    pub config: BTreeMap<String, String>,
}

/// Durable home of a [`StatsSnapshot`].
pub trait StatsBackend {
    fn load(&mut self) -> Result<StatsSnapshot>;
    fn save(&mut self, snapshot: &StatsSnapshot) -> Result<()>;
}

impl<T: StatsBackend + ?Sized> StatsBackend for Box<T> {
    fn load(&mut self) -> Result<StatsSnapshot> {
        (**self).load()
    }

    fn save(&mut self, snapshot: &StatsSnapshot) -> Result<()> {
        (**self).save(snapshot)
    }
}

/// In-process backend; remembers the last saved snapshot.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    snapshot: StatsSnapshot,
    saves: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: StatsSnapshot) -> Self {
        Self { snapshot, saves: 0 }
    }

    pub fn saved(&self) -> &StatsSnapshot {
        &self.snapshot
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl StatsBackend for MemoryBackend {
    fn load(&mut self) -> Result<StatsSnapshot> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &StatsSnapshot) -> Result<()> {
        self.snapshot = snapshot.clone();
        self.saves += 1;
        Ok(())
    }
}

/// Single pretty-printed JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatsBackend for JsonFileBackend {
    /// A missing or unreadable document loads as the empty snapshot.
    fn load(&mut self) -> Result<StatsSnapshot> {
        let Ok(bytes) = fs::read(&self.path) else {
            return Ok(StatsSnapshot::default());
        };
        match serde_json::from_slice::<StatsSnapshot>(&bytes) {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable stats file");
                Ok(StatsSnapshot::default())
            }
        }
    }

    fn save(&mut self, snapshot: &StatsSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(snapshot)?;
        fs::write(&self.path, data)?;
        debug!(path = %self.path.display(), words = snapshot.words.len(), "saved stats");
        Ok(())
    }
}

/// SQLite database with one row per word and one per config key.
#[derive(Debug)]
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS word_stats (
                word TEXT PRIMARY KEY,
                speeds TEXT NOT NULL,
                missed_count INTEGER NOT NULL DEFAULT 0
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS config (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
            [],
        )?;

        Ok(Self { conn })
    }
}

impl StatsBackend for SqliteBackend {
    fn load(&mut self) -> Result<StatsSnapshot> {
        let mut snapshot = StatsSnapshot::default();

        let mut stmt = self
            .conn
            .prepare("SELECT word, speeds, missed_count FROM word_stats ORDER BY word")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
            ))
        })?;
        for row in rows {
            let (word, speeds, missed_count) = row?;
            let speeds: Vec<f64> = serde_json::from_str(&speeds)?;
            snapshot.words.insert(
                word,
                WordRecord {
                    speeds,
                    missed_count,
                },
            );
        }

        let mut stmt = self.conn.prepare("SELECT key, value FROM config")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        for row in rows {
            let (key, value): (String, String) = row?;
            snapshot.config.insert(key, value);
        }

        Ok(snapshot)
    }

    /// Rewrites both tables in a single transaction.
    fn save(&mut self, snapshot: &StatsSnapshot) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM word_stats", [])?;
        tx.execute("DELETE FROM config", [])?;

        for (word, record) in &snapshot.words {
            tx.execute(
                "INSERT INTO word_stats (word, speeds, missed_count) VALUES (?1, ?2, ?3)",
                params![word, serde_json::to_string(&record.speeds)?, record.missed_count],
            )?;
        }
        for (key, value) in &snapshot.config {
            tx.execute(
                "INSERT INTO config (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }

        tx.commit()?;
        debug!(words = snapshot.words.len(), "saved stats to sqlite");
        Ok(())
    }
}
