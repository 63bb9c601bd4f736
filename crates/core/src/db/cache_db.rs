use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::db::{CacheEntrySummary, CachedImage, SaveEntry};
use crate::model::Image;

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Error type for cache database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// Key/value persistence for images, keyed by a logical identifier.
///
/// A missing key is `Ok(None)`, never an error.
pub trait ImageCache {
    fn store(&self, key: &str, entry: &CachedImage) -> DbResult<()>;
    fn load(&self, key: &str) -> DbResult<Option<CachedImage>>;
    fn remove(&self, key: &str) -> DbResult<bool>;
}

/// SQLite-backed image cache.
///
/// This is a thin wrapper around `rusqlite::Connection` that is responsible for:
/// - Opening/creating the DB file.
/// - Applying schema migrations.
/// - Storing source images and per-target save files.
#[derive(Debug)]
pub struct CacheDb {
    conn: Connection,
}

impl CacheDb {
    /// Open (or create) a cache database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory cache, mainly for tests and one-shot runs.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// List cached images (ordered by key), without their payloads.
    pub fn list_images(&self) -> DbResult<Vec<CacheEntrySummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT key, name, length(bytes), digest, stored_at
            FROM images
            ORDER BY key
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let len: i64 = row.get(2)?;
            Ok(CacheEntrySummary {
                key: row.get(0)?,
                name: row.get(1)?,
                len: len as u64,
                digest: row.get(3)?,
                stored_at: row.get(4)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Remove every cached image and save.
    pub fn clear(&self) -> DbResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let images = tx.execute("DELETE FROM images", [])?;
        let saves = tx.execute("DELETE FROM saves", [])?;
        tx.commit()?;
        Ok(images + saves)
    }

    /// Insert or replace the save file for `target`.
    pub fn store_save(&self, entry: &SaveEntry) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO saves (target, name, bytes, stored_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![entry.target, entry.name, entry.bytes, entry.stored_at],
        )?;
        Ok(())
    }

    /// Load the save file for `target`, if one was stored.
    pub fn load_save(&self, target: &str) -> DbResult<Option<SaveEntry>> {
        let entry = self
            .conn
            .query_row(
                r#"
                SELECT target, name, bytes, stored_at
                FROM saves
                WHERE target = ?1
                "#,
                params![target],
                |row| {
                    Ok(SaveEntry {
                        target: row.get(0)?,
                        name: row.get(1)?,
                        bytes: row.get(2)?,
                        stored_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    /// List stored saves (ordered by target), without payloads.
    pub fn list_saves(&self) -> DbResult<Vec<SaveEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT target, name, stored_at
            FROM saves
            ORDER BY target
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SaveEntry {
                target: row.get(0)?,
                name: row.get(1)?,
                bytes: Vec::new(),
                stored_at: row.get(2)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn remove_save(&self, target: &str) -> DbResult<bool> {
        let n = self.conn.execute("DELETE FROM saves WHERE target = ?1", params![target])?;
        Ok(n > 0)
    }
}

impl ImageCache for CacheDb {
    fn store(&self, key: &str, entry: &CachedImage) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO images (key, name, bytes, digest, stored_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                key,
                entry.name,
                entry.image.as_bytes(),
                entry.image.digest().to_string(),
                entry.stored_at
            ],
        )?;
        Ok(())
    }

    fn load(&self, key: &str) -> DbResult<Option<CachedImage>> {
        let entry = self
            .conn
            .query_row(
                r#"
                SELECT name, bytes, stored_at
                FROM images
                WHERE key = ?1
                "#,
                params![key],
                |row| {
                    let bytes: Vec<u8> = row.get(1)?;
                    Ok(CachedImage {
                        name: row.get(0)?,
                        image: Image::from(bytes),
                        stored_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    fn remove(&self, key: &str) -> DbResult<bool> {
        let n = self.conn.execute("DELETE FROM images WHERE key = ?1", params![key])?;
        Ok(n > 0)
    }
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: images table
/// - 2: saves table
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version < 1 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS images (
                key       TEXT PRIMARY KEY,
                name      TEXT NOT NULL,
                bytes     BLOB NOT NULL,
                digest    TEXT NOT NULL,
                stored_at TEXT NOT NULL
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS saves (
                target    TEXT PRIMARY KEY,
                name      TEXT NOT NULL,
                bytes     BLOB NOT NULL,
                stored_at TEXT NOT NULL
            );

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
