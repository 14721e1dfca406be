//! SQLite metadata store for indexed media files and their directories.
//!
//! Provides pooled connections and schema bootstrap.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{MediaFileRecord, MediaKind, MetaData};

const SCHEMA_VERSION: i32 = 1;

const RECORD_COLUMNS: &str = "id, path, parent_id, kind, title, artist, album_artist, album, \
     track_number, disc_number, year, genre, format, child_count";

#[derive(Clone)]
pub struct MetadataDb {
    pool: Pool<SqliteConnectionManager>,
}

/// File-system facts stored alongside a file's tags.
#[derive(Clone, Debug, Default)]
pub struct FileStamp {
    pub format: Option<String>,
    pub mtime_ms: i64,
    pub size_bytes: i64,
}

impl FileStamp {
    pub fn from_fs(format: Option<String>, fs_meta: &std::fs::Metadata) -> Self {
        Self {
            format,
            mtime_ms: fs_meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as i64)
                .unwrap_or(0),
            size_bytes: fs_meta.len() as i64,
        }
    }
}

fn map_record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MediaFileRecord> {
    let kind: String = row.get(3)?;
    let kind = MediaKind::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown media kind {kind:?}").into(),
        )
    })?;
    Ok(MediaFileRecord {
        id: row.get(0)?,
        path: row.get(1)?,
        parent_id: row.get(2)?,
        kind,
        title: row.get(4)?,
        artist: row.get(5)?,
        album_artist: row.get(6)?,
        album: row.get(7)?,
        track_number: row.get::<_, Option<i64>>(8)?.map(|v| v as u32),
        disc_number: row.get::<_, Option<i64>>(9)?.map(|v| v as u32),
        year: row.get(10)?,
        genre: row.get(11)?,
        format: row.get(12)?,
        child_count: row.get(13)?,
    })
}

impl MetadataDb {
    /// Open (or create) the database at `db_path`.
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create metadata dir {:?}", parent))?;
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .context("create metadata db pool")?;

        {
            let conn = pool.get().context("open metadata db")?;
            init_schema(&conn)?;
        }

        Ok(Self { pool })
    }

    pub fn media_file_by_id(&self, id: i64) -> Result<Option<MediaFileRecord>> {
        let conn = self.pool.get().context("open metadata db")?;
        conn.query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM media_files WHERE id = ?1"),
            params![id],
            map_record_row,
        )
        .optional()
        .context("fetch media file by id")
    }

    pub fn media_file_by_path(&self, path: &str) -> Result<Option<MediaFileRecord>> {
        let conn = self.pool.get().context("open metadata db")?;
        conn.query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM media_files WHERE path = ?1"),
            params![path],
            map_record_row,
        )
        .optional()
        .context("fetch media file by path")
    }

    /// Children of a directory, in album order.
    pub fn list_children(&self, parent_id: i64) -> Result<Vec<MediaFileRecord>> {
        let conn = self.pool.get().context("open metadata db")?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM media_files WHERE parent_id = ?1 \
             ORDER BY COALESCE(disc_number, 0), COALESCE(track_number, 0), path"
        ))?;
        let rows = stmt.query_map(params![parent_id], map_record_row)?;
        Ok(rows.filter_map(Result::ok).collect())
    }

    /// Insert an entry if its path is new; returns the row id either way.
    ///
    /// An existing row keeps its tag columns but follows the given parent.
    pub fn upsert_entry(&self, path: &str, kind: MediaKind, parent_id: Option<i64>) -> Result<i64> {
        let conn = self.pool.get().context("open metadata db")?;
        conn.execute(
            r#"
            INSERT INTO media_files (path, kind, parent_id) VALUES (?1, ?2, ?3)
            ON CONFLICT(path) DO UPDATE SET
                kind = excluded.kind,
                parent_id = excluded.parent_id
            "#,
            params![path, kind.as_str(), parent_id],
        )
        .context("upsert media file")?;
        let id: i64 = conn
            .query_row(
                "SELECT id FROM media_files WHERE path = ?1",
                params![path],
                |row| row.get(0),
            )
            .context("lookup media file id")?;
        Ok(id)
    }

    /// Store freshly read tags for a file row.
    pub fn update_file_tags(&self, id: i64, meta: &MetaData, stamp: &FileStamp) -> Result<bool> {
        let conn = self.pool.get().context("open metadata db")?;
        let updated = conn
            .execute(
                r#"
                UPDATE media_files
                SET title = ?1,
                    artist = ?2,
                    album_artist = ?3,
                    album = ?4,
                    track_number = ?5,
                    disc_number = ?6,
                    year = ?7,
                    genre = ?8,
                    format = ?9,
                    mtime_ms = ?10,
                    size_bytes = ?11
                WHERE id = ?12 AND kind = 'file'
                "#,
                params![
                    meta.title,
                    meta.artist,
                    meta.album_artist,
                    meta.album,
                    meta.track_number,
                    meta.disc_number,
                    meta.year,
                    meta.genre,
                    stamp.format,
                    stamp.mtime_ms,
                    stamp.size_bytes,
                    id
                ],
            )
            .context("update file tags")?;
        Ok(updated > 0)
    }

    /// Re-derive a directory's aggregate fields from its children.
    ///
    /// Each field takes the first value present in album order; the
    /// directory's artist prefers album artist over track artist.
    pub fn update_directory_aggregate(&self, id: i64) -> Result<bool> {
        let children = self.list_children(id)?;
        let album = first_present(&children, |c| c.album.clone());
        let artist = first_present(&children, |c| {
            c.album_artist.clone().or_else(|| c.artist.clone())
        });
        let year = first_present(&children, |c| c.year);
        let genre = first_present(&children, |c| c.genre.clone());

        let conn = self.pool.get().context("open metadata db")?;
        let updated = conn
            .execute(
                r#"
                UPDATE media_files
                SET album = ?1,
                    artist = ?2,
                    album_artist = ?2,
                    year = ?3,
                    genre = ?4,
                    child_count = ?5
                WHERE id = ?6 AND kind = 'directory'
                "#,
                params![album, artist, year, genre, children.len() as i64, id],
            )
            .context("update directory aggregate")?;
        Ok(updated > 0)
    }

    pub fn delete_by_path(&self, path: &str) -> Result<bool> {
        let conn = self.pool.get().context("open metadata db")?;
        let deleted = conn
            .execute("DELETE FROM media_files WHERE path = ?1", params![path])
            .context("delete media file by path")?;
        Ok(deleted > 0)
    }
}

/// Default database location for a media root.
pub fn db_path_for(media_root: &Path) -> PathBuf {
    media_root.join(".tag-server").join("metadata.sqlite")
}

fn first_present<T>(
    children: &[MediaFileRecord],
    value: impl Fn(&MediaFileRecord) -> Option<T>,
) -> Option<T> {
    children
        .iter()
        .filter(|child| child.kind == MediaKind::File)
        .find_map(value)
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS media_files (
            id INTEGER PRIMARY KEY,
            path TEXT NOT NULL UNIQUE,
            parent_id INTEGER,
            kind TEXT NOT NULL,
            title TEXT,
            artist TEXT,
            album_artist TEXT,
            album TEXT,
            track_number INTEGER,
            disc_number INTEGER,
            year INTEGER,
            genre TEXT,
            format TEXT,
            child_count INTEGER,
            mtime_ms INTEGER,
            size_bytes INTEGER,
            FOREIGN KEY(parent_id) REFERENCES media_files(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_media_files_parent_id ON media_files(parent_id);
        "#,
    )
    .context("create metadata schema")?;

    let version_raw: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    if version_raw.is_none() {
        conn.execute(
            "INSERT INTO meta (key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )
        .context("insert schema version")?;
    }

    Ok(())
}
