//! Media index access used by the tag service.
//!
//! [`MediaIndex`] is the narrow read/refresh seam; [`LibraryIndex`] is the
//! SQLite-backed implementation that re-reads tags through a codec registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::codec::{CodecRegistry, CodecResolution};
use crate::metadata_db::{FileStamp, MetadataDb};
use crate::models::{MediaFileRecord, MediaKind, MetaData};

/// Read and refresh access to the indexed library.
pub trait MediaIndex: Send + Sync {
    /// Look up a record by id; `Ok(None)` when it is not indexed.
    fn media_file(&self, id: i64) -> Result<Option<MediaFileRecord>>;
    /// The container holding `record`, if any.
    fn parent_of(&self, record: &MediaFileRecord) -> Result<Option<MediaFileRecord>>;
    /// Re-derive the cached fields of `record` from disk (files) or from
    /// its children (directories).
    fn refresh(&self, record: &MediaFileRecord) -> Result<()>;
}

#[derive(Clone)]
pub struct LibraryIndex {
    db: MetadataDb,
    codecs: Arc<dyn CodecRegistry>,
    root: PathBuf,
}

impl LibraryIndex {
    /// `root` is canonicalized; registered files must live below it.
    pub fn new(db: MetadataDb, codecs: Arc<dyn CodecRegistry>, root: &Path) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("canonicalize root {:?}", root))?;
        if !root.is_dir() {
            return Err(anyhow::anyhow!("root is not a directory: {:?}", root));
        }
        Ok(Self { db, codecs, root })
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Add one file to the index, then refresh it and its directory.
    pub fn register_file(&self, raw_path: &Path) -> Result<MediaFileRecord> {
        let full_path = self.resolve_path(raw_path)?;
        if !full_path.is_file() {
            return Err(anyhow::anyhow!("not a file: {:?}", full_path));
        }
        let parent_id = match full_path.parent() {
            Some(dir) => Some(self.ensure_directory(dir)?),
            None => None,
        };
        let path_str = full_path.to_string_lossy().to_string();
        let id = self.db.upsert_entry(&path_str, MediaKind::File, parent_id)?;
        let record = self
            .db
            .media_file_by_id(id)?
            .ok_or_else(|| anyhow::anyhow!("media file {} vanished after insert", id))?;
        self.refresh(&record)?;
        if let Some(parent) = self.parent_of(&record)? {
            self.refresh(&parent)?;
        }
        tracing::info!(id, path = %path_str, "media file registered");
        self.db
            .media_file_by_id(id)?
            .ok_or_else(|| anyhow::anyhow!("media file {} vanished after refresh", id))
    }

    /// Drop a file from the index and re-derive its former directory.
    pub fn unregister(&self, id: i64) -> Result<bool> {
        let Some(record) = self.db.media_file_by_id(id)? else {
            return Ok(false);
        };
        let parent = self.parent_of(&record)?;
        let deleted = self.db.delete_by_path(&record.path)?;
        if deleted {
            if let Some(parent) = parent {
                self.refresh(&parent)?;
            }
            tracing::info!(id, path = %record.path, "media file unregistered");
        }
        Ok(deleted)
    }

    fn resolve_path(&self, raw_path: &Path) -> Result<PathBuf> {
        let joined = if raw_path.is_absolute() {
            raw_path.to_path_buf()
        } else {
            self.root.join(raw_path)
        };
        let full_path = joined
            .canonicalize()
            .with_context(|| format!("canonicalize {:?}", joined))?;
        if !full_path.starts_with(&self.root) {
            return Err(anyhow::anyhow!("path outside library root"));
        }
        Ok(full_path)
    }

    fn ensure_directory(&self, dir: &Path) -> Result<i64> {
        let parent_id = if dir == self.root {
            None
        } else {
            match dir.parent() {
                Some(parent) if parent.starts_with(&self.root) => {
                    Some(self.ensure_directory(parent)?)
                }
                _ => None,
            }
        };
        let path_str = dir.to_string_lossy().to_string();
        if let Some(existing) = self.db.media_file_by_path(&path_str)? {
            return Ok(existing.id);
        }
        self.db.upsert_entry(&path_str, MediaKind::Directory, parent_id)
    }

    fn refresh_file(&self, record: &MediaFileRecord) -> Result<()> {
        let path = record.file_path();
        let fs_meta =
            std::fs::metadata(path).with_context(|| format!("stat {:?}", path))?;
        let (meta, format) = match self.codecs.resolve(path)? {
            CodecResolution::Codec(codec) => match codec.read(path) {
                Ok(meta) => (meta, Some(codec.format_name().to_string())),
                Err(err) => {
                    tracing::warn!(error = %err, path = %record.path, "tag read failed, indexing without tags");
                    (MetaData::default(), Some(codec.format_name().to_string()))
                }
            },
            CodecResolution::Unsupported { extension } => {
                let format = (!extension.is_empty()).then(|| extension.to_ascii_uppercase());
                (MetaData::default(), format)
            }
        };
        let stamp = FileStamp::from_fs(format, &fs_meta);
        self.db.update_file_tags(record.id, &meta, &stamp)?;
        Ok(())
    }
}

impl MediaIndex for LibraryIndex {
    fn media_file(&self, id: i64) -> Result<Option<MediaFileRecord>> {
        self.db.media_file_by_id(id)
    }

    fn parent_of(&self, record: &MediaFileRecord) -> Result<Option<MediaFileRecord>> {
        match record.parent_id {
            Some(parent_id) => self.db.media_file_by_id(parent_id),
            None => Ok(None),
        }
    }

    fn refresh(&self, record: &MediaFileRecord) -> Result<()> {
        tracing::debug!(id = record.id, path = %record.path, kind = record.kind.as_str(), "refresh media file");
        match record.kind {
            MediaKind::File => self.refresh_file(record),
            MediaKind::Directory => {
                self.db.update_directory_aggregate(record.id)?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::codec::TagCodec;
    use crate::metadata_db::db_path_for;

    /// Codec that serves tags from a shared map keyed by path.
    struct MapCodec {
        tags: Arc<Mutex<HashMap<PathBuf, MetaData>>>,
    }

    impl TagCodec for MapCodec {
        fn format_name(&self) -> &str {
            "FLAC"
        }

        fn editing_supported(&self) -> bool {
            true
        }

        fn read(&self, path: &Path) -> Result<MetaData> {
            Ok(self
                .tags
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .unwrap_or_default())
        }

        fn write(&self, path: &Path, metadata: &MetaData) -> Result<()> {
            self.tags
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), metadata.clone());
            Ok(())
        }
    }

    struct MapRegistry {
        tags: Arc<Mutex<HashMap<PathBuf, MetaData>>>,
    }

    impl CodecRegistry for MapRegistry {
        fn resolve(&self, path: &Path) -> Result<CodecResolution> {
            if path.extension().and_then(|e| e.to_str()) == Some("txt") {
                return Ok(CodecResolution::Unsupported {
                    extension: "txt".to_string(),
                });
            }
            Ok(CodecResolution::Codec(Box::new(MapCodec {
                tags: self.tags.clone(),
            })))
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        root: PathBuf,
        tags: Arc<Mutex<HashMap<PathBuf, MetaData>>>,
        index: LibraryIndex,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = dir.path().join("music");
        std::fs::create_dir_all(&root).expect("create root");
        let root = root.canonicalize().expect("canonicalize root");
        let db = MetadataDb::new(&db_path_for(dir.path())).expect("open db");
        let tags = Arc::new(Mutex::new(HashMap::new()));
        let registry = Arc::new(MapRegistry { tags: tags.clone() });
        let index = LibraryIndex::new(db, registry, &root).expect("index");
        Fixture {
            dir,
            root,
            tags,
            index,
        }
    }

    fn add_track(fx: &Fixture, rel: &str, meta: MetaData) -> PathBuf {
        let path = fx.root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).expect("create album dir");
        std::fs::write(&path, b"audio").expect("write track");
        fx.tags.lock().unwrap().insert(path.clone(), meta);
        path
    }

    fn heroes(track: u32) -> MetaData {
        MetaData {
            title: Some(format!("Track {track}")),
            artist: Some("Bowie".to_string()),
            album: Some("Heroes".to_string()),
            track_number: Some(track),
            year: Some(1977),
            ..MetaData::default()
        }
    }

    #[test]
    fn register_file_indexes_tags_and_parent_aggregate() {
        let fx = fixture();
        let path = add_track(&fx, "Heroes/01.flac", heroes(1));

        let record = fx.index.register_file(&path).expect("register");

        assert_eq!(record.kind, MediaKind::File);
        assert_eq!(record.title.as_deref(), Some("Track 1"));
        assert_eq!(record.format.as_deref(), Some("FLAC"));
        let parent = fx
            .index
            .parent_of(&record)
            .expect("parent lookup")
            .expect("parent");
        assert_eq!(parent.kind, MediaKind::Directory);
        assert_eq!(parent.album.as_deref(), Some("Heroes"));
        assert_eq!(parent.year, Some(1977));
        assert_eq!(parent.child_count, Some(1));
        assert!(parent.parent_id.is_some(), "album dir hangs off the root dir");
    }

    #[test]
    fn register_file_accepts_paths_relative_to_root() {
        let fx = fixture();
        add_track(&fx, "Heroes/02.flac", heroes(2));
        let record = fx
            .index
            .register_file(Path::new("Heroes/02.flac"))
            .expect("register");
        assert_eq!(record.track_number, Some(2));
    }

    #[test]
    fn register_file_rejects_paths_outside_root() {
        let fx = fixture();
        let outside = fx.dir.path().join("elsewhere.flac");
        std::fs::write(&outside, b"audio").expect("write");
        let err = fx.index.register_file(&outside).unwrap_err();
        assert_eq!(err.to_string(), "path outside library root");
    }

    #[test]
    fn refresh_picks_up_changed_tags() {
        let fx = fixture();
        let path = add_track(&fx, "Heroes/01.flac", heroes(1));
        let record = fx.index.register_file(&path).expect("register");

        fx.tags.lock().unwrap().insert(
            path.clone(),
            MetaData {
                genre: Some("Rock".to_string()),
                ..heroes(1)
            },
        );
        fx.index.refresh(&record).expect("refresh");

        let refreshed = fx
            .index
            .media_file(record.id)
            .expect("lookup")
            .expect("record");
        assert_eq!(refreshed.genre.as_deref(), Some("Rock"));
    }

    #[test]
    fn unsupported_files_are_indexed_without_tags() {
        let fx = fixture();
        let path = fx.root.join("notes.txt");
        std::fs::write(&path, b"hello").expect("write");

        let record = fx.index.register_file(&path).expect("register");

        assert_eq!(record.title, None);
        assert_eq!(record.format.as_deref(), Some("TXT"));
    }

    #[test]
    fn unregister_rederives_parent() {
        let fx = fixture();
        let first = fx
            .index
            .register_file(&add_track(&fx, "Heroes/01.flac", heroes(1)))
            .expect("register first");
        fx.index
            .register_file(&add_track(&fx, "Heroes/02.flac", heroes(2)))
            .expect("register second");

        assert!(fx.index.unregister(first.id).expect("unregister"));
        assert!(!fx.index.unregister(first.id).expect("unregister again"));

        let parent = fx
            .index
            .media_file(first.parent_id.expect("parent id"))
            .expect("lookup")
            .expect("parent");
        assert_eq!(parent.child_count, Some(1));
    }
}
