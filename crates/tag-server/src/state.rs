//! Shared application state.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tag_service::{CodecRegistry, LibraryIndex, LoftyCodecRegistry, MetadataDb, TagService};

pub struct AppState {
    /// Tag edit pipeline over the library index.
    pub tags: TagService,
    /// Library index used for lookups and registration.
    pub library: LibraryIndex,
}

impl AppState {
    pub fn new(tags: TagService, library: LibraryIndex) -> Self {
        Self { tags, library }
    }

    /// Open the metadata DB and wire the index and tag service to one codec registry.
    pub fn open(media_dir: &Path, db_path: &Path, read_only_formats: &[String]) -> Result<Self> {
        let codecs: Arc<dyn CodecRegistry> =
            Arc::new(LoftyCodecRegistry::with_read_only(read_only_formats));
        let db = MetadataDb::new(db_path).context("open metadata db")?;
        let library = LibraryIndex::new(db, codecs.clone(), media_dir)?;
        let tags = TagService::new(Arc::new(library.clone()), codecs);
        Ok(Self::new(tags, library))
    }
}
