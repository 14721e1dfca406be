//! Tag edit orchestration.
//!
//! Sequences normalize, codec resolution, change detection, write and index
//! refresh for one media file, and folds every failure into a
//! [`TagEditOutcome`].

use std::sync::Arc;

use anyhow::Result;

use crate::change::detect_changes;
use crate::codec::{CodecRegistry, CodecResolution};
use crate::media_index::MediaIndex;
use crate::models::TagEditRequest;
use crate::normalize::NormalizedFields;
use crate::refresh::refresh_after_write;
use crate::tag_writer::write_track_tags;

/// Result of one tag edit.
///
/// `Display` renders the wire string callers parse: `UPDATED`, `SKIPPED`,
/// or a human-readable failure message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagEditOutcome {
    /// Tags were written and the index refreshed.
    Updated,
    /// Nothing differed from the indexed values; the file was not touched.
    Skipped,
    /// The file's format does not allow tag editing.
    Unsupported { extension: String },
    /// Lookup, write or refresh failed.
    Failed { message: String },
}

impl std::fmt::Display for TagEditOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagEditOutcome::Updated => f.write_str("UPDATED"),
            TagEditOutcome::Skipped => f.write_str("SKIPPED"),
            TagEditOutcome::Unsupported { extension } => {
                write!(f, "Tag editing of {} files is not supported.", extension)
            }
            TagEditOutcome::Failed { message } => f.write_str(message),
        }
    }
}

#[derive(Clone)]
pub struct TagService {
    index: Arc<dyn MediaIndex>,
    codecs: Arc<dyn CodecRegistry>,
}

impl TagService {
    pub fn new(index: Arc<dyn MediaIndex>, codecs: Arc<dyn CodecRegistry>) -> Self {
        Self { index, codecs }
    }

    /// Apply a tag edit request. Never fails; errors become
    /// [`TagEditOutcome::Failed`] and are logged with the file id.
    pub fn set_tags(&self, request: &TagEditRequest) -> TagEditOutcome {
        let fields = NormalizedFields::from_request(request);
        match self.apply(request.id, &fields) {
            Ok(outcome) => outcome,
            Err(err) => {
                let message = format!("{:#}", err);
                tracing::warn!(id = request.id, error = %message, "failed to update tags");
                TagEditOutcome::Failed { message }
            }
        }
    }

    fn apply(&self, id: i64, fields: &NormalizedFields) -> Result<TagEditOutcome> {
        let file = self
            .index
            .media_file(id)?
            .ok_or_else(|| anyhow::anyhow!("media file {} not found", id))?;

        let codec = match self.codecs.resolve(file.file_path())? {
            CodecResolution::Codec(codec) if codec.editing_supported() => codec,
            CodecResolution::Codec(codec) => {
                tracing::info!(id, path = %file.path, format = codec.format_name(), "tag editing not supported");
                return Ok(TagEditOutcome::Unsupported {
                    extension: file.extension().to_string(),
                });
            }
            CodecResolution::Unsupported { extension } => {
                tracing::info!(id, path = %file.path, "no tag codec for file");
                return Ok(TagEditOutcome::Unsupported { extension });
            }
        };

        let changes = detect_changes(fields, &file);
        if changes.is_empty() {
            tracing::debug!(id, path = %file.path, "tags unchanged, skipping write");
            return Ok(TagEditOutcome::Skipped);
        }

        let parent = self.index.parent_of(&file)?;
        write_track_tags(file.file_path(), codec.as_ref(), fields)?;
        tracing::info!(id, path = %file.path, changed = %changes.describe(), "tags written");

        if let Err(err) = refresh_after_write(self.index.as_ref(), &file, parent.as_ref()) {
            tracing::warn!(id, path = %file.path, error = %err, "tags written but index refresh failed");
            return Err(err);
        }
        Ok(TagEditOutcome::Updated)
    }
}
