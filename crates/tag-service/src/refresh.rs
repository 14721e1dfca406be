use anyhow::{Context, Result};

use crate::media_index::MediaIndex;
use crate::models::MediaFileRecord;

/// Refresh a written file, then the container whose aggregate depends on it.
///
/// `parent` must be captured before the write. Child first, then parent.
pub fn refresh_after_write(
    index: &dyn MediaIndex,
    file: &MediaFileRecord,
    parent: Option<&MediaFileRecord>,
) -> Result<()> {
    index
        .refresh(file)
        .with_context(|| format!("refresh media file {}", file.id))?;
    match parent {
        Some(parent) => index
            .refresh(parent)
            .with_context(|| format!("refresh parent {}", parent.id)),
        None => {
            tracing::debug!(id = file.id, "media file has no parent to refresh");
            Ok(())
        }
    }
}
