use std::path::Path;

use anyhow::{Context, Result};

use crate::codec::TagCodec;
use crate::models::MetaData;
use crate::normalize::NormalizedFields;

/// Overlay the editable fields onto the file's current tags and commit them.
///
/// Absent values clear their field. Anything not editable (album artist,
/// disc number, art, comments) is carried over from the file as-is.
/// Returns the record that was written.
pub fn write_track_tags(
    path: &Path,
    codec: &dyn TagCodec,
    fields: &NormalizedFields,
) -> Result<MetaData> {
    let base = codec
        .read(path)
        .with_context(|| format!("read {} tags", codec.format_name()))?;
    let merged = merge_fields(base, fields);
    codec
        .write(path, &merged)
        .with_context(|| format!("write {} tags", codec.format_name()))?;
    Ok(merged)
}

fn merge_fields(base: MetaData, fields: &NormalizedFields) -> MetaData {
    MetaData {
        title: fields.title.clone(),
        artist: fields.artist.clone(),
        album: fields.album.clone(),
        track_number: fields.track_number,
        year: fields.year,
        genre: fields.genre.clone(),
        ..base
    }
}
