//! Decides whether an edit differs from what the index already holds.

use crate::models::MediaFileRecord;
use crate::normalize::NormalizedFields;

/// One of the six user-editable tag fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagField {
    Track,
    Artist,
    Album,
    Title,
    Year,
    Genre,
}

impl TagField {
    pub fn as_str(self) -> &'static str {
        match self {
            TagField::Track => "track",
            TagField::Artist => "artist",
            TagField::Album => "album",
            TagField::Title => "title",
            TagField::Year => "year",
            TagField::Genre => "genre",
        }
    }
}

/// Fields whose requested value differs from the indexed value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldChanges {
    fields: Vec<TagField>,
}

impl FieldChanges {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Comma separated field names, for log lines.
    pub fn describe(&self) -> String {
        self.fields
            .iter()
            .map(|field| field.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Compare every editable field; `None` only equals `None`.
///
/// All six fields are always compared so the result lists every difference.
pub fn detect_changes(fields: &NormalizedFields, record: &MediaFileRecord) -> FieldChanges {
    let mut changed = Vec::new();
    if fields.track_number != record.track_number {
        changed.push(TagField::Track);
    }
    if fields.artist != record.artist {
        changed.push(TagField::Artist);
    }
    if fields.album != record.album {
        changed.push(TagField::Album);
    }
    if fields.title != record.title {
        changed.push(TagField::Title);
    }
    if fields.year != record.year {
        changed.push(TagField::Year);
    }
    if fields.genre != record.genre {
        changed.push(TagField::Genre);
    }
    FieldChanges { fields: changed }
}
