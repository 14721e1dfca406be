//! Records shared between the orchestrator, codecs and the media index.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// A user-submitted tag edit for one media file.
///
/// All tag fields are raw text exactly as submitted.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TagEditRequest {
    /// Media file id in the index.
    pub id: i64,
    #[serde(default)]
    pub track: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
}

/// Kind of an indexed entry.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// A single audio file.
    File,
    /// A container (album directory) whose fields derive from its children.
    Directory,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::File => "file",
            MediaKind::Directory => "directory",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "file" => Some(MediaKind::File),
            "directory" => Some(MediaKind::Directory),
            _ => None,
        }
    }
}

/// Indexed representation of a media file or container.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MediaFileRecord {
    pub id: i64,
    /// Absolute path on disk.
    pub path: String,
    /// Id of the containing directory, if indexed.
    pub parent_id: Option<i64>,
    pub kind: MediaKind,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
    pub year: Option<i32>,
    pub genre: Option<String>,
    /// Detected container format (for example `FLAC`).
    pub format: Option<String>,
    /// Number of indexed children (directories only).
    pub child_count: Option<i64>,
}

impl MediaFileRecord {
    pub fn file_path(&self) -> &Path {
        Path::new(&self.path)
    }

    /// File extension as it appears in the path, or an empty string.
    pub fn extension(&self) -> &str {
        self.file_path()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
    }
}

/// In-file tag values as read and written by a codec.
///
/// Only holds what this service reads or edits; everything else in the
/// file's tag stays untouched on write.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetaData {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
    pub year: Option<i32>,
    pub genre: Option<String>,
}
