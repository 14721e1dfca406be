//! Format-specific tag codecs and the registry that selects them.
//!
//! The registry sniffs the container format from file content, so a
//! mislabelled extension still resolves to the right codec.

use std::borrow::Cow;
use std::path::Path;

use anyhow::{Context, Result};
use lofty::{read_from_path, Accessor, AudioFile, FileType, ItemKey, Probe, Tag, TaggedFileExt};

use crate::models::MetaData;

/// Read/write capability for one container format.
pub trait TagCodec: Send + Sync {
    /// Short format label, e.g. `FLAC`.
    fn format_name(&self) -> &str;
    /// Whether tags of this format may be edited.
    fn editing_supported(&self) -> bool;
    /// Read the file's current tag values.
    fn read(&self, path: &Path) -> Result<MetaData>;
    /// Commit tag values to the file. Either the whole record lands or the
    /// file keeps its previous bytes.
    fn write(&self, path: &Path, metadata: &MetaData) -> Result<()>;
}

/// Result of looking up a codec for a file.
pub enum CodecResolution {
    Codec(Box<dyn TagCodec>),
    /// No codec recognises the content. Carries the path's extension.
    Unsupported { extension: String },
}

impl std::fmt::Debug for CodecResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecResolution::Codec(codec) => f
                .debug_tuple("Codec")
                .field(&codec.format_name())
                .finish(),
            CodecResolution::Unsupported { extension } => f
                .debug_struct("Unsupported")
                .field("extension", extension)
                .finish(),
        }
    }
}

/// Maps files to codecs. Resolution never modifies the file.
pub trait CodecRegistry: Send + Sync {
    fn resolve(&self, path: &Path) -> Result<CodecResolution>;
}

/// Codec registry backed by `lofty`.
#[derive(Clone, Debug)]
pub struct LoftyCodecRegistry {
    read_only: Vec<FileType>,
}

impl Default for LoftyCodecRegistry {
    fn default() -> Self {
        Self {
            read_only: vec![FileType::Aac, FileType::Mpc],
        }
    }
}

impl LoftyCodecRegistry {
    /// Default registry plus extra read-only formats named by extension.
    ///
    /// Unknown extensions are logged and ignored.
    pub fn with_read_only<S: AsRef<str>>(extensions: &[S]) -> Self {
        let mut registry = Self::default();
        for ext in extensions {
            let ext = ext.as_ref().trim().to_ascii_lowercase();
            match FileType::from_ext(&ext) {
                Some(file_type) => {
                    if !registry.read_only.contains(&file_type) {
                        registry.read_only.push(file_type);
                    }
                }
                None => tracing::warn!(extension = %ext, "unknown read-only format ignored"),
            }
        }
        registry
    }

    pub fn is_editable(&self, file_type: FileType) -> bool {
        !matches!(file_type, FileType::Custom(_)) && !self.read_only.contains(&file_type)
    }
}

impl CodecRegistry for LoftyCodecRegistry {
    fn resolve(&self, path: &Path) -> Result<CodecResolution> {
        let probe = Probe::open(path)
            .with_context(|| format!("open {:?}", path))?
            .guess_file_type()
            .with_context(|| format!("probe file type {:?}", path))?;
        let Some(file_type) = probe.file_type() else {
            return Ok(CodecResolution::Unsupported {
                extension: extension_of(path),
            });
        };
        Ok(CodecResolution::Codec(Box::new(LoftyCodec::new(
            file_type,
            self.is_editable(file_type),
        ))))
    }
}

/// Tag codec for one `lofty` file type.
#[derive(Clone, Debug)]
pub struct LoftyCodec {
    file_type: FileType,
    editable: bool,
}

impl LoftyCodec {
    pub fn new(file_type: FileType, editable: bool) -> Self {
        Self { file_type, editable }
    }
}

impl TagCodec for LoftyCodec {
    fn format_name(&self) -> &str {
        format_label(self.file_type)
    }

    fn editing_supported(&self) -> bool {
        self.editable
    }

    fn read(&self, path: &Path) -> Result<MetaData> {
        let tagged_file = read_from_path(path).context("read tags")?;
        let tag = tagged_file
            .tag(tagged_file.primary_tag_type())
            .or_else(|| tagged_file.first_tag());
        Ok(tag.map(metadata_from_tag).unwrap_or_default())
    }

    fn write(&self, path: &Path, metadata: &MetaData) -> Result<()> {
        if !self.editable {
            return Err(anyhow::anyhow!(
                "tag editing of {} files is not supported",
                self.format_name()
            ));
        }
        let mut tagged_file = read_from_path(path).context("read tags")?;
        let mut tag_type = tagged_file.primary_tag_type();
        if tagged_file.tag(tag_type).is_none() {
            if let Some(tag) = tagged_file.first_tag() {
                tag_type = tag.tag_type();
            }
        }
        {
            let tag = match tagged_file.tag_mut(tag_type) {
                Some(tag) => tag,
                None => {
                    tagged_file.insert_tag(Tag::new(tag_type));
                    tagged_file
                        .tag_mut(tag_type)
                        .context("create tag container")?
                }
            };
            apply_metadata(tag, metadata);
        }

        commit_staged(path, |staged| {
            tagged_file.save_to_path(staged).context("write tags")
        })
    }
}

/// Copy `path` to a staging file beside it, let `save` edit the copy, then
/// rename the copy over the original. On any error the original is untouched
/// and the staging file is removed.
fn commit_staged(path: &Path, save: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("file has no parent directory: {:?}", path))?;
    let staged = tempfile::Builder::new()
        .prefix(".tag-edit-")
        .tempfile_in(dir)
        .context("create staging file")?;
    std::fs::copy(path, staged.path()).context("stage file")?;
    save(staged.path())?;
    staged.persist(path).context("replace file")?;
    Ok(())
}

fn metadata_from_tag(tag: &Tag) -> MetaData {
    MetaData {
        title: text(tag.title()),
        artist: text(tag.artist()),
        album_artist: text(tag.get_string(&ItemKey::AlbumArtist).map(Cow::Borrowed)),
        album: text(tag.album()),
        track_number: tag.track(),
        disc_number: tag.disk(),
        year: tag
            .year()
            .and_then(|year| i32::try_from(year).ok())
            .or_else(|| {
                tag.get_string(&ItemKey::RecordingDate)
                    .and_then(parse_i32_tag)
            }),
        genre: text(tag.genre()),
    }
}

fn apply_metadata(tag: &mut Tag, metadata: &MetaData) {
    match metadata.title.as_deref() {
        Some(value) => tag.set_title(value.to_string()),
        None => tag.remove_title(),
    }
    match metadata.artist.as_deref() {
        Some(value) => tag.set_artist(value.to_string()),
        None => tag.remove_artist(),
    }
    match metadata.album.as_deref() {
        Some(value) => tag.set_album(value.to_string()),
        None => tag.remove_album(),
    }
    match metadata.genre.as_deref() {
        Some(value) => tag.set_genre(value.to_string()),
        None => tag.remove_genre(),
    }
    match metadata.track_number {
        Some(value) => tag.set_track(value),
        None => tag.remove_track(),
    }
    match metadata.year.and_then(|year| u32::try_from(year).ok()) {
        Some(value) => tag.set_year(value),
        None => {
            tag.remove_year();
            tag.remove_key(&ItemKey::RecordingDate);
        }
    }

    // Not user-editable: only touched when the caller hands back a different
    // value than the tag holds, so totals and raw formatting survive.
    let current = metadata_from_tag(tag);
    if current.album_artist != metadata.album_artist {
        match metadata.album_artist.as_deref() {
            Some(value) => {
                tag.insert_text(ItemKey::AlbumArtist, value.to_string());
            }
            None => tag.remove_key(&ItemKey::AlbumArtist),
        }
    }
    if current.disc_number != metadata.disc_number {
        match metadata.disc_number {
            Some(value) => tag.set_disk(value),
            None => tag.remove_disk(),
        }
    }
}

/// Tag text as stored, so the index reflects the file byte for byte.
/// Only an empty item counts as absent.
fn text(value: Option<Cow<'_, str>>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(Cow::into_owned)
}

fn parse_i32_tag(raw: &str) -> Option<i32> {
    raw.split('-')
        .next()
        .and_then(|s| s.trim().parse::<i32>().ok())
}

/// Raw extension of a path, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_string()
}

/// Display label stored in the index for a detected format.
pub fn format_label(file_type: FileType) -> &'static str {
    match file_type {
        FileType::Aac => "AAC",
        FileType::Aiff => "AIFF",
        FileType::Ape => "APE",
        FileType::Flac => "FLAC",
        FileType::Mpeg => "MP3",
        FileType::Mp4 => "MP4",
        FileType::Mpc => "MPC",
        FileType::Opus => "OPUS",
        FileType::Vorbis => "OGG",
        FileType::Speex => "SPX",
        FileType::Wav => "WAV",
        FileType::WavPack => "WV",
        FileType::Custom(name) => name,
        _ => "UNKNOWN",
    }
}

/// Smallest valid PCM WAV: header plus one silent 16-bit mono sample.
#[cfg(test)]
pub(crate) fn minimal_wav() -> Vec<u8> {
    let data_size: u32 = 2;
    let mut wav = Vec::new();
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_size).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&44100u32.to_le_bytes());
    wav.extend_from_slice(&88200u32.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    wav.extend_from_slice(&[0u8; 2]);
    wav
}
