//! Tag editing for indexed media files.
//!
//! [`TagService::set_tags`] takes a raw edit request, normalizes it, writes
//! only when something differs from the index, and re-derives the index
//! entries for the file and its album directory afterwards.

pub mod change;
pub mod codec;
pub mod media_index;
pub mod metadata_db;
pub mod models;
pub mod normalize;
pub mod refresh;
pub mod tag_service;
pub mod tag_writer;

pub use codec::{CodecRegistry, CodecResolution, LoftyCodecRegistry, TagCodec};
pub use media_index::{LibraryIndex, MediaIndex};
pub use metadata_db::MetadataDb;
pub use models::{MediaFileRecord, MediaKind, MetaData, TagEditRequest};
pub use tag_service::{TagEditOutcome, TagService};
