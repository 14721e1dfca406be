//! Input normalization for tag edit requests.
//!
//! Raw request fields arrive as free text; this turns them into typed,
//! optional values. Blank means "no value", never an empty string.

use crate::models::TagEditRequest;

/// Typed projection of a [`TagEditRequest`].
///
/// `None` is an explicit "no value": writing it clears the field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedFields {
    pub track_number: Option<u32>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
}

impl NormalizedFields {
    /// Normalize all six raw fields of a request.
    ///
    /// Malformed numbers degrade to `None` and are logged; this never fails.
    pub fn from_request(request: &TagEditRequest) -> Self {
        let track = trim_to_none(request.track.as_deref());
        let year = trim_to_none(request.year.as_deref());
        Self {
            track_number: track.and_then(|raw| parse_lenient(raw, "track number")),
            artist: trim_to_none(request.artist.as_deref()).map(str::to_string),
            album: trim_to_none(request.album.as_deref()).map(str::to_string),
            title: trim_to_none(request.title.as_deref()).map(str::to_string),
            year: year.and_then(parse_year),
            genre: trim_to_none(request.genre.as_deref()).map(str::to_string),
        }
    }
}

/// Trim surrounding whitespace; empty results become `None`.
pub fn trim_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Tag years are unsigned; a negative year cannot be stored and is dropped.
fn parse_year(raw: &str) -> Option<i32> {
    let year = parse_lenient::<i32>(raw, "year")?;
    if year < 0 {
        tracing::warn!(value = %raw, "illegal year, treating as blank");
        return None;
    }
    Some(year)
}

fn parse_lenient<T: std::str::FromStr>(raw: &str, label: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(value = %raw, error = %err, "illegal {label}, treating as blank");
            None
        }
    }
}
