//! Object keys for confirmed uploads.
//!
//! A key encodes the upload time and the participant's metadata:
//! `YYYYMMDD_HHMMSS_<zone>_<length>mm_<treatment>.jpg`. Underscores are the
//! field separator, so they are replaced by `-` inside field values, as are
//! spaces.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Metadata a participant submits alongside a photo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    /// Body zone the photo shows.
    pub zone: String,
    /// Measured length in millimetres, as entered.
    pub length_mm: String,
    /// Free-text treatment description.
    pub treatment: String,
}

/// Metadata recovered from an object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    /// Upload time, when the key starts with a well-formed timestamp.
    pub uploaded_at: Option<NaiveDateTime>,
    /// Zone, length and treatment fields.
    pub metadata: UploadMetadata,
}

fn sanitize(field: &str) -> String {
    field.trim().replace([' ', '_', '/'], "-")
}

/// Build the object key for an upload confirmed at `timestamp`.
pub fn upload_key(timestamp: DateTime<Utc>, metadata: &UploadMetadata) -> String {
    format!(
        "{}_{}_{}mm_{}.jpg",
        timestamp.format(TIMESTAMP_FORMAT),
        sanitize(&metadata.zone),
        sanitize(&metadata.length_mm),
        sanitize(&metadata.treatment),
    )
}

/// Split an object key back into its upload time and metadata.
///
/// Never fails: fields missing from keys written by other tools come back
/// empty and an unparseable timestamp becomes `None`.
pub fn parse_upload_key(key: &str) -> ParsedKey {
    let stem = key.rsplit_once('.').map_or(key, |(stem, _ext)| stem);
    let mut parts = stem.splitn(5, '_');
    let date = parts.next().unwrap_or_default();
    let time = parts.next().unwrap_or_default();
    let zone = parts.next().unwrap_or_default();
    let length = parts.next().unwrap_or_default();
    let treatment = parts.next().unwrap_or_default();

    let uploaded_at =
        NaiveDateTime::parse_from_str(&format!("{date}_{time}"), TIMESTAMP_FORMAT).ok();

    ParsedKey {
        uploaded_at,
        metadata: UploadMetadata {
            zone: zone.to_string(),
            length_mm: length.strip_suffix("mm").unwrap_or(length).to_string(),
            treatment: treatment.to_string(),
        },
    }
}
