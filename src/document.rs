//! The normalized measurement document and its archive envelope.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::figures::Figure;
use crate::references::Reference;

/// The ordered record assembled per parsed file.
///
/// Created fresh per parse call, fully populated in one pass, then handed to
/// the persistence collaborator (or returned directly in testing mode) and
/// discarded; never mutated after handoff.
#[derive(Debug, Clone, Serialize)]
pub struct MeasurementDocument {
    /// Document name, derived from the mainfile name without its extension.
    pub name: String,
    /// Measurement start time.
    #[serde(serialize_with = "rfc3339")]
    pub datetime: DateTime<Utc>,
    /// Measurement end time.
    #[serde(serialize_with = "rfc3339")]
    pub end_time: DateTime<Utc>,
    /// Rich-text description of the measurement.
    pub measurement_description: String,
    /// Rich-text description of the executed protocol.
    pub protocol_description: String,
    /// Rich-text step-by-step protocol overview.
    pub protocol_overview: String,
    /// Rich-text live comments; empty when the file carries none.
    pub measurement_comments: String,
    /// Free-form measurement tags; may be empty, never null.
    pub measurement_tags: Vec<String>,
    /// Protocol name, with the generated `_plan` suffix stripped.
    pub protocol_name: String,
    /// The full protocol structure, opaque to the engine.
    pub protocol_json: Value,
    /// Session the measurement belongs to.
    pub session_name: String,
    /// Resolved sample reference (always exactly one, possibly name-only).
    pub samples: Vec<Reference>,
    /// Resolved references for every instrument used.
    pub instruments: Vec<Reference>,
    /// Nested instrument settings, keyed by instrument name.
    pub camels_instrument_settings: Map<String, Value>,
    /// Display name of the measuring user.
    pub camels_user: String,
    /// The generated measurement script, when embedded in the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camels_python_script: Option<String>,
    /// Upload-relative path of the raw measurement file.
    pub camels_file: String,
    /// Content reference into the measurement file's data section.
    pub hdf5_file: String,
    /// Recreated plot artifacts.
    pub figures: Vec<Figure>,
    /// Fit-derived quantities, present on diode-variant documents only.
    #[serde(flatten)]
    pub diode: Option<DiodeQuantities>,
}

/// Quantities derived from the diode variant's curve fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiodeQuantities {
    /// X-intercept of the fitted line: the diode's threshold voltage.
    pub threshold_voltage: f64,
    /// Reciprocal slope of the fitted line: the serial resistance.
    pub serial_resistance: f64,
}

/// Entry metadata carried alongside the document in the archive envelope.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntryMetadata {
    /// Identifier of the upload the document belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
}

/// The envelope handed to the persistence collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveEntry {
    /// The extracted document.
    pub data: MeasurementDocument,
    /// Entry metadata.
    pub metadata: EntryMetadata,
}

impl ArchiveEntry {
    /// Wrap a document for persistence under the given upload.
    pub fn new(data: MeasurementDocument, upload_id: Option<String>) -> Self {
        Self {
            data,
            metadata: EntryMetadata { upload_id },
        }
    }

    /// Serialize the envelope to a JSON value.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

// Archives carry the `+00:00` offset spelling, not chrono's default `Z`.
fn rfc3339<S: Serializer>(datetime: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&datetime.to_rfc3339())
}

/// Parse a container timestamp.
///
/// Timestamps must be ISO-8601; offset-bearing values are normalized to UTC
/// and naive values are taken as already-UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(datetime) => Ok(datetime.with_timezone(&Utc)),
        Err(_) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| Utc.from_utc_datetime(&naive)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_timestamp_parses_to_utc() {
        let parsed = parse_timestamp("2025-03-04T17:14:44.175182+00:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-03-04T17:14:44.175182+00:00");
    }

    #[test]
    fn naive_timestamp_is_taken_as_utc() {
        let parsed = parse_timestamp("2025-03-04T17:14:44").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-03-04T17:14:44+00:00");
    }

    #[test]
    fn malformed_timestamp_is_an_error() {
        assert!(parse_timestamp("yesterday at noon").is_err());
    }
}
