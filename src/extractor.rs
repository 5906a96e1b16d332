//! Measurement Extractor: drives the extraction units end-to-end.
//!
//! One [`Extractor::parse`] call turns a classified mainfile into a fully
//! populated [`MeasurementDocument`]; [`Extractor::process`] additionally
//! wraps the document in its archive envelope and hands it to the
//! persistence collaborator. Each call is independent: the container handle
//! is opened at the start, all reads happen within its scope, and it is
//! released on every exit path.
//!
//! Error taxonomy (see the per-field notes below):
//!
//! - Missing or malformed required fields (timestamps, protocol structure,
//!   the `measurement_details` descriptive fields) abort with an
//!   [`ExtractionError`]; no partial document is persisted.
//! - Absent optional fields (sample identity, comments, the embedded script)
//!   substitute defaults and log a warning.
//! - Failed numeric coercion is value-preserving and never an error.

use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;

use crate::archive::{archive_filename_for, ArchiveFormat, ArchiveSink, SinkError, UploadContext};
use crate::classifier::Variant;
use crate::coerce::{display_string, string_list, CoerceError};
use crate::container::{Container, ContainerError, GroupNode};
use crate::document::{
    parse_timestamp, ArchiveEntry, DiodeQuantities, MeasurementDocument,
};
use crate::figures::{recreate_figures, Trace};
use crate::fit::{diode_fit, FitError};
use crate::identity::{HttpIdentityService, IdentityError, IdentityLookup, NoIdentityService};
use crate::references::{resolve_instruments, resolve_sample, resolve_user, ReferenceError};
use crate::sanitize::sanitize_richtext;
use crate::settings::{read_settings, SettingsError};

/// Errors that abort extraction of a file.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// A container read failed or a required node is absent.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// A value could not be normalized.
    #[error(transparent)]
    Coerce(#[from] CoerceError),

    /// The instrument settings tree could not be read.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Reference resolution exhausted its fallbacks.
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    /// A required timestamp did not parse as ISO-8601.
    #[error("Invalid timestamp in {field}: {source}")]
    Timestamp {
        /// Name of the offending field.
        field: &'static str,
        /// Underlying parse error.
        source: chrono::ParseError,
    },

    /// The protocol payload could not be parsed as structured data.
    #[error("Malformed protocol payload: {0}")]
    Protocol(#[from] serde_json::Error),

    /// A required field has the wrong shape (e.g. an array where a scalar
    /// string is expected).
    #[error("Field {0} is not a scalar string")]
    Malformed(String),

    /// The diode curve fit failed.
    #[error("Diode fit failed: {0}")]
    Fit(#[from] FitError),

    /// The persistence collaborator rejected the document.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// The mainfile path carries no usable file name.
    #[error("Mainfile path has no file name: {0}")]
    BadPath(String),
}

/// Extraction engine configuration.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Base URL of the user-identity service; `None` disables lookups and
    /// the user chain goes straight to its local-name fallback.
    pub identity_base_url: Option<String>,
    /// Timeout applied to every identity request.
    pub identity_timeout: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            identity_base_url: None,
            identity_timeout: Duration::from_secs(10),
        }
    }
}

/// The extraction engine.
///
/// Holds no mutable state across invocations; one instance may serve any
/// number of `parse` calls on distinct files.
pub struct Extractor {
    identity: Box<dyn IdentityLookup>,
}

impl Extractor {
    /// Build an extractor from configuration.
    pub fn new(config: &ExtractorConfig) -> Result<Self, IdentityError> {
        let identity: Box<dyn IdentityLookup> = match &config.identity_base_url {
            Some(base_url) => Box::new(HttpIdentityService::new(
                base_url.clone(),
                config.identity_timeout,
            )?),
            None => Box::new(NoIdentityService),
        };
        Ok(Self { identity })
    }

    /// Build an extractor with a caller-supplied identity service.
    pub fn with_identity(identity: Box<dyn IdentityLookup>) -> Self {
        Self { identity }
    }

    /// Extract a document from `mainfile`, previously classified as
    /// `variant`.
    ///
    /// This is the testing-mode entry point: the document is returned
    /// directly and nothing is persisted.
    pub fn parse(
        &self,
        mainfile: &Path,
        variant: Variant,
    ) -> Result<MeasurementDocument, ExtractionError> {
        let file_name = mainfile
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| ExtractionError::BadPath(mainfile.display().to_string()))?;
        let name = mainfile
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| ExtractionError::BadPath(mainfile.display().to_string()))?;

        info!("Parsing {} as {variant:?} variant", mainfile.display());

        // Scoped container handle: all reads happen inside this block and
        // the file is released on every exit path when `container` drops.
        let container = Container::open(mainfile)?;
        let root = container.root();
        let entry_key = root
            .keys()?
            .into_iter()
            .next()
            .ok_or_else(|| ContainerError::Missing(String::from("/ (top-level entry)")))?;
        let entry = root.require_group(&entry_key)?;
        let details = entry.require_group("measurement_details")?;

        let datetime = parse_timestamp(&required_text(&details, "start_time")?)
            .map_err(|source| ExtractionError::Timestamp {
                field: "start_time",
                source,
            })?;
        let end_time = parse_timestamp(&required_text(&details, "end_time")?)
            .map_err(|source| ExtractionError::Timestamp {
                field: "end_time",
                source,
            })?;

        let protocol_description =
            sanitize_richtext(&required_text(&details, "protocol_description")?);
        let measurement_description = sanitize_richtext(&required_text(
            &details,
            "measurement_description",
        )?);
        let protocol_overview =
            sanitize_richtext(&required_text(&details, "protocol_overview")?);

        let measurement_comments = match details.dataset("measurement_comments") {
            Some(dataset) => match display_string(dataset.read_raw()?)? {
                Some(comments) => sanitize_richtext(&comments),
                None => String::new(),
            },
            None => String::new(),
        };

        let measurement_tags =
            string_list(details.require_dataset("measurement_tags")?.read_raw()?)?;

        let protocol_name = {
            let plan_name = required_text(&details, "plan_name")?;
            plan_name
                .strip_suffix("_plan")
                .map(str::to_owned)
                .unwrap_or(plan_name)
        };

        let protocol_json: Value =
            serde_json::from_str(&required_text(&details, "protocol_json")?)?;

        let session_name = required_text(&details, "session_name")?;
        debug!("Session name: {session_name}");

        let sample = resolve_sample(&entry);
        let instruments_group = entry.require_group("instruments")?;
        let instruments = resolve_instruments(&instruments_group)?;

        let mut camels_instrument_settings = Map::new();
        for instrument_name in instruments_group.keys()? {
            let settings = instruments_group
                .require_group(&instrument_name)?
                .require_group("settings")?;
            camels_instrument_settings.insert(
                instrument_name,
                Value::Object(read_settings(&settings)?),
            );
        }

        let camels_user = resolve_user(&entry, self.identity.as_ref())?;

        let camels_python_script = match details.dataset("python_script") {
            Some(dataset) => display_string(dataset.read_raw()?)?,
            None => None,
        };
        if camels_python_script.is_none() {
            warn!("No python script found in the CAMELS file");
        }

        // In the hosting application mainfiles live under an upload's `raw/`
        // directory; standalone paths fall back to the bare file name.
        let mainfile_str = mainfile.to_string_lossy();
        let camels_file = mainfile_str
            .split_once("/raw/")
            .map(|(_, rest)| rest.to_owned())
            .unwrap_or_else(|| file_name.clone());
        let hdf5_file = match variant {
            Variant::Default => format!("{camels_file}#/{entry_key}/data"),
            Variant::Diode => format!(
                "CAMELS_data/{}/{file_name}#/{entry_key}/data",
                sample.plain_name
            ),
        };

        let mut figures = recreate_figures(&entry, &protocol_json);
        let mut diode = None;
        if variant == Variant::Diode {
            for figure in &mut figures {
                let (x, y) = match figure.data.first() {
                    Some(trace) => (trace.x.clone(), trace.y.clone()),
                    None => continue,
                };
                let result = diode_fit(&x, &y)?;
                figure
                    .data
                    .push(Trace::dashed_overlay("Fit Line", x, result.fit_line));
                diode = Some(DiodeQuantities {
                    threshold_voltage: result.threshold_voltage,
                    serial_resistance: result.serial_resistance,
                });
            }
        }

        Ok(MeasurementDocument {
            name,
            datetime,
            end_time,
            measurement_description,
            protocol_description,
            protocol_overview,
            measurement_comments,
            measurement_tags,
            protocol_name,
            protocol_json,
            session_name,
            samples: vec![sample.reference],
            instruments,
            camels_instrument_settings,
            camels_user,
            camels_python_script,
            camels_file,
            hdf5_file,
            figures,
            diode,
        })
    }

    /// Extract a document and hand it to the persistence collaborator.
    pub fn process(
        &self,
        mainfile: &Path,
        variant: Variant,
        sink: &dyn ArchiveSink,
        context: &UploadContext,
    ) -> Result<(), ExtractionError> {
        let file_name = mainfile
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| ExtractionError::BadPath(mainfile.display().to_string()))?;

        let document = self.parse(mainfile, variant)?;
        let entry = ArchiveEntry::new(document, context.upload_id.clone());
        let filename = archive_filename_for(&file_name, ArchiveFormat::Json);
        let payload = entry.to_json().map_err(SinkError::from)?;
        sink.create_archive(&payload, context, &filename, ArchiveFormat::Json)?;
        info!("Persisted archive {filename}");
        Ok(())
    }
}

// Read a required scalar string field under `group`.
fn required_text(group: &GroupNode, key: &str) -> Result<String, ExtractionError> {
    let dataset = group.require_dataset(key)?;
    let path = dataset.path().to_owned();
    display_string(dataset.read_raw()?)?.ok_or(ExtractionError::Malformed(path))
}
