//! File-Classifier: mainfile detection and variant routing.
//!
//! Given a candidate file, the classifier decides whether it is a supported
//! CAMELS measurement container at all, and if so which of the two document
//! variants it carries. The routing is mutually exclusive and exhaustive over
//! accepted files: every match is exactly one of [`Variant::Default`] or
//! [`Variant::Diode`].
//!
//! Algorithm:
//!
//! 1. The host's generic filename/MIME gate runs first; a miss short-circuits
//!    to [`Classification::NotAMatch`].
//! 2. A missing top-level `file_type` attribute routes legacy files (any
//!    top-level key containing `CAMELS_`) to the default variant; anything
//!    else is rejected.
//! 3. `file_type == "NOMAD CAMELS"` locates the `CAMELS_` entry group and
//!    reads its tag list; the simultaneous presence of the `diode` and `demo`
//!    tags routes to the diode variant, otherwise to the default variant.
//! 4. Any other `file_type` value rejects.
//!
//! Rejection is a normal negative result consumed by the host's
//! file-discovery loop, never an error; unreadable candidates are likewise
//! rejected with a warning.

use log::{debug, warn};
use regex::Regex;
use std::path::Path;

use crate::coerce::{string_list, CoerceError};
use crate::container::{Container, ContainerError};

/// Top-level attribute naming the producing tool.
pub const FILE_TYPE_ATTR: &str = "file_type";
/// Expected marker value of [`FILE_TYPE_ATTR`].
pub const FILE_TYPE_CAMELS: &str = "NOMAD CAMELS";
/// Substring marking the CAMELS entry key (and legacy files).
pub const ENTRY_KEY_MARKER: &str = "CAMELS_";
/// Tag marking diode measurements.
pub const DIODE_TAG: &str = "diode";
/// Tag marking demo measurements; both tags together select the diode variant.
pub const DEMO_TAG: &str = "demo";

/// The two supported measurement document shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// The general CAMELS measurement document.
    Default,
    /// The specialized diode demo document with fit-derived quantities.
    Diode,
}

/// Outcome of classifying a candidate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Not a supported CAMELS file; a normal negative result.
    NotAMatch,
    /// A supported file routed to exactly one variant.
    Match(Variant),
}

/// The host's generic filename/MIME gate.
#[derive(Debug, Clone)]
pub struct MatchRules {
    name: Regex,
    mime: Regex,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            name: Regex::new(r"^.*\.(h5|hdf5|nxs)$").expect("mainfile name pattern is valid"),
            mime: Regex::new("(application/x-hdf)").expect("mainfile mime pattern is valid"),
        }
    }
}

impl MatchRules {
    /// Does the candidate pass the filename/MIME gate?
    ///
    /// When the host supplies no MIME type, the filename alone decides.
    pub fn accepts(&self, file_name: &str, mime: Option<&str>) -> bool {
        if !self.name.is_match(file_name) {
            return false;
        }
        mime.map_or(true, |mime| self.mime.is_match(mime))
    }
}

/// Classify a candidate file into a variant, or reject it.
pub fn classify(path: &Path, mime: Option<&str>, rules: &MatchRules) -> Classification {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !rules.accepts(&file_name, mime) {
        return Classification::NotAMatch;
    }

    match classify_container(path) {
        Ok(classification) => classification,
        Err(error) => {
            warn!("Error while checking file type of {}: {error}", path.display());
            Classification::NotAMatch
        }
    }
}

/// Does the candidate route to exactly `variant`?
///
/// Sibling classifiers built from this predicate are mutually exclusive: a
/// file matched by one variant's classifier is rejected by the other's.
pub fn matches_variant(path: &Path, mime: Option<&str>, rules: &MatchRules, variant: Variant) -> bool {
    classify(path, mime, rules) == Classification::Match(variant)
}

#[derive(Debug, thiserror::Error)]
enum ProbeError {
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Coerce(#[from] CoerceError),
}

fn classify_container(path: &Path) -> Result<Classification, ProbeError> {
    let container = Container::open(path)?;
    let root = container.root();

    let Some(file_type) = container.attr_str(FILE_TYPE_ATTR)? else {
        debug!("No {FILE_TYPE_ATTR} attribute found in {}", path.display());
        let legacy = root.keys()?.iter().any(|key| key.contains(ENTRY_KEY_MARKER));
        return Ok(if legacy {
            debug!("{} is an older CAMELS file", path.display());
            Classification::Match(Variant::Default)
        } else {
            Classification::NotAMatch
        });
    };

    if file_type != FILE_TYPE_CAMELS {
        debug!(
            "{} has file_type {file_type:?}, not {FILE_TYPE_CAMELS:?}",
            path.display()
        );
        return Ok(Classification::NotAMatch);
    }

    let keys = root.keys()?;
    let Some(entry_key) = keys.iter().find(|key| key.contains(ENTRY_KEY_MARKER)) else {
        warn!(
            "{} declares {FILE_TYPE_CAMELS:?} but has no {ENTRY_KEY_MARKER} entry",
            path.display()
        );
        return Ok(Classification::NotAMatch);
    };

    let tags_dataset = root
        .require_group(entry_key)?
        .require_group("measurement_details")?
        .require_dataset("measurement_tags")?;
    let tags = string_list(tags_dataset.read_raw()?)?;

    let diode = tags.iter().any(|tag| tag == DIODE_TAG) && tags.iter().any(|tag| tag == DEMO_TAG);
    Ok(Classification::Match(if diode {
        Variant::Diode
    } else {
        Variant::Default
    }))
}
