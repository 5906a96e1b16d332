//! Reference Resolver: sample, instrument, and user identity resolution.
//!
//! Raw identifier strings found in the container are resolved into
//! [`Reference`] values through ordered fallback chains. Resolution is
//! best-effort by design: a missing identity substructure degrades to a
//! name-only reference with a logged warning and never aborts extraction.
//! The one exception is the user chain, where even the plain-name fallback
//! is part of the extraction contract.

use log::warn;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use crate::coerce::display_string;
use crate::container::{ContainerError, GroupNode};
use crate::identity::IdentityLookup;

/// A resolved (name, optional pointer) identity pair.
///
/// Name-only is a valid terminal state; the pointer is populated only when a
/// fully-qualified external identifier could be parsed out of the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Display name of the referenced entity.
    pub name: String,
    /// URL-shaped pointer into the external archive, when resolvable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Reference {
    /// A name-only reference.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: None,
        }
    }

    /// A fully resolved reference with an archive pointer.
    pub fn resolved(name: impl Into<String>, pointer: String) -> Self {
        Self {
            name: name.into(),
            reference: Some(pointer),
        }
    }
}

/// Sample resolution result: the reference plus the plain sample name, which
/// the diode variant reuses for its file-content path.
#[derive(Debug, Clone)]
pub struct SampleResolution {
    /// The reference to attach to the document.
    pub reference: Reference,
    /// The sample's plain name, without any `ID:` suffix; empty if absent.
    pub plain_name: String,
}

/// Errors raised by reference resolution.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    /// A container read failed while enumerating instruments.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// The user chain exhausted all fallbacks.
    #[error("Container has no user name to fall back to at {0}")]
    MissingUserName(String),
}

fn locator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"upload/id/([^/]+)/entry/id/([^/]+)").expect("locator pattern is valid")
    })
}

/// Parse the two-part locator out of a fully-qualified external identifier.
pub fn parse_locator(full_identifier: &str) -> Option<(String, String)> {
    locator_pattern()
        .captures(full_identifier)
        .map(|caps| (caps[1].to_owned(), caps[2].to_owned()))
}

/// Build the archive pointer for a parsed locator.
pub fn archive_pointer(upload_id: &str, entry_id: &str) -> String {
    format!("../uploads/{upload_id}/archive/{entry_id}#/data")
}

// Best-effort dataset read as a display string. Anything unexpected (absent
// key, wrong node kind, undecodable bytes, array-shaped value) reads as None.
fn read_display(group: &GroupNode, key: &str) -> Option<String> {
    let dataset = group.dataset(key)?;
    match dataset.read_raw().map(display_string) {
        Ok(Ok(value)) => value,
        _ => None,
    }
}

/// Resolve the measurement's sample reference.
///
/// Fallback order:
/// 1. `sample/identifier/full_identifier` parses into a locator -> fully
///    resolved reference.
/// 2. `sample/sample_id` + `sample/name` -> composite `"{name} ID:{id}"`
///    label, or name-only when the id is empty.
/// 3. Name-only, with an empty name if even `sample/name` is missing.
///
/// Every fallback step logs a warning; resolution never fails.
pub fn resolve_sample(entry: &GroupNode) -> SampleResolution {
    let sample = entry.group("sample");

    let mut plain_name = sample
        .as_ref()
        .and_then(|sample| read_display(sample, "name"))
        .unwrap_or_default();
    if plain_name.is_empty() {
        warn!("No sample name found in the CAMELS file");
    }

    if let Some(sample) = sample {
        let full_identifier = sample
            .group("identifier")
            .and_then(|identifier| read_display(&identifier, "full_identifier"));
        if let Some(full_identifier) = full_identifier {
            if let Some((upload_id, entry_id)) = parse_locator(&full_identifier) {
                return SampleResolution {
                    reference: Reference::resolved(
                        plain_name.clone(),
                        archive_pointer(&upload_id, &entry_id),
                    ),
                    plain_name,
                };
            }
            warn!("Sample identifier {full_identifier:?} has no archive locator");
        } else {
            warn!("No NOMAD sample found in the CAMELS file");
        }

        if let Some(sample_id) = read_display(&sample, "sample_id") {
            if let Some(name) = read_display(&sample, "name") {
                plain_name = name;
            }
            let reference = if sample_id.is_empty() {
                Reference::named(plain_name.clone())
            } else {
                Reference::named(format!("{plain_name} ID:{sample_id}"))
            };
            return SampleResolution {
                reference,
                plain_name,
            };
        }
    }

    warn!("No sample found in the NOMAD server. Only using the sample name.");
    SampleResolution {
        reference: Reference::named(plain_name.clone()),
        plain_name,
    }
}

/// Resolve references for every instrument used in the measurement.
///
/// An instrument whose `fabrication/ELN-metadata/full_identifier` leaf is
/// absent (or unparsable) resolves name-only.
pub fn resolve_instruments(instruments: &GroupNode) -> Result<Vec<Reference>, ReferenceError> {
    let mut references = Vec::new();
    for name in instruments.keys()? {
        let Some(instrument) = instruments.group(&name) else {
            continue;
        };
        let full_identifier = instrument
            .group("fabrication")
            .and_then(|fabrication| fabrication.group("ELN-metadata"))
            .and_then(|metadata| read_display(&metadata, "full_identifier"));
        let reference = match full_identifier.as_deref().and_then(parse_locator) {
            Some((upload_id, entry_id)) => {
                Reference::resolved(name, archive_pointer(&upload_id, &entry_id))
            }
            None => Reference::named(name),
        };
        references.push(reference);
    }
    Ok(references)
}

/// Resolve the measuring user's display name.
///
/// Tries the external identity service keyed by `user/identifier/identifier`
/// first; a non-success response, empty result set, or any transport error
/// falls back to the plain `user/name` leaf. Only the absence of that final
/// fallback is an error.
pub fn resolve_user(
    entry: &GroupNode,
    identity: &dyn IdentityLookup,
) -> Result<String, ReferenceError> {
    let user = entry.group("user");

    let user_id = user
        .as_ref()
        .and_then(|user| user.group("identifier"))
        .and_then(|identifier| read_display(&identifier, "identifier"));

    match user_id {
        Some(user_id) => match identity.display_name(&user_id) {
            Ok(Some(display_name)) => return Ok(display_name),
            Ok(None) => warn!("No user found for identifier {user_id}"),
            Err(error) => warn!("Error while fetching user data from the database: {error}"),
        },
        None => warn!("No NOMAD user found in the CAMELS file"),
    }

    let user = user.ok_or_else(|| ReferenceError::MissingUserName(entry.path().to_owned()))?;
    read_display(&user, "name").ok_or_else(|| ReferenceError::MissingUserName(user.path().to_owned()))
}
