//! # camels-archive - CAMELS Measurement File Extraction
//!
//! `camels-archive` extracts structured experiment metadata and measurement
//! records from HDF5/NeXus containers produced by the NOMAD CAMELS
//! data-acquisition tool, and converts them into normalized, queryable
//! archive documents.
//!
//! ## Pipeline
//!
//! 1. The [`classifier`] inspects a candidate file and routes it to one of
//!    two document variants (default vs the specialized diode variant), or
//!    rejects it.
//! 2. The [`extractor`] opens the container, pulls scalar and text fields
//!    through the [`coerce`] unit and the [`sanitize`] pass, walks the
//!    instrument configuration through the recursive [`settings`] reader,
//!    and resolves sample/instrument/user identities through [`references`]
//!    (backed by the [`identity`] service client).
//! 3. For the diode variant, plotted series are recreated from the file
//!    ([`figures`]) and a first-degree [`fit`] derives the threshold voltage
//!    and serial resistance.
//! 4. The assembled document is handed to the [`archive`] persistence
//!    collaborator, or returned directly for deterministic test harnesses.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use camels_archive::classifier::{classify, Classification, MatchRules};
//! use camels_archive::extractor::{Extractor, ExtractorConfig};
//! use std::path::Path;
//!
//! let path = Path::new("test_CAMELS_file.nxs");
//! let rules = MatchRules::default();
//!
//! if let Classification::Match(variant) = classify(path, None, &rules) {
//!     let extractor = Extractor::new(&ExtractorConfig::default())?;
//!     let document = extractor.parse(path, variant)?;
//!     println!("{} tags: {:?}", document.name, document.measurement_tags);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Only genuinely required fields (timestamps, the protocol structure, the
//! measurement-details block) abort extraction. Absent identity
//! substructures, comments, or the embedded script degrade to defaults with
//! a logged warning, and failed numeric coercion keeps the original string.
//! A classifier rejection is a normal negative result, not an error.

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod archive;
pub mod classifier;
pub mod coerce;
pub mod container;
pub mod document;
pub mod extractor;
pub mod figures;
pub mod fit;
pub mod identity;
pub mod references;
pub mod sanitize;
pub mod settings;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::archive::{
        archive_filename_for, ArchiveFormat, ArchiveSink, FileSystemSink, SinkError, UploadContext,
    };
    pub use crate::classifier::{classify, Classification, MatchRules, Variant};
    pub use crate::coerce::{coerce, CoerceError};
    pub use crate::container::{Container, ContainerError, GroupNode, Node, RawValue};
    pub use crate::document::{
        parse_timestamp, ArchiveEntry, DiodeQuantities, EntryMetadata, MeasurementDocument,
    };
    pub use crate::extractor::{ExtractionError, Extractor, ExtractorConfig};
    pub use crate::figures::{Figure, LineStyle, Trace};
    pub use crate::fit::{diode_fit, linear_fit, DiodeFit, FitError, LinearFit};
    pub use crate::identity::{HttpIdentityService, IdentityError, IdentityLookup};
    pub use crate::references::{Reference, ReferenceError};
    pub use crate::sanitize::sanitize_richtext;
    pub use crate::settings::read_settings;
}
