//! The "create archive" persistence collaborator.
//!
//! Persistence itself is owned by the hosting application; the engine only
//! hands over a fully-populated document. [`ArchiveSink`] is that seam, and
//! [`FileSystemSink`] is the standalone implementation the CLI uses.

use serde_json::Value;
use std::path::PathBuf;

/// Serialization format of a persisted archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// JSON, the only format currently emitted.
    Json,
}

impl ArchiveFormat {
    /// File extension for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Json => "json",
        }
    }
}

/// Archive file name for a mainfile: `{basename}.archive.{ext}`.
pub fn archive_filename_for(mainfile_name: &str, filetype: ArchiveFormat) -> String {
    format!("{mainfile_name}.archive.{}", filetype.extension())
}

/// Upload context forwarded to the persistence collaborator.
#[derive(Debug, Clone, Default)]
pub struct UploadContext {
    /// Identifier of the upload the archive belongs to.
    pub upload_id: Option<String>,
}

/// Errors raised by archive persistence.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Writing the archive file failed.
    #[error("Failed to write archive {filename}: {source}")]
    Io {
        /// Name of the archive file.
        filename: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serializing the document failed.
    #[error("Failed to serialize archive: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persists fully-populated archive documents.
pub trait ArchiveSink {
    /// Persist `document` as `filename` in the given upload context.
    fn create_archive(
        &self,
        document: &Value,
        context: &UploadContext,
        filename: &str,
        filetype: ArchiveFormat,
    ) -> Result<(), SinkError>;
}

/// Writes archive documents into a directory.
#[derive(Debug, Clone)]
pub struct FileSystemSink {
    root: PathBuf,
}

impl FileSystemSink {
    /// A sink writing into `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArchiveSink for FileSystemSink {
    fn create_archive(
        &self,
        document: &Value,
        _context: &UploadContext,
        filename: &str,
        filetype: ArchiveFormat,
    ) -> Result<(), SinkError> {
        debug_assert_eq!(filetype, ArchiveFormat::Json);
        let path = self.root.join(filename);
        let payload = serde_json::to_vec_pretty(document)?;
        std::fs::write(&path, payload).map_err(|source| SinkError::Io {
            filename: filename.to_owned(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn archive_filename_keeps_the_original_extension() {
        assert_eq!(
            archive_filename_for("test_CAMELS_file.nxs", ArchiveFormat::Json),
            "test_CAMELS_file.nxs.archive.json"
        );
    }

    #[test]
    fn filesystem_sink_writes_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSystemSink::new(dir.path());
        let document = json!({"data": {"name": "run_001"}});

        sink.create_archive(
            &document,
            &UploadContext::default(),
            "run_001.nxs.archive.json",
            ArchiveFormat::Json,
        )
        .unwrap();

        let written = std::fs::read_to_string(dir.path().join("run_001.nxs.archive.json")).unwrap();
        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, document);
    }
}
