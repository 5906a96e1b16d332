//! Read-only access to hierarchical HDF5/NeXus measurement containers.
//!
//! A container is a tree of two node kinds: *groups* (string-keyed mappings)
//! and *datasets* (typed scalars or fixed-shape arrays). This module wraps the
//! `hdf5` crate behind a small surface that the rest of the engine uses:
//!
//! - [`Container::open`] acquires a scoped read-only handle; dropping the
//!   container (on any exit path) releases it.
//! - [`GroupNode::get`] is an explicit capability query: it reports whether a
//!   key is absent, a group, or a dataset, so callers never branch on errors
//!   for expected-missing data.
//! - [`DatasetNode::read_raw`] surfaces the container's weak typing as a
//!   [`RawValue`], leaving all normalization to the coercion unit.

use std::path::{Path, PathBuf};

use hdf5::types::{FloatSize, IntSize, TypeDescriptor, VarLenAscii, VarLenUnicode};

/// Errors raised by container access.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// The file could not be opened as an HDF5 container.
    #[error("Failed to open container {path}: {source}")]
    Open {
        /// Path of the file that failed to open.
        path: String,
        /// Underlying HDF5 error.
        source: hdf5::Error,
    },

    /// A low-level HDF5 read failed.
    #[error("Container read failed at {path}: {source}")]
    Read {
        /// Internal path of the failing node.
        path: String,
        /// Underlying HDF5 error.
        source: hdf5::Error,
    },

    /// A node required by the extraction contract is absent.
    #[error("Missing required node: {0}")]
    Missing(String),

    /// A node exists but has the wrong kind for the requested read.
    #[error("Expected a {expected} at {path}")]
    WrongKind {
        /// Internal path of the offending node.
        path: String,
        /// Node kind the caller required.
        expected: &'static str,
    },

    /// The dataset's element type has no raw-value mapping.
    #[error("Unsupported dataset type at {path}: {dtype}")]
    UnsupportedType {
        /// Internal path of the offending dataset.
        path: String,
        /// Type descriptor reported by the container.
        dtype: String,
    },
}

/// A raw, weakly-typed value read from a dataset.
///
/// Byte strings and native arrays survive here deliberately; the coercion
/// unit is the only place they are normalized away.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// ASCII-charset byte string, not yet decoded.
    Bytes(Vec<u8>),
    /// UTF-8 string scalar.
    Text(String),
    /// Integer scalar (all widths widened to 64 bits).
    Int(i64),
    /// Floating-point scalar.
    Float(f64),
    /// Boolean scalar.
    Bool(bool),
    /// Array of byte strings.
    BytesList(Vec<Vec<u8>>),
    /// Array of UTF-8 strings.
    TextList(Vec<String>),
    /// Array of integers.
    IntList(Vec<i64>),
    /// Array of floats.
    FloatList(Vec<f64>),
}

/// Scoped read-only handle to an open container file.
///
/// All reads must happen while the handle is alive; the underlying file is
/// closed when the `Container` drops, including on error paths.
pub struct Container {
    file: hdf5::File,
    path: PathBuf,
}

impl Container {
    /// Open a container file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ContainerError> {
        let path = path.as_ref();
        let file = hdf5::File::open(path).map_err(|source| ContainerError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The container's root group.
    pub fn root(&self) -> GroupNode {
        let group: &hdf5::Group = &self.file;
        GroupNode {
            inner: group.clone(),
            path: String::from("/"),
        }
    }

    /// Read a top-level string attribute, if present.
    ///
    /// Returns `Ok(None)` when the attribute does not exist; attribute values
    /// that are not strings are reported as [`ContainerError::WrongKind`].
    pub fn attr_str(&self, name: &str) -> Result<Option<String>, ContainerError> {
        let names = self.file.attr_names().map_err(|source| ContainerError::Read {
            path: String::from("/"),
            source,
        })?;
        if !names.iter().any(|n| n == name) {
            return Ok(None);
        }
        let attr = self.file.attr(name).map_err(|source| ContainerError::Read {
            path: format!("/@{name}"),
            source,
        })?;
        if let Ok(value) = attr.read_scalar::<VarLenUnicode>() {
            return Ok(Some(value.as_str().to_owned()));
        }
        match attr.read_scalar::<VarLenAscii>() {
            Ok(value) => Ok(Some(String::from_utf8_lossy(value.as_bytes()).into_owned())),
            Err(_) => Err(ContainerError::WrongKind {
                path: format!("/@{name}"),
                expected: "string attribute",
            }),
        }
    }
}

/// A node retrieved by [`GroupNode::get`].
pub enum Node {
    /// The key names a nested group.
    Group(GroupNode),
    /// The key names a leaf dataset.
    Dataset(DatasetNode),
}

/// A group node: a string-keyed mapping of child nodes.
#[derive(Clone)]
pub struct GroupNode {
    inner: hdf5::Group,
    path: String,
}

impl GroupNode {
    /// Internal path of this group, for diagnostics.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Keys of the group's direct children.
    pub fn keys(&self) -> Result<Vec<String>, ContainerError> {
        self.inner.member_names().map_err(|source| ContainerError::Read {
            path: self.path.clone(),
            source,
        })
    }

    /// Capability query: is `key` absent, a group, or a dataset?
    pub fn get(&self, key: &str) -> Option<Node> {
        if !self.inner.link_exists(key) {
            return None;
        }
        let child_path = self.child_path(key);
        if let Ok(group) = self.inner.group(key) {
            return Some(Node::Group(GroupNode {
                inner: group,
                path: child_path,
            }));
        }
        self.inner.dataset(key).ok().map(|dataset| {
            Node::Dataset(DatasetNode {
                inner: dataset,
                path: child_path,
            })
        })
    }

    /// The child group at `key`, or `None` if absent or not a group.
    pub fn group(&self, key: &str) -> Option<GroupNode> {
        match self.get(key) {
            Some(Node::Group(group)) => Some(group),
            _ => None,
        }
    }

    /// The child dataset at `key`, or `None` if absent or not a dataset.
    pub fn dataset(&self, key: &str) -> Option<DatasetNode> {
        match self.get(key) {
            Some(Node::Dataset(dataset)) => Some(dataset),
            _ => None,
        }
    }

    /// The child group at `key`, required by the extraction contract.
    pub fn require_group(&self, key: &str) -> Result<GroupNode, ContainerError> {
        self.group(key)
            .ok_or_else(|| ContainerError::Missing(self.child_path(key)))
    }

    /// The child dataset at `key`, required by the extraction contract.
    pub fn require_dataset(&self, key: &str) -> Result<DatasetNode, ContainerError> {
        self.dataset(key)
            .ok_or_else(|| ContainerError::Missing(self.child_path(key)))
    }

    fn child_path(&self, key: &str) -> String {
        if self.path == "/" {
            format!("/{key}")
        } else {
            format!("{}/{key}", self.path)
        }
    }
}

/// A dataset node: a typed scalar or fixed-shape array leaf.
pub struct DatasetNode {
    inner: hdf5::Dataset,
    path: String,
}

impl DatasetNode {
    /// Internal path of this dataset, for diagnostics.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Read the dataset's value without normalization.
    ///
    /// Zero-dimensional datasets read as scalars; everything else reads as a
    /// flat list in storage order. Fixed-size strings are widened to
    /// variable-length on read, which the format guarantees is lossless.
    pub fn read_raw(&self) -> Result<RawValue, ContainerError> {
        let descriptor = self
            .inner
            .dtype()
            .and_then(|dtype| dtype.to_descriptor())
            .map_err(|source| self.read_error(source))?;
        let scalar = self.inner.ndim() == 0;

        match &descriptor {
            TypeDescriptor::VarLenUnicode | TypeDescriptor::FixedUnicode(_) => {
                if scalar {
                    let value = self
                        .inner
                        .read_scalar::<VarLenUnicode>()
                        .map_err(|source| self.read_error(source))?;
                    Ok(RawValue::Text(value.as_str().to_owned()))
                } else {
                    let values = self
                        .inner
                        .read_raw::<VarLenUnicode>()
                        .map_err(|source| self.read_error(source))?;
                    Ok(RawValue::TextList(
                        values.iter().map(|v| v.as_str().to_owned()).collect(),
                    ))
                }
            }
            TypeDescriptor::VarLenAscii | TypeDescriptor::FixedAscii(_) => {
                if scalar {
                    let value = self
                        .inner
                        .read_scalar::<VarLenAscii>()
                        .map_err(|source| self.read_error(source))?;
                    Ok(RawValue::Bytes(value.as_bytes().to_vec()))
                } else {
                    let values = self
                        .inner
                        .read_raw::<VarLenAscii>()
                        .map_err(|source| self.read_error(source))?;
                    Ok(RawValue::BytesList(
                        values.iter().map(|v| v.as_bytes().to_vec()).collect(),
                    ))
                }
            }
            TypeDescriptor::Integer(size) => self.read_integer(*size, scalar, true),
            TypeDescriptor::Unsigned(size) => self.read_integer(*size, scalar, false),
            TypeDescriptor::Float(FloatSize::U4) => {
                if scalar {
                    let value = self
                        .inner
                        .read_scalar::<f32>()
                        .map_err(|source| self.read_error(source))?;
                    Ok(RawValue::Float(f64::from(value)))
                } else {
                    let values = self
                        .inner
                        .read_raw::<f32>()
                        .map_err(|source| self.read_error(source))?;
                    Ok(RawValue::FloatList(values.into_iter().map(f64::from).collect()))
                }
            }
            TypeDescriptor::Float(FloatSize::U8) => {
                if scalar {
                    let value = self
                        .inner
                        .read_scalar::<f64>()
                        .map_err(|source| self.read_error(source))?;
                    Ok(RawValue::Float(value))
                } else {
                    let values = self
                        .inner
                        .read_raw::<f64>()
                        .map_err(|source| self.read_error(source))?;
                    Ok(RawValue::FloatList(values))
                }
            }
            TypeDescriptor::Boolean => {
                if scalar {
                    let value = self
                        .inner
                        .read_scalar::<bool>()
                        .map_err(|source| self.read_error(source))?;
                    Ok(RawValue::Bool(value))
                } else {
                    let values = self
                        .inner
                        .read_raw::<bool>()
                        .map_err(|source| self.read_error(source))?;
                    Ok(RawValue::IntList(values.into_iter().map(i64::from).collect()))
                }
            }
            // h5py stores Python bools as a two-member enum.
            TypeDescriptor::Enum(_) => {
                if scalar {
                    match self.inner.read_scalar::<bool>() {
                        Ok(value) => Ok(RawValue::Bool(value)),
                        Err(_) => Err(self.unsupported(&descriptor)),
                    }
                } else {
                    match self.inner.read_raw::<bool>() {
                        Ok(values) => {
                            Ok(RawValue::IntList(values.into_iter().map(i64::from).collect()))
                        }
                        Err(_) => Err(self.unsupported(&descriptor)),
                    }
                }
            }
            other => Err(self.unsupported(other)),
        }
    }

    fn read_integer(
        &self,
        size: IntSize,
        scalar: bool,
        signed: bool,
    ) -> Result<RawValue, ContainerError> {
        macro_rules! read_as {
            ($ty:ty) => {
                if scalar {
                    self.inner
                        .read_scalar::<$ty>()
                        .map(|v| RawValue::Int(v as i64))
                        .map_err(|source| self.read_error(source))
                } else {
                    self.inner
                        .read_raw::<$ty>()
                        .map(|vs| RawValue::IntList(vs.into_iter().map(|v| v as i64).collect()))
                        .map_err(|source| self.read_error(source))
                }
            };
        }
        match (signed, size) {
            (true, IntSize::U1) => read_as!(i8),
            (true, IntSize::U2) => read_as!(i16),
            (true, IntSize::U4) => read_as!(i32),
            (true, IntSize::U8) => read_as!(i64),
            (false, IntSize::U1) => read_as!(u8),
            (false, IntSize::U2) => read_as!(u16),
            (false, IntSize::U4) => read_as!(u32),
            (false, IntSize::U8) => read_as!(u64),
        }
    }

    fn read_error(&self, source: hdf5::Error) -> ContainerError {
        ContainerError::Read {
            path: self.path.clone(),
            source,
        }
    }

    fn unsupported(&self, descriptor: &TypeDescriptor) -> ContainerError {
        ContainerError::UnsupportedType {
            path: self.path.clone(),
            dtype: format!("{descriptor:?}"),
        }
    }
}
