//! Recursive Settings Reader: instrument configuration trees.
//!
//! Walks a nested group/dataset hierarchy and produces a nested JSON mapping.
//! Every leaf passes through the coercion unit, so no byte-string or native
//! array type survives into the output. Recursion is bounded only by the
//! container's actual nesting; container hierarchies are acyclic by
//! construction.

use serde_json::{Map, Value};

use crate::coerce::{coerce, CoerceError};
use crate::container::{ContainerError, GroupNode, Node};

/// Errors raised while reading a settings tree.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// A container read failed.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// A leaf value could not be normalized.
    #[error(transparent)]
    Coerce(#[from] CoerceError),
}

/// Read a group's subtree into a nested mapping of normalized values.
///
/// Pure read; the container is not modified.
pub fn read_settings(group: &GroupNode) -> Result<Map<String, Value>, SettingsError> {
    let mut out = Map::new();
    for key in group.keys()? {
        match group.get(&key) {
            Some(Node::Group(sub)) => {
                out.insert(key, Value::Object(read_settings(&sub)?));
            }
            Some(Node::Dataset(dataset)) => {
                out.insert(key, coerce(dataset.read_raw()?)?);
            }
            // The link vanished between listing and lookup; nothing to read.
            None => continue,
        }
    }
    Ok(out)
}
