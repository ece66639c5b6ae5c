// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reading domain flow graph descriptors from disk.

use dataflow_graph::FlowGraphDescriptor;
use std::path::{Path, PathBuf};

/// Descriptor file encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    /// `.ron`, and anything without a recognized extension
    Ron,
    /// `.json`
    Json,
}

impl DescriptorFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Ron,
        }
    }

    /// Parse descriptor text
    pub fn parse(self, text: &str) -> Result<FlowGraphDescriptor, String> {
        match self {
            Self::Ron => FlowGraphDescriptor::from_ron(text).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        }
    }
}

/// Read a descriptor file
pub fn load_descriptor(path: &Path) -> Result<FlowGraphDescriptor, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut descriptor = DescriptorFormat::from_path(path)
        .parse(&text)
        .map_err(|reason| LoadError::Malformed {
            path: path.to_path_buf(),
            reason,
        })?;

    if descriptor.name.is_empty() {
        descriptor.name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
    }

    tracing::debug!(
        path = %path.display(),
        nodes = descriptor.nodes.len(),
        edges = descriptor.edges.len(),
        "loaded descriptor"
    );
    Ok(descriptor)
}

/// Error reading a descriptor file
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File could not be read
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File contents are not a descriptor
    #[error("Malformed descriptor {}: {reason}", path.display())]
    Malformed {
        /// File path
        path: PathBuf,
        /// Parser message
        reason: String,
    },
}
