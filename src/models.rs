//! Core data models shared across the upload engine.

use std::path::PathBuf;

/// A named group of local build output files mapped to relative remote
/// destinations.
///
/// The label is the source pattern that produced the group and is used for
/// progress reporting only. File order is preserved so logging stays
/// deterministic; uniqueness of the local paths is owned by the producer.
/// The upload engine treats a collection as read-only input.
#[derive(Debug, Clone)]
pub struct ArtifactCollection {
    /// Display-only source pattern that produced this collection
    pub label: String,
    /// (local file, remote-relative destination directory) pairs; an empty
    /// destination means the target root
    pub files: Vec<(PathBuf, String)>,
}

impl ArtifactCollection {
    /// Create an empty collection for the given source label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            files: Vec::new(),
        }
    }

    /// Append a (local file, destination directory) mapping.
    pub fn add_file(&mut self, source: impl Into<PathBuf>, destination: impl Into<String>) {
        self.files.push((source.into(), destination.into()));
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Aggregate result of one upload invocation.
#[derive(Debug, Default)]
pub struct TransferOutcome {
    /// True only if every file of every collection transferred
    pub success: bool,
    /// True when the invocation stopped on a user-triggered cancellation
    /// rather than a hard failure
    pub interrupted: bool,
    /// Per-collection uploaded-file counts, in invocation order
    pub uploaded: Vec<(String, usize)>,
}

impl TransferOutcome {
    /// Total number of files transferred across all collections.
    pub fn total_files(&self) -> usize {
        self.uploaded.iter().map(|(_, count)| count).sum()
    }
}
