//! Deploy manifest loading and artifact resolution glue.
//!
//! The upload engine treats artifact collections as read-only input
//! produced upstream; this module is the boundary where they enter. A YAML
//! manifest names each collection by its source pattern and maps sources
//! to remote-relative destination directories:
//!
//! ```yaml
//! collections:
//!   - pattern: "target/*.war"
//!     files:
//!       - source: target/app.war
//!         destination: webapps
//!   - pattern: "docs"
//!     files:
//!       - source: build/docs
//!         destination: site
//! ```
//!
//! Directory sources are expanded into per-file mappings that preserve the
//! relative layout under the source's destination.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::models::ArtifactCollection;

/// Top-level deploy manifest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeployManifest {
    pub collections: Vec<CollectionSpec>,
}

/// One named group of sources sharing a destination mapping.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionSpec {
    /// Display label, typically the source pattern that produced the group
    pub pattern: String,
    pub files: Vec<FileMapping>,
}

/// A single source file or directory and its remote-relative destination.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileMapping {
    pub source: PathBuf,
    /// Remote directory relative to the target root; empty means the root
    #[serde(default)]
    pub destination: String,
}

/// Load a manifest from a YAML file.
pub fn load_manifest(path: &Path) -> Result<DeployManifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let manifest: DeployManifest = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest {}", path.display()))?;
    Ok(manifest)
}

/// Resolve a manifest into upload-ready collections.
///
/// Plain file sources pass through unchanged; directory sources are walked
/// and every contained file is mapped under the source's destination with
/// its relative layout preserved. A missing source fails resolution,
/// before any connection is attempted.
pub fn resolve_collections(manifest: &DeployManifest) -> Result<Vec<ArtifactCollection>> {
    let mut collections = Vec::with_capacity(manifest.collections.len());
    for spec in &manifest.collections {
        let mut collection = ArtifactCollection::new(&spec.pattern);
        for mapping in &spec.files {
            if mapping.source.is_file() {
                collection.add_file(
                    mapping.source.clone(),
                    normalize_destination(&mapping.destination),
                );
            } else if mapping.source.is_dir() {
                expand_directory(&mapping.source, &mapping.destination, &mut collection)?;
            } else {
                bail!("Source {} does not exist", mapping.source.display());
            }
        }
        collections.push(collection);
    }
    Ok(collections)
}

fn normalize_destination(destination: &str) -> String {
    destination.replace('\\', "/").trim_matches('/').to_string()
}

fn expand_directory(
    root: &Path,
    destination: &str,
    collection: &mut ArtifactCollection,
) -> Result<()> {
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .parent()
            .and_then(|parent| parent.strip_prefix(root).ok())
            .unwrap_or_else(|| Path::new(""));

        let mut dest = normalize_destination(destination);
        if !relative.as_os_str().is_empty() {
            let sub = relative.to_string_lossy().replace('\\', "/");
            dest = if dest.is_empty() {
                sub
            } else {
                format!("{dest}/{sub}")
            };
        }
        collection.add_file(entry.into_path(), dest);
    }
    Ok(())
}
