//! Per-collection upload orchestration.

use std::fs::File;
use std::io::{self, ErrorKind};
use std::path::Path;

use log::debug;

use crate::deploy::copier::copy_stream;
use crate::deploy::progress::ProgressSink;
use crate::deploy::CancelToken;
use crate::error::DeployError;
use crate::models::{ArtifactCollection, TransferOutcome};
use crate::transport::TransportSession;

/// Upload every collection, in caller-supplied order, over one session.
///
/// The first hard failure aborts the whole invocation and is returned as an
/// error; an observed cancellation abandons the remaining files of the
/// current and all subsequent collections and returns an outcome flagged
/// `interrupted`. There is no per-file retry and no partial-collection
/// continuation.
pub fn upload_collections(
    session: &mut dyn TransportSession,
    collections: &[ArtifactCollection],
    gate: &CancelToken,
    sink: &dyn ProgressSink,
) -> Result<TransferOutcome, DeployError> {
    let mut uploaded = Vec::with_capacity(collections.len());

    for collection in collections {
        let mut count = 0;
        for (source, destination) in &collection.files {
            if gate.is_cancelled() {
                uploaded.push((collection.label.clone(), count));
                return Ok(interrupted(uploaded));
            }
            match upload_file(session, source, destination, gate) {
                Ok(bytes) => {
                    debug!("done transferring [{}] ({bytes} bytes)", source.display());
                    count += 1;
                }
                Err(DeployError::Interrupted) => {
                    uploaded.push((collection.label.clone(), count));
                    return Ok(interrupted(uploaded));
                }
                Err(err) => return Err(err),
            }
        }
        sink.message(&format!(
            "Uploaded [{count}] files for [{}] pattern",
            collection.label
        ));
        uploaded.push((collection.label.clone(), count));
    }

    Ok(TransferOutcome {
        success: true,
        interrupted: false,
        uploaded,
    })
}

fn interrupted(uploaded: Vec<(String, usize)>) -> TransferOutcome {
    TransferOutcome {
        success: false,
        interrupted: true,
        uploaded,
    }
}

/// Transfer one file: ensure the destination directory, stream the content.
/// Both streams are released by scope on every path, including failures.
fn upload_file(
    session: &mut dyn TransportSession,
    source: &Path,
    destination: &str,
    gate: &CancelToken,
) -> Result<u64, DeployError> {
    let file_name = source
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            DeployError::Io(io::Error::new(
                ErrorKind::InvalidInput,
                format!("source [{}] has no usable file name", source.display()),
            ))
        })?;

    let destination = destination.trim_matches('/');
    let remote_path = if destination.is_empty() {
        file_name.to_string()
    } else {
        session.ensure_dir(destination)?;
        format!("{destination}/{file_name}")
    };

    debug!("Transferring [{}] to [{remote_path}]", source.display());
    let mut reader = File::open(source)?;
    let mut writer = session.open_write(&remote_path)?;
    copy_stream(&mut reader, writer.as_mut(), gate)
}
