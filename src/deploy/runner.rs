//! Top-level deploy invocation.

use log::{debug, warn};

use crate::deploy::progress::ProgressSink;
use crate::deploy::uploader::upload_collections;
use crate::deploy::CancelToken;
use crate::error::DeployError;
use crate::models::{ArtifactCollection, TransferOutcome};
use crate::transport::{self, Credentials, Protocol, TargetAddress, TransportOptions};

/// Everything one upload invocation needs. Constructed once from caller
/// input; immutable afterwards.
#[derive(Debug)]
pub struct DeployRequest {
    pub protocol: Protocol,
    /// Raw, pre-normalization target string
    pub target: String,
    pub credentials: Credentials,
    pub options: TransportOptions,
    pub collections: Vec<ArtifactCollection>,
}

/// Run one upload invocation end to end.
///
/// Normalizes the target, connects, uploads every collection in order and
/// releases the session on every exit path. Returns `true` only if every
/// file of every collection transferred without cancellation or error.
/// Failures are surfaced as a single line through `sink` with full detail
/// in the internal log; cancellation is a warning, not an error.
pub fn run_deploy(request: &DeployRequest, gate: &CancelToken, sink: &dyn ProgressSink) -> bool {
    match execute(request, gate, sink) {
        Ok(outcome) if outcome.interrupted => {
            sink.warning(&format!("{} upload interrupted.", request.protocol));
            false
        }
        Ok(outcome) => {
            debug!(
                "Uploaded {} files in {} collections to [{}]",
                outcome.total_files(),
                outcome.uploaded.len(),
                request.target
            );
            outcome.success
        }
        Err(DeployError::Interrupted) => {
            sink.warning(&format!("{} upload interrupted.", request.protocol));
            false
        }
        Err(err) => {
            warn!(
                "{} upload to [{}] failed: {err}",
                request.protocol, request.target
            );
            sink.error(&err.to_string());
            false
        }
    }
}

fn execute(
    request: &DeployRequest,
    gate: &CancelToken,
    sink: &dyn ProgressSink,
) -> Result<TransferOutcome, DeployError> {
    let address = TargetAddress::normalize(request.protocol, &request.target)?;

    // a stop requested before the invocation starts uploads nothing
    if gate.is_cancelled() {
        return Ok(TransferOutcome {
            success: false,
            interrupted: true,
            uploaded: Vec::new(),
        });
    }

    let mut session = transport::connect(&address, &request.credentials, &request.options)?;
    sink.message(&format!(
        "Starting upload via {} to {}",
        request.protocol, address
    ));
    let outcome = upload_collections(session.as_mut(), &request.collections, gate, sink);
    // the drop guard covers the error paths; this covers the normal one
    session.disconnect();
    outcome
}
