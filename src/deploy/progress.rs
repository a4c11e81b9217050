//! Progress reporting seam between the engine and its caller.

use log::{error, info, warn};

/// Message-emitting collaborator for user-facing upload progress.
///
/// The engine reports one line when the upload begins, one per completed
/// collection, a warning on cancellation and an error line on hard
/// failure. Diagnostic detail goes to the internal log instead.
pub trait ProgressSink {
    fn message(&self, text: &str);
    fn warning(&self, text: &str);
    fn error(&self, text: &str);
}

/// Default sink forwarding progress to the process-wide logger.
#[derive(Debug, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn message(&self, text: &str) {
        info!("{text}");
    }

    fn warning(&self, text: &str) {
        warn!("{text}");
    }

    fn error(&self, text: &str) {
        error!("{text}");
    }
}
