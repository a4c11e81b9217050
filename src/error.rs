//! Error taxonomy for deployment operations.
//!
//! Every fallible engine operation reports one of these variants. The
//! transports translate their native failure conditions into this taxonomy
//! instead of leaking protocol-specific error types to the orchestrator,
//! and none of the variants is retried automatically: the first fatal
//! condition terminates the whole invocation.

use thiserror::Error;

/// Errors surfaced by the upload engine.
///
/// `Interrupted` is an expected, user-triggered stop rather than a defect;
/// the invocation layer reports it at warning level while the remaining
/// variants are reported as errors.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Malformed or empty target string, detected before any connection attempt
    #[error("invalid target address: {0}")]
    InvalidAddress(String),

    /// Authentication failure, unreachable host or handshake failure
    #[error("connection failed: {0}")]
    Connection(String),

    /// A remote filesystem operation failed for a reason other than a tolerated race
    #[error("remote operation failed: {0}")]
    Protocol(String),

    /// Local file read failure
    #[error("local I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cooperative cancellation observed at a poll point
    #[error("upload interrupted")]
    Interrupted,
}
