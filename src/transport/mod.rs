//! Transport sessions for remote filesystem access.
//!
//! One trait covers every wire protocol the deployer speaks. A session is
//! created by [`connect`], owns one live connection for the duration of a
//! single upload invocation and is released exactly once (explicitly or by
//! drop) on every exit path. The concrete realizations translate their
//! native failure conditions into the shared [`DeployError`] taxonomy
//! instead of leaking protocol-specific error types to the orchestrator.
//!
//! ## Supported transports
//!
//! - **SMB**: one authenticated client context per invocation; every remote
//!   reference is a per-operation path under that context
//! - **SFTP**: one authenticated SSH session yielding one long-lived channel
//!   reused for every remote operation of the invocation

mod address;
mod sftp;
mod smb;

pub use address::{Protocol, TargetAddress};
pub use sftp::SftpSession;
pub use smb::SmbSession;

use std::io::Write;
use std::time::Duration;

use log::debug;

use crate::constants::DEFAULT_CONNECT_TIMEOUT_SECS;
use crate::error::DeployError;

/// Credentials for one upload invocation. Immutable once constructed.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Authentication domain, SMB only
    pub domain: Option<String>,
}

/// Transport tuning passed into the session constructor at invocation time,
/// never held in process-global state.
#[derive(Clone, Debug)]
pub struct TransportOptions {
    /// Resolve SMB hosts via DNS only, skipping NetBIOS/broadcast resolution
    pub dns_only_name_resolution: bool,
    /// Connect/read/write timeout applied by the underlying transport
    pub connect_timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            dns_only_name_resolution: false,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

/// One live protocol session scoped to a single upload invocation.
///
/// Paths handed to the session are relative to the base directory named by
/// the target address; the realization joins them internally.
pub trait TransportSession {
    /// Whether `path` currently exists on the remote side. Absence is a
    /// normal answer, not an error.
    fn dir_exists(&mut self, path: &str) -> Result<bool, DeployError>;

    /// Create a single directory. The parent is expected to exist.
    fn make_dir(&mut self, path: &str) -> Result<(), DeployError>;

    /// Open a remote file for writing, creating it if necessary.
    fn open_write<'a>(&'a mut self, path: &str) -> Result<Box<dyn Write + 'a>, DeployError>;

    /// Release the underlying connection. Idempotent and infallible; also
    /// invoked on drop so the connection is released on every exit path.
    fn disconnect(&mut self);

    /// Guarantee every segment of `path` exists as a directory, creating
    /// missing ones parent-first.
    ///
    /// Walks the growing segment prefixes iteratively; a no-op when the
    /// full path already exists. A create that loses the race against a
    /// concurrent creator is success, since the postcondition (directory
    /// exists) holds either way; the existence check is repeated before a
    /// create failure is reported.
    fn ensure_dir(&mut self, path: &str) -> Result<(), DeployError> {
        let mut prefix = String::with_capacity(path.len());
        for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);

            if self.dir_exists(&prefix)? {
                continue;
            }
            if let Err(err) = self.make_dir(&prefix) {
                if !self.dir_exists(&prefix).unwrap_or(false) {
                    return Err(err);
                }
                debug!("Directory [{prefix}] appeared concurrently");
            }
        }
        Ok(())
    }
}

/// Open a session for the protocol named by the canonical address.
///
/// The concrete realization is selected here, once, at invocation start;
/// the orchestrator only ever sees the trait.
pub fn connect(
    address: &TargetAddress,
    credentials: &Credentials,
    options: &TransportOptions,
) -> Result<Box<dyn TransportSession>, DeployError> {
    if credentials.username.is_empty() {
        return Err(DeployError::Connection(
            "username must not be empty".to_string(),
        ));
    }
    match address.protocol() {
        Protocol::Smb => Ok(Box::new(SmbSession::connect(address, credentials, options)?)),
        Protocol::Sftp => Ok(Box::new(SftpSession::connect(
            address,
            credentials,
            options,
        )?)),
    }
}
