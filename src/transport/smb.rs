//! SMB transport over an authenticated client context.
//!
//! One client context carries the authentication for the whole invocation;
//! every directory or file reference is a per-operation path under that
//! context, so there is no persistent handshake to manage beyond name
//! resolution. With DNS-only resolution enabled the host is resolved up
//! front and the client is built against the resolved address, skipping
//! NetBIOS/broadcast lookups entirely.

use std::io::{ErrorKind, Write};
use std::net::ToSocketAddrs;

use log::debug;
use pavao::{SmbClient, SmbCredentials, SmbError, SmbMode, SmbOpenOptions, SmbOptions};

use crate::constants::{REMOTE_DIR_MODE, SMB_TCP_PORT};
use crate::error::DeployError;
use crate::transport::{Credentials, TargetAddress, TransportOptions, TransportSession};

/// SMB session: one authenticated client context scoped to a single
/// invocation. Paths are absolute within the share named by the target.
pub struct SmbSession {
    client: Option<SmbClient>,
    base: String,
}

impl SmbSession {
    /// Build the authenticated client for the share named by the address
    /// and verify the target's base directory is reachable.
    ///
    /// The reachability probe is the first remote operation, so bad
    /// credentials and unreachable hosts surface as a connection failure
    /// before any file is touched.
    pub fn connect(
        address: &TargetAddress,
        credentials: &Credentials,
        options: &TransportOptions,
    ) -> Result<Self, DeployError> {
        let host = address.host().to_string();
        let (share, subpath) = split_share(address)?;
        debug!(
            "Connecting via SMB with username=[{}] domain=[{}] target=[{}]",
            credentials.username,
            credentials.domain.as_deref().unwrap_or(""),
            address.canonical()
        );

        let server_host = if options.dns_only_name_resolution {
            resolve_host(&host)?
        } else {
            host
        };

        let client = SmbClient::new(
            SmbCredentials::default()
                .server(format!("smb://{server_host}"))
                .share(format!("/{share}"))
                .username(&credentials.username)
                .password(&credentials.password)
                .workgroup(credentials.domain.as_deref().unwrap_or("")),
            SmbOptions::default().one_share_per_server(true),
        )
        .map_err(|err| {
            DeployError::Connection(format!("failed to connect to [{server_host}]: {err}"))
        })?;

        let mut this = Self {
            client: Some(client),
            base: String::new(),
        };
        if let Err(err) = this.probe(&subpath) {
            return Err(match err {
                DeployError::Protocol(detail) => DeployError::Connection(detail),
                other => other,
            });
        }
        this.base = subpath;
        debug!("SMB connection established with [{server_host}]");
        Ok(this)
    }

    /// First remote round-trip: ensure the base directory under the share,
    /// or stat the share root when the target names no subdirectory.
    fn probe(&mut self, subpath: &str) -> Result<(), DeployError> {
        if subpath.is_empty() {
            self.client()?.stat("/").map_err(|err| {
                DeployError::Protocol(format!("stat of share root failed: {err}"))
            })?;
            Ok(())
        } else {
            self.ensure_dir(subpath)
        }
    }

    fn client(&self) -> Result<&SmbClient, DeployError> {
        self.client
            .as_ref()
            .ok_or_else(|| DeployError::Protocol("SMB connection already closed".to_string()))
    }

    fn full(&self, path: &str) -> String {
        match (self.base.is_empty(), path.is_empty()) {
            (true, true) => "/".to_string(),
            (true, false) => format!("/{path}"),
            (false, true) => format!("/{}", self.base),
            (false, false) => format!("/{}/{path}", self.base),
        }
    }
}

impl TransportSession for SmbSession {
    fn dir_exists(&mut self, path: &str) -> Result<bool, DeployError> {
        let full = self.full(path);
        match self.client()?.stat(&full) {
            Ok(_) => Ok(true),
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(DeployError::Protocol(format!(
                "stat of [{full}] failed: {err}"
            ))),
        }
    }

    fn make_dir(&mut self, path: &str) -> Result<(), DeployError> {
        let full = self.full(path);
        match self
            .client()?
            .mkdir(&full, SmbMode::from(REMOTE_DIR_MODE as u32))
        {
            Ok(()) => Ok(()),
            // a concurrent creator reaching the same directory first is fine
            Err(err) if is_already_exists(&err) => Ok(()),
            Err(err) => Err(DeployError::Protocol(format!("mkdir [{full}] failed: {err}"))),
        }
    }

    fn open_write<'a>(&'a mut self, path: &str) -> Result<Box<dyn Write + 'a>, DeployError> {
        let full = self.full(path);
        let file = self
            .client()?
            .open_with(&full, SmbOpenOptions::default().create(true).write(true))
            .map_err(|err| {
                DeployError::Protocol(format!("failed to open [{full}] for writing: {err}"))
            })?;
        Ok(Box::new(file))
    }

    fn disconnect(&mut self) {
        // dropping the client releases the library context
        if self.client.take().is_some() {
            debug!("SMB connection closed");
        }
    }
}

impl Drop for SmbSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Split the address path into the share name and the directory path under
/// it. SMB targets must name at least a share.
fn split_share(address: &TargetAddress) -> Result<(String, String), DeployError> {
    let path = address.path();
    match path.split_once('/') {
        Some((share, rest)) => Ok((share.to_string(), rest.trim_matches('/').to_string())),
        None if !path.is_empty() => Ok((path.to_string(), String::new())),
        _ => Err(DeployError::InvalidAddress(format!(
            "no share in target [{}]",
            address.canonical()
        ))),
    }
}

/// Resolve `host` via DNS and return the address literal to connect to.
fn resolve_host(host: &str) -> Result<String, DeployError> {
    let mut addrs = (host, SMB_TCP_PORT).to_socket_addrs().map_err(|err| {
        DeployError::Connection(format!("DNS lookup for [{host}] failed: {err}"))
    })?;
    match addrs.next() {
        Some(addr) => Ok(addr.ip().to_string()),
        None => Err(DeployError::Connection(format!(
            "DNS lookup for [{host}] returned no addresses"
        ))),
    }
}

fn is_not_found(err: &SmbError) -> bool {
    matches!(err, SmbError::Io(io) if io.kind() == ErrorKind::NotFound)
}

fn is_already_exists(err: &SmbError) -> bool {
    matches!(err, SmbError::Io(io) if io.kind() == ErrorKind::AlreadyExists)
}
