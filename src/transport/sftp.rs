//! SFTP transport over an authenticated SSH session.
//!
//! One network session yields one long-lived SFTP channel that is reused
//! for every ensure-dir and open-write call of the invocation. The channel
//! is opened explicitly after session establishment and dropped before the
//! session is torn down.

use std::io::Write;
use std::net::TcpStream;
use std::path::PathBuf;

use log::debug;
use ssh2::{ErrorCode, OpenFlags, OpenType, Session, Sftp};

use crate::constants::{REMOTE_DIR_MODE, REMOTE_FILE_MODE, SFTP_DEFAULT_PORT};
use crate::error::DeployError;
use crate::transport::{Credentials, TargetAddress, TransportOptions, TransportSession};

/// SFTP status code for a path that does not exist.
const SSH_FX_NO_SUCH_FILE: i32 = 2;

/// SFTP session holding one SSH connection and one channel for the whole
/// invocation. Paths in the target address are absolute on the remote side;
/// a target naming only a host uploads relative to the login directory.
pub struct SftpSession {
    session: Option<Session>,
    sftp: Option<Sftp>,
    base: String,
}

impl SftpSession {
    /// Connect, authenticate with username/password and open the channel.
    ///
    /// The remote base directory named by the address is created on a fresh
    /// target before the session is handed to the uploader.
    pub fn connect(
        address: &TargetAddress,
        credentials: &Credentials,
        options: &TransportOptions,
    ) -> Result<Self, DeployError> {
        let (host, port) = address.endpoint(SFTP_DEFAULT_PORT)?;
        debug!(
            "Connecting via SFTP with username=[{}] target=[{}]",
            credentials.username,
            address.canonical()
        );

        let tcp = TcpStream::connect((host.as_str(), port)).map_err(|err| {
            DeployError::Connection(format!("failed to connect to {host}:{port}: {err}"))
        })?;
        tcp.set_read_timeout(Some(options.connect_timeout))
            .map_err(|err| DeployError::Connection(format!("failed to set read timeout: {err}")))?;
        tcp.set_write_timeout(Some(options.connect_timeout))
            .map_err(|err| {
                DeployError::Connection(format!("failed to set write timeout: {err}"))
            })?;

        let mut session = Session::new().map_err(|err| {
            DeployError::Connection(format!("failed to create SSH session: {err}"))
        })?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|err| {
            DeployError::Connection(format!("SSH handshake with {host}:{port} failed: {err}"))
        })?;

        session
            .userauth_password(&credentials.username, &credentials.password)
            .map_err(|err| {
                DeployError::Connection(format!(
                    "authentication failed for [{}]: {err}",
                    credentials.username
                ))
            })?;
        if !session.authenticated() {
            return Err(DeployError::Connection(format!(
                "authentication failed for [{}]",
                credentials.username
            )));
        }

        let sftp = session.sftp().map_err(|err| {
            DeployError::Connection(format!("failed to open SFTP channel: {err}"))
        })?;

        let mut this = Self {
            session: Some(session),
            sftp: Some(sftp),
            base: String::new(),
        };
        let remote_root = address.path().to_string();
        if !remote_root.is_empty() {
            this.base = "/".to_string();
            this.ensure_dir(&remote_root)?;
            this.base = format!("/{remote_root}");
        }
        debug!("SFTP session established with {host}:{port}");
        Ok(this)
    }

    fn channel(&self) -> Result<&Sftp, DeployError> {
        self.sftp
            .as_ref()
            .ok_or_else(|| DeployError::Protocol("SFTP channel already closed".to_string()))
    }

    fn full(&self, path: &str) -> PathBuf {
        if self.base.is_empty() {
            PathBuf::from(path)
        } else {
            PathBuf::from(format!("{}/{path}", self.base.trim_end_matches('/')))
        }
    }
}

impl TransportSession for SftpSession {
    fn dir_exists(&mut self, path: &str) -> Result<bool, DeployError> {
        let full = self.full(path);
        match self.channel()?.stat(&full) {
            Ok(stat) => Ok(stat.is_dir()),
            Err(err) => match err.code() {
                ErrorCode::SFTP(SSH_FX_NO_SUCH_FILE) => Ok(false),
                _ => Err(DeployError::Protocol(format!(
                    "stat of [{}] failed: {err}",
                    full.display()
                ))),
            },
        }
    }

    fn make_dir(&mut self, path: &str) -> Result<(), DeployError> {
        let full = self.full(path);
        self.channel()?
            .mkdir(&full, REMOTE_DIR_MODE)
            .map_err(|err| {
                DeployError::Protocol(format!("mkdir [{}] failed: {err}", full.display()))
            })
    }

    fn open_write<'a>(&'a mut self, path: &str) -> Result<Box<dyn Write + 'a>, DeployError> {
        let full = self.full(path);
        let file = self
            .channel()?
            .open_mode(
                &full,
                OpenFlags::CREATE | OpenFlags::WRITE | OpenFlags::TRUNCATE,
                REMOTE_FILE_MODE,
                OpenType::File,
            )
            .map_err(|err| {
                DeployError::Protocol(format!(
                    "failed to open [{}] for writing: {err}",
                    full.display()
                ))
            })?;
        Ok(Box::new(file))
    }

    fn disconnect(&mut self) {
        // the channel must go before the session it rides on
        if self.sftp.take().is_some() {
            if let Some(session) = self.session.take() {
                if let Err(err) = session.disconnect(None, "deployment finished", None) {
                    debug!("SFTP disconnect reported: {err}");
                }
            }
            debug!("SFTP session closed");
        }
    }
}

impl Drop for SftpSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}
