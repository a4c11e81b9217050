use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::transport::Protocol;

/// Command-line arguments for the rust-deployer tool.
///
/// Options cover the transport selection, the target address and
/// credentials, and the artifact sources to upload: either a YAML deploy
/// manifest or ad-hoc `--file` entries.
#[derive(Parser, Debug)]
#[clap(
    name = "rust-deployer",
    about = "Uploads build artifacts to a remote filesystem over SMB or SFTP"
)]
pub struct Args {
    /// Wire protocol used to reach the target
    #[clap(short = 'T', long, value_enum)]
    pub transport: TransportChoice,

    /// Target address: \\host\share\path, host/share/path or a protocol URL
    #[clap(short, long)]
    pub target: String,

    /// Username for authentication
    #[clap(short, long)]
    pub username: String,

    /// Password for authentication
    #[clap(short, long)]
    pub password: String,

    /// Authentication domain (SMB only)
    #[clap(long)]
    pub domain: Option<String>,

    /// Resolve the SMB host via DNS only, skipping NetBIOS name resolution
    #[clap(long)]
    pub dns_only: bool,

    /// Connection timeout in seconds
    #[clap(long, default_value = "30")]
    pub timeout: u64,

    /// Path to a YAML deploy manifest describing artifact collections
    #[clap(short, long)]
    pub manifest: Option<PathBuf>,

    /// File to upload when no manifest is given (repeatable)
    #[clap(short, long)]
    pub file: Vec<PathBuf>,

    /// Destination directory for --file sources, relative to the target root
    #[clap(long, default_value = "")]
    pub dest: String,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,
}

/// Transport selection on the command line.
#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum TransportChoice {
    /// Windows/Samba file share
    Smb,
    /// SFTP over an SSH session
    Sftp,
}

impl TransportChoice {
    pub fn protocol(&self) -> Protocol {
        match self {
            TransportChoice::Smb => Protocol::Smb,
            TransportChoice::Sftp => Protocol::Sftp,
        }
    }
}
