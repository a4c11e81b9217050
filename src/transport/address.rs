//! Target address normalization.
//!
//! User-supplied destinations arrive as Windows UNC paths (`\\host\share`),
//! bare `host/share` forms, or already protocol-prefixed URLs. All are
//! rewritten into one canonical form: explicit protocol prefix, forward
//! slashes, trailing separator. Normalization is a pure string
//! transformation, performs no network I/O and is idempotent.

use std::fmt;

use crate::error::DeployError;

/// Wire protocols understood by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protocol {
    Smb,
    Sftp,
}

impl Protocol {
    /// URL prefix carried by the canonical address form.
    pub fn prefix(&self) -> &'static str {
        match self {
            Protocol::Smb => "smb://",
            Protocol::Sftp => "sftp://",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Smb => write!(f, "SMB"),
            Protocol::Sftp => write!(f, "SFTP"),
        }
    }
}

/// Canonical, protocol-prefixed, trailing-separator-terminated destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetAddress {
    protocol: Protocol,
    canonical: String,
}

impl TargetAddress {
    /// Normalize a raw target string into its canonical form.
    ///
    /// Share and directory references require a trailing `/`, so one is
    /// appended when missing. Fails only on blank input.
    pub fn normalize(protocol: Protocol, raw: &str) -> Result<Self, DeployError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DeployError::InvalidAddress(
                "target must not be empty".to_string(),
            ));
        }

        let mut canonical = if let Some(unc) = trimmed.strip_prefix(r"\\") {
            format!("{}{}", protocol.prefix(), unc)
        } else if trimmed.starts_with(protocol.prefix()) {
            trimmed.to_string()
        } else {
            format!("{}{}", protocol.prefix(), trimmed)
        };

        canonical = canonical.replace('\\', "/");
        if !canonical.ends_with('/') {
            canonical.push('/');
        }

        Ok(Self {
            protocol,
            canonical,
        })
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// The full canonical string, e.g. `smb://fileserver/drop/`.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Canonical form with the protocol prefix stripped, e.g. `fileserver/drop/`.
    pub fn location(&self) -> &str {
        &self.canonical[self.protocol.prefix().len()..]
    }

    /// First segment of the location: the host, possibly carrying `:port`.
    pub fn host(&self) -> &str {
        self.location().split('/').next().unwrap_or("")
    }

    /// Everything after the host, without leading or trailing separators.
    /// Empty when the target names only a host.
    pub fn path(&self) -> &str {
        match self.location().split_once('/') {
            Some((_, rest)) => rest.trim_matches('/'),
            None => "",
        }
    }

    /// Split the host segment into hostname and port, applying `default_port`
    /// when no explicit port is present.
    pub fn endpoint(&self, default_port: u16) -> Result<(String, u16), DeployError> {
        let host = self.host();
        if host.is_empty() {
            return Err(DeployError::InvalidAddress(format!(
                "no host in target [{}]",
                self.canonical
            )));
        }
        match host.split_once(':') {
            Some((name, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    DeployError::InvalidAddress(format!(
                        "invalid port in target [{}]",
                        self.canonical
                    ))
                })?;
                Ok((name.to_string(), port))
            }
            None => Ok((host.to_string(), default_port)),
        }
    }
}

impl fmt::Display for TargetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unc_target_gains_prefix_and_separator() {
        let addr = TargetAddress::normalize(Protocol::Smb, r"\\fileserver\drop").unwrap();
        assert_eq!(addr.canonical(), "smb://fileserver/drop/");
    }

    #[test]
    fn bare_target_gains_prefix() {
        let addr = TargetAddress::normalize(Protocol::Smb, "fileserver/drop/nightly").unwrap();
        assert_eq!(addr.canonical(), "smb://fileserver/drop/nightly/");
    }

    #[test]
    fn prefixed_target_only_gains_separator() {
        let addr = TargetAddress::normalize(Protocol::Sftp, "sftp://deploy.example.com/www").unwrap();
        assert_eq!(addr.canonical(), "sftp://deploy.example.com/www/");
    }

    #[test]
    fn backslashes_become_forward_slashes() {
        let addr = TargetAddress::normalize(Protocol::Smb, r"\\host\share\sub\dir").unwrap();
        assert_eq!(addr.canonical(), "smb://host/share/sub/dir/");
    }

    #[test]
    fn trailing_separator_is_not_doubled() {
        let addr = TargetAddress::normalize(Protocol::Smb, "host/share/").unwrap();
        assert_eq!(addr.canonical(), "smb://host/share/");
    }

    #[test]
    fn blank_target_is_rejected() {
        for raw in ["", "   ", "\t"] {
            let err = TargetAddress::normalize(Protocol::Smb, raw).unwrap_err();
            assert!(matches!(err, DeployError::InvalidAddress(_)));
        }
    }

    #[test]
    fn host_and_path_accessors() {
        let addr = TargetAddress::normalize(Protocol::Smb, r"\\host\share\a\b").unwrap();
        assert_eq!(addr.host(), "host");
        assert_eq!(addr.path(), "share/a/b");
        assert_eq!(addr.location(), "host/share/a/b/");

        let bare = TargetAddress::normalize(Protocol::Sftp, "host").unwrap();
        assert_eq!(bare.host(), "host");
        assert_eq!(bare.path(), "");
    }

    #[test]
    fn endpoint_splits_an_explicit_port() {
        let addr = TargetAddress::normalize(Protocol::Sftp, "host:2222/www").unwrap();
        assert_eq!(addr.endpoint(22).unwrap(), ("host".to_string(), 2222));

        let plain = TargetAddress::normalize(Protocol::Sftp, "host/www").unwrap();
        assert_eq!(plain.endpoint(22).unwrap(), ("host".to_string(), 22));
    }

    #[test]
    fn endpoint_rejects_a_malformed_port() {
        let addr = TargetAddress::normalize(Protocol::Sftp, "host:abc/www").unwrap();
        assert!(matches!(
            addr.endpoint(22),
            Err(DeployError::InvalidAddress(_))
        ));
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(raw in r"[a-zA-Z0-9\\/:._-]{1,40}") {
            for protocol in [Protocol::Smb, Protocol::Sftp] {
                if let Ok(first) = TargetAddress::normalize(protocol, &raw) {
                    let second =
                        TargetAddress::normalize(protocol, first.canonical()).unwrap();
                    prop_assert_eq!(first.canonical(), second.canonical());
                }
            }
        }
    }
}
