//! Endpoint addressing for the daemon socket.
//!
//! Endpoints are written as URLs: `unix:///run/remotecmd/remotecmdd.sock` or
//! `tcp://10.0.0.5:9780`. In TOML they may also be spelled as tables tagged
//! by `transport`.

use std::fmt;
use std::fs::DirBuilder;
use std::io;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Address of the daemon socket.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum SocketEndpoint {
    /// Filesystem socket, local to the host.
    Unix { path: Utf8PathBuf },
    /// Network socket reachable by remote controllers.
    Tcp { host: String, port: u16 },
}

impl SocketEndpoint {
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Socket path for Unix endpoints; `None` for TCP.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        if let Self::Unix { path } = self {
            Some(path.as_path())
        } else {
            None
        }
    }

    /// Short transport label used in log fields.
    #[must_use]
    pub const fn transport(&self) -> &'static str {
        match self {
            Self::Unix { .. } => "unix",
            Self::Tcp { .. } => "tcp",
        }
    }

    /// Creates the directory that will hold a Unix socket, owner-only.
    ///
    /// TCP endpoints need nothing on disk and return immediately.
    ///
    /// # Errors
    ///
    /// Fails when the socket path has no parent or the directory cannot be
    /// created.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(path) = self.unix_path() else {
            return Ok(());
        };
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .ok_or_else(|| SocketPreparationError::MissingParent {
                path: path.to_path_buf(),
            })?;
        create_private_dir(parent).map_err(|source| SocketPreparationError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })
    }
}

fn create_private_dir(dir: &Utf8Path) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    match builder.create(dir.as_std_path()) {
        Err(error) if error.kind() != io::ErrorKind::AlreadyExists => Err(error),
        _ => Ok(()),
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(f, "unix://{path}"),
            Self::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input)?;
        let missing = |kind: EndpointPart| SocketParseError::Missing {
            part: kind,
            input: input.to_owned(),
        };
        match url.scheme() {
            "unix" if url.path().is_empty() => Err(missing(EndpointPart::UnixPath)),
            "unix" => Ok(Self::unix(url.path())),
            "tcp" => {
                let host = url.host_str().ok_or_else(|| missing(EndpointPart::Host))?;
                let port = url.port().ok_or_else(|| missing(EndpointPart::Port))?;
                Ok(Self::tcp(host, port))
            }
            other => Err(SocketParseError::UnsupportedScheme(other.to_owned())),
        }
    }
}

/// Component absent from an endpoint URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointPart {
    Host,
    Port,
    UnixPath,
}

impl fmt::Display for EndpointPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Host => "TCP host",
            Self::Port => "TCP port",
            Self::UnixPath => "Unix socket path",
        })
    }
}

/// Errors encountered while parsing a [`SocketEndpoint`] from text.
#[derive(Debug, Error)]
pub enum SocketParseError {
    #[error("unsupported socket scheme '{0}', expected 'unix' or 'tcp'")]
    UnsupportedScheme(String),
    #[error("missing {part} in '{input}'")]
    Missing { part: EndpointPart, input: String },
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Errors raised when preparing socket directories.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    #[error("socket path '{path}' has no parent directory")]
    MissingParent { path: Utf8PathBuf },
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[test]
    fn display_unix_socket() {
        let endpoint = SocketEndpoint::unix(Utf8PathBuf::from("/run/remotecmd/remotecmdd.sock"));
        assert_eq!(endpoint.to_string(), "unix:///run/remotecmd/remotecmdd.sock");
    }

    #[rstest]
    #[case("tcp://127.0.0.1:9780", SocketEndpoint::tcp("127.0.0.1", 9780))]
    #[case("unix:///var/run/remotecmdd.sock", SocketEndpoint::unix("/var/run/remotecmdd.sock"))]
    fn parses_endpoints(#[case] input: &str, #[case] expected: SocketEndpoint) {
        let endpoint: SocketEndpoint = input.parse().expect("endpoint should parse");
        assert_eq!(endpoint, expected);
    }

    #[rstest]
    #[case("http://example.com:80")]
    #[case("tcp://127.0.0.1")]
    fn rejects_unusable_endpoints(#[case] input: &str) {
        assert!(input.parse::<SocketEndpoint>().is_err());
    }

    #[test]
    fn missing_port_is_named_in_the_error() {
        let error = "tcp://10.0.0.5".parse::<SocketEndpoint>().expect_err("no port");
        assert_eq!(error.to_string(), "missing TCP port in 'tcp://10.0.0.5'");
    }

    #[test]
    fn prepares_socket_parent_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");
        let endpoint = SocketEndpoint::unix(root.join("nested").join("remotecmdd.sock"));
        endpoint.prepare_filesystem().expect("prepare socket directory");
        assert!(root.join("nested").is_dir());
    }

    #[test]
    fn tcp_endpoints_need_no_preparation() {
        SocketEndpoint::tcp("localhost", 9780)
            .prepare_filesystem()
            .expect("tcp endpoints are a no-op");
    }
}
