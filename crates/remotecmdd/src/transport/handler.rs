//! Accepted connection streams and the bounded request reader.

use std::io::{self, Read, Write};
use std::net::TcpStream;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

use thiserror::Error;

/// Stream types accepted by the daemon listener.
pub(crate) enum ConnectionStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl ConnectionStream {
    /// Peer description for log events.
    pub(crate) fn peer(&self) -> String {
        match self {
            Self::Tcp(stream) => stream
                .peer_addr()
                .map_or_else(|_| "tcp:unknown".to_owned(), |addr| format!("tcp:{addr}")),
            #[cfg(unix)]
            Self::Unix(_) => "unix".to_owned(),
        }
    }
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: ConnectionStream);
}

/// Failure to read one request line.
#[derive(Debug, Error)]
pub(crate) enum RequestReadError {
    /// The line grew past the permitted size before a newline arrived.
    #[error("request exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Reads bytes up to and including the first newline.
///
/// Returns `Ok(None)` when the peer closes without sending anything. A
/// final line without a terminating newline is returned as-is. Bytes after
/// the newline are discarded: one connection carries one request.
pub(crate) fn read_request_line<R: Read>(
    stream: &mut R,
    limit: usize,
) -> Result<Option<Vec<u8>>, RequestReadError> {
    let mut line = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        let read = read_with_retry(stream, &mut chunk)?;
        if read == 0 {
            return Ok((!line.is_empty()).then_some(line));
        }

        let received = &chunk[..read];
        match received.iter().position(|byte| *byte == b'\n') {
            Some(end) => {
                line.extend_from_slice(&received[..=end]);
                enforce_limit(line.len(), limit)?;
                return Ok(Some(line));
            }
            None => {
                line.extend_from_slice(received);
                enforce_limit(line.len(), limit)?;
            }
        }
    }
}

fn read_with_retry<R: Read>(stream: &mut R, chunk: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(chunk) {
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            other => return other,
        }
    }
}

fn enforce_limit(size: usize, limit: usize) -> Result<(), RequestReadError> {
    if size > limit {
        return Err(RequestReadError::TooLarge { limit });
    }
    Ok(())
}
