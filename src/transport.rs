//! Transport - blocking TCP stream handling.
//!
//! [`Transport`] wraps a connected stream and provides the two primitives
//! the protocol needs: send a complete buffer, and read an exact number of
//! bytes. Both block until done or failed; there are no retries or timeouts
//! at this layer, and failures propagate up as plain I/O errors.
//!
//! The stream itself is abstracted behind the [`Wire`] trait so tests can
//! substitute scripted in-memory streams for a real socket.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

/// A bidirectional byte stream the transport can run over.
///
/// Implemented for [`TcpStream`]; test doubles implement it over buffers.
pub trait Wire: Read + Write {
    /// Shut down both directions of the stream, if applicable.
    fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Wire for TcpStream {
    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

/// A blocking, synchronous transport over a connected stream.
pub struct Transport {
    stream: Box<dyn Wire + Send>,
}

impl Transport {
    /// Connect to a TCP endpoint.
    ///
    /// Resolves the host and tries each returned address in order,
    /// keeping the first stream that connects.
    pub fn connect(host: &str, port: u16) -> io::Result<Self> {
        let mut last_err = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect(addr) {
                Ok(stream) => return Ok(Self::from_stream(stream)),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses resolved")
        }))
    }

    /// Wrap an already-connected stream.
    pub fn from_stream(stream: impl Wire + Send + 'static) -> Self {
        Self {
            stream: Box::new(stream),
        }
    }

    /// Send a complete buffer.
    ///
    /// A short write is an error; nothing is retried beyond what
    /// `write_all` itself does.
    pub fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        self.stream.write_all(buf)?;
        self.stream.flush()
    }

    /// Read exactly `buf.len()` bytes, looping on partial reads.
    ///
    /// A single receive may deliver fewer bytes than requested; this loops
    /// until the buffer is full. A zero-byte read means the peer closed the
    /// connection and fails with `UnexpectedEof` rather than spinning.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed by peer",
                    ));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Shut down the stream, ignoring errors.
    ///
    /// Close must always complete; a failed shutdown on an already-dead
    /// socket is not actionable.
    pub fn close(&mut self) {
        let _ = self.stream.shutdown();
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedWire;
    use super::*;

    #[test]
    fn test_read_exact_single_delivery() {
        let wire = ScriptedWire::new(vec![b"abcdefgh".to_vec()]);
        let mut transport = Transport::from_stream(wire);

        let mut buf = [0u8; 8];
        transport.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abcdefgh");
    }

    #[test]
    fn test_read_exact_reassembles_partial_reads() {
        // Header delivered across 3 separate short reads.
        let wire = ScriptedWire::new(vec![b"ab".to_vec(), b"cde".to_vec(), b"fgh".to_vec()]);
        let mut transport = Transport::from_stream(wire);

        let mut buf = [0u8; 8];
        transport.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abcdefgh");
    }

    #[test]
    fn test_read_exact_fails_on_peer_close() {
        // Only 3 of the 8 requested bytes ever arrive.
        let wire = ScriptedWire::new(vec![b"abc".to_vec()]);
        let mut transport = Transport::from_stream(wire);

        let mut buf = [0u8; 8];
        let err = transport.read_exact(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_read_exact_zero_bytes_is_noop() {
        let wire = ScriptedWire::new(vec![]);
        let mut transport = Transport::from_stream(wire);

        let mut buf = [0u8; 0];
        transport.read_exact(&mut buf).unwrap();
    }

    #[test]
    fn test_send_accumulates() {
        let wire = ScriptedWire::new(vec![]);
        let written = wire.written();
        let mut transport = Transport::from_stream(wire);

        transport.send(b"hello ").unwrap();
        transport.send(b"world").unwrap();
        assert_eq!(written.lock().unwrap().as_slice(), b"hello world");
    }

    #[test]
    fn test_close_shuts_down_stream() {
        let wire = ScriptedWire::new(vec![]);
        let flag = wire.shutdown_flag();
        let mut transport = Transport::from_stream(wire);

        transport.close();
        assert!(*flag.lock().unwrap());
    }

    #[test]
    fn test_connect_refused() {
        // Port 1 on loopback is essentially never listening.
        let result = Transport::connect("127.0.0.1", 1);
        assert!(result.is_err());
    }
}
