//! Socket-backed transport.
//!
//! Wraps any connected socket whose handle can be duplicated, so that
//! the codec gets independent read and write halves.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

use super::{Transport, TransportKind};

/// A connected socket the transport can hand out streams for.
pub trait Socket: Send + Sync {
    /// Stream type produced for each half.
    type Stream: Read + Write + Send + 'static;

    /// Duplicate the socket handle.
    fn try_clone_stream(&self) -> io::Result<Self::Stream>;

    /// Shut down both directions.
    fn shutdown(&self) -> io::Result<()>;
}

impl Socket for TcpStream {
    type Stream = TcpStream;

    fn try_clone_stream(&self) -> io::Result<TcpStream> {
        self.try_clone()
    }

    fn shutdown(&self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

#[cfg(unix)]
impl Socket for std::os::unix::net::UnixStream {
    type Stream = std::os::unix::net::UnixStream;

    fn try_clone_stream(&self) -> io::Result<Self::Stream> {
        self.try_clone()
    }

    fn shutdown(&self) -> io::Result<()> {
        std::os::unix::net::UnixStream::shutdown(self, Shutdown::Both)
    }
}

/// MAP transport over a connected socket.
#[derive(Debug)]
pub struct SocketTransport<S> {
    socket: S,
    kind: TransportKind,
}

impl<S: Socket> SocketTransport<S> {
    /// Wrap a connected socket.
    pub fn new(socket: S, kind: TransportKind) -> Self {
        Self { socket, kind }
    }
}

impl<S: Socket> Transport for SocketTransport<S> {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn open_input(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(self.socket.try_clone_stream()?))
    }

    fn open_output(&self) -> io::Result<Box<dyn Write + Send>> {
        Ok(Box::new(self.socket.try_clone_stream()?))
    }

    fn close(&self) -> io::Result<()> {
        match self.socket.shutdown() {
            // Peer already went away
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::transport::MAX_PACKET_SIZE;
    use std::os::unix::net::UnixStream;

    #[test]
    fn test_socket_transport_streams() {
        let (local, mut remote) = UnixStream::pair().unwrap();
        let transport = SocketTransport::new(local, TransportKind::Rfcomm);

        let mut output = transport.open_output().unwrap();
        output.write_all(b"\x80\x00\x07").unwrap();

        let mut buf = [0u8; 3];
        remote.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"\x80\x00\x07");

        remote.write_all(b"\xa0").unwrap();
        let mut input = transport.open_input().unwrap();
        let mut byte = [0u8; 1];
        input.read_exact(&mut byte).unwrap();
        assert_eq!(byte[0], 0xa0);
    }

    #[test]
    fn test_socket_transport_capabilities() {
        let (local, _remote) = UnixStream::pair().unwrap();
        let transport = SocketTransport::new(local, TransportKind::L2cap);

        assert!(transport.is_srm_capable());
        assert_eq!(transport.max_packet_size(), MAX_PACKET_SIZE);
        assert_eq!(transport.kind(), TransportKind::L2cap);
    }

    #[test]
    fn test_socket_transport_close_is_repeatable() {
        let (local, _remote) = UnixStream::pair().unwrap();
        let transport = SocketTransport::new(local, TransportKind::Rfcomm);

        transport.close().unwrap();
        transport.close().unwrap();
    }
}
