//! Byte-stream transport underneath the protocol engine

use bytes::{Bytes, BytesMut};
use redwire_core::{ConnectionConfig, Endpoint};
use socket2::{Socket, TcpKeepalive};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::debug;

/// Byte-stream primitive the protocol engine drives
///
/// Implementations offer line-oriented and fixed-length binary reads over a
/// single connection, plus a bounded wait for readable data. `read_binary`
/// may return fewer bytes than requested; callers loop until satisfied or
/// [`eof`](Transport::eof) reports end-of-stream.
pub trait Transport {
    /// Establish the connection; succeeds without effect when already connected
    fn connect(&mut self) -> io::Result<()>;

    /// Whether the connection is currently established
    fn is_connected(&self) -> bool;

    /// Write the given bytes in full
    fn write(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Read one line with the terminator stripped; tolerates a bare `\n`
    fn read_line(&mut self) -> io::Result<String>;

    /// Read up to `max` bytes; may return fewer
    fn read_binary(&mut self, max: usize) -> io::Result<Bytes>;

    /// Whether the stream has delivered all data it ever will
    fn eof(&self) -> bool;

    /// Block until data is readable or the timeout elapses
    ///
    /// `None` blocks indefinitely. Returns whether data is readable.
    fn wait_readable(&mut self, timeout: Option<Duration>) -> io::Result<bool>;

    /// Close the connection
    fn close(&mut self);

    /// The remote endpoint as `host:port`
    fn endpoint(&self) -> String;
}

const READ_CHUNK: usize = 8192;

/// TCP implementation of [`Transport`] with an internal read buffer
pub struct TcpTransport {
    endpoint: Endpoint,
    connect_timeout: Duration,
    tcp_keepalive: Option<Duration>,
    tcp_nodelay: bool,
    stream: Option<TcpStream>,
    buffer: BytesMut,
    eof: bool,
}

impl TcpTransport {
    /// Create an unconnected transport for the given endpoint
    pub fn new(endpoint: Endpoint, config: &ConnectionConfig) -> Self {
        Self {
            endpoint,
            connect_timeout: config.connect_timeout,
            tcp_keepalive: config.tcp_keepalive,
            tcp_nodelay: config.tcp_nodelay,
            stream: None,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            eof: false,
        }
    }

    /// Read from the socket into the buffer once, marking end-of-stream on a
    /// zero-length read
    fn fill(&mut self) -> io::Result<()> {
        let stream = self.stream.as_mut().ok_or_else(not_connected)?;
        let mut chunk = [0u8; READ_CHUNK];
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            self.eof = true;
        } else {
            self.buffer.extend_from_slice(&chunk[..n]);
        }
        Ok(())
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self) -> io::Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        debug!("connecting to {}", self.endpoint);
        let addrs = (self.endpoint.host.as_str(), self.endpoint.port).to_socket_addrs()?;
        let mut stream = None;
        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(connected) => {
                    stream = Some(connected);
                    break;
                }
                Err(error) => last_error = Some(error),
            }
        }
        let stream = match stream {
            Some(stream) => stream,
            None => {
                return Err(last_error.unwrap_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::AddrNotAvailable,
                        format!("no addresses resolved for {}", self.endpoint),
                    )
                }))
            }
        };

        stream.set_nodelay(self.tcp_nodelay)?;
        let stream = if let Some(period) = self.tcp_keepalive {
            let socket = Socket::from(stream);
            socket.set_tcp_keepalive(&TcpKeepalive::new().with_time(period))?;
            TcpStream::from(socket)
        } else {
            stream
        };

        self.buffer.clear();
        self.eof = false;
        self.stream = Some(stream);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        let stream = self.stream.as_mut().ok_or_else(not_connected)?;
        stream.write_all(buf)
    }

    fn read_line(&mut self) -> io::Result<String> {
        loop {
            if let Some(position) = self.buffer.iter().position(|&byte| byte == b'\n') {
                let mut line = self.buffer.split_to(position + 1);
                line.truncate(position);
                if line.last() == Some(&b'\r') {
                    line.truncate(line.len() - 1);
                }
                return into_text(line);
            }

            if self.eof {
                if self.buffer.is_empty() {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed by server",
                    ));
                }
                let line = self.buffer.split();
                return into_text(line);
            }

            self.fill()?;
        }
    }

    fn read_binary(&mut self, max: usize) -> io::Result<Bytes> {
        if self.buffer.is_empty() && !self.eof {
            self.fill()?;
        }
        let n = max.min(self.buffer.len());
        Ok(self.buffer.split_to(n).freeze())
    }

    fn eof(&self) -> bool {
        self.eof && self.buffer.is_empty()
    }

    fn wait_readable(&mut self, timeout: Option<Duration>) -> io::Result<bool> {
        if !self.buffer.is_empty() || self.eof {
            return Ok(true);
        }
        let stream = self.stream.as_mut().ok_or_else(not_connected)?;
        let mut probe = [0u8; 1];

        match timeout {
            None => stream.peek(&mut probe).map(|_| true),
            Some(timeout) if timeout.is_zero() => {
                stream.set_nonblocking(true)?;
                let readable = match stream.peek(&mut probe) {
                    Ok(_) => Ok(true),
                    Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(false),
                    Err(error) => Err(error),
                };
                stream.set_nonblocking(false)?;
                readable
            }
            Some(timeout) => {
                stream.set_read_timeout(Some(timeout))?;
                let readable = match stream.peek(&mut probe) {
                    Ok(_) => Ok(true),
                    Err(error)
                        if matches!(
                            error.kind(),
                            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                        ) =>
                    {
                        Ok(false)
                    }
                    Err(error) => Err(error),
                };
                stream.set_read_timeout(None)?;
                readable
            }
        }
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            debug!("closing connection to {}", self.endpoint);
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    fn endpoint(&self) -> String {
        self.endpoint.to_string()
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "transport is not connected")
}

fn into_text(line: BytesMut) -> io::Result<String> {
    String::from_utf8(line.to_vec())
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))
}
