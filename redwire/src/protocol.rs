//! RESP2 protocol engine
//!
//! Connects to a Redis-compatible server, optionally authenticates, encodes
//! command frames and decodes reply frames read from the live transport.

use crate::transport::{TcpTransport, Transport};
use bytes::{BufMut, BytesMut};
use redwire_core::{ConnectionConfig, RedisError, RedisResult, Secret, Value};
use std::fmt;
use std::time::Duration;
use tracing::debug;

const CRLF: &[u8] = b"\r\n";

/// Upper bound on a single binary read while accumulating a bulk-string body
const BULK_CHUNK: usize = 8192;

/// Connection lifecycle; `Closed` is terminal, `Unconnected` is not
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unconnected,
    Ready,
    Closed,
}

/// RESP2 protocol engine over a [`Transport`]
///
/// The connection is established lazily: the first [`command`], [`send`] or
/// [`receive`] call connects and authenticates if [`connect`] has not been
/// called explicitly. Once closed, an engine is not reusable; create a new
/// one to reconnect. Dropping the engine closes the connection.
///
/// [`command`]: RedisProtocol::command
/// [`send`]: RedisProtocol::send
/// [`receive`]: RedisProtocol::receive
/// [`connect`]: RedisProtocol::connect
pub struct RedisProtocol<T: Transport = TcpTransport> {
    conn: T,
    auth: Option<Secret>,
    state: State,
}

impl RedisProtocol<TcpTransport> {
    /// Create an engine for the given connection string or configuration
    ///
    /// The credential is taken from the configuration's password if set,
    /// otherwise from the connection string's user-info component. No
    /// connection is made until first use.
    ///
    /// ```no_run
    /// use redwire::RedisProtocol;
    ///
    /// # fn main() -> redwire::RedisResult<()> {
    /// let mut redis = RedisProtocol::open("redis://secret@redis.internal:16379")?;
    /// redis.connect()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(config: impl Into<ConnectionConfig>) -> RedisResult<Self> {
        let config = config.into();
        let endpoint = config.endpoint()?;
        let auth = config.authentication();
        Ok(Self::new(TcpTransport::new(endpoint, &config), auth))
    }
}

impl<T: Transport> RedisProtocol<T> {
    /// Create an engine over a pre-built transport
    pub fn new(conn: T, auth: Option<Secret>) -> Self {
        Self {
            conn,
            auth,
            state: State::Unconnected,
        }
    }

    /// The credential this engine authenticates with, if any
    pub fn authentication(&self) -> Option<&Secret> {
        self.auth.as_ref()
    }

    /// The remote endpoint as `host:port`
    pub fn endpoint(&self) -> String {
        self.conn.endpoint()
    }

    /// Connect and authenticate, if necessary
    ///
    /// Does nothing when the connection is already up. A transport-level
    /// failure surfaces as [`RedisError::Connect`] without an authentication
    /// attempt; a rejected AUTH closes the connection before
    /// [`RedisError::Authentication`] is returned.
    pub fn connect(&mut self) -> RedisResult<&mut Self> {
        if self.state == State::Closed {
            return Err(RedisError::ConnectionClosed);
        }
        if self.conn.is_connected() {
            self.state = State::Ready;
            return Ok(self);
        }

        self.conn
            .connect()
            .map_err(|error| RedisError::Connect(error.to_string()))?;

        // Written by hand rather than through command() so the credential
        // never passes through the shared encode or error paths.
        if let Some(auth) = &self.auth {
            let pass = auth.reveal();
            let mut frame = BytesMut::with_capacity(24 + pass.len());
            frame.put_slice(b"*2\r\n$4\r\nAUTH\r\n$");
            frame.put_slice(pass.len().to_string().as_bytes());
            frame.put_slice(CRLF);
            frame.put_slice(pass);
            frame.put_slice(CRLF);

            self.conn.write(&frame)?;
            let reply = self.conn.read_line()?;
            if reply != "+OK" {
                self.conn.close();
                self.state = State::Closed;
                return Err(RedisError::Authentication {
                    response: reply,
                    credential: auth.clone(),
                });
            }
            debug!("authenticated to {}", self.conn.endpoint());
        }

        self.state = State::Ready;
        Ok(self)
    }

    /// Send one command and read its reply
    ///
    /// Arguments are encoded as a RESP array of bulk strings using their
    /// exact byte lengths. Connects and authenticates first if necessary.
    /// A server error reply surfaces as [`RedisError::Protocol`].
    pub fn command<A: AsRef<[u8]>>(&mut self, args: &[A]) -> RedisResult<Value> {
        if args.is_empty() {
            return Err(RedisError::Protocol(
                "cannot encode an empty command".to_string(),
            ));
        }

        let frame = encode_command(args);
        self.ensure_connected()?;
        self.conn.write(&frame)?;
        self.read_value()
    }

    /// Send a raw protocol line, appending the terminator when missing
    ///
    /// Bypasses the command encoder; intended for operations such as
    /// SUBSCRIBE whose replies do not follow the one-shot request/reply
    /// model. Use [`receive`](RedisProtocol::receive) to pick up whatever
    /// the server pushes.
    pub fn send(&mut self, line: &str) -> RedisResult<()> {
        self.ensure_connected()?;
        if line.ends_with("\r\n") {
            self.conn.write(line.as_bytes())?;
        } else {
            let mut buf = BytesMut::with_capacity(line.len() + 2);
            buf.put_slice(line.as_bytes());
            buf.put_slice(CRLF);
            self.conn.write(&buf)?;
        }
        Ok(())
    }

    /// Wait for one message, returning `None` when the timeout elapses first
    ///
    /// A timeout of `None` blocks indefinitely. When data arrives, exactly
    /// one reply frame is decoded.
    pub fn receive(&mut self, timeout: Option<Duration>) -> RedisResult<Option<Value>> {
        self.ensure_connected()?;
        if self.conn.wait_readable(timeout)? {
            self.read_value().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Close the connection
    ///
    /// No-op when already closed or never connected. The engine cannot be
    /// used afterwards.
    pub fn close(&mut self) {
        if self.conn.is_connected() {
            self.conn.close();
        }
        self.state = State::Closed;
    }

    fn ensure_connected(&mut self) -> RedisResult<()> {
        if self.state == State::Closed {
            return Err(RedisError::ConnectionClosed);
        }
        if self.conn.is_connected() {
            return Ok(());
        }
        self.connect().map(|_| ())
    }

    /// Decode exactly one reply frame, recursing for arrays
    fn read_value(&mut self) -> RedisResult<Value> {
        let line = self.conn.read_line()?;
        let Some(&prefix) = line.as_bytes().first() else {
            return Err(RedisError::Protocol("empty reply line".to_string()));
        };
        let rest = line.get(1..).unwrap_or_default();

        match prefix {
            b':' => rest.parse::<i64>().map(Value::Integer).map_err(|_| {
                RedisError::Protocol(format!("invalid integer reply: {rest:?}"))
            }),

            b'+' => Ok(Value::Simple(rest.to_string())),

            b'$' => match parse_length(rest, "bulk string")? {
                None => Ok(Value::Null),
                Some(length) => {
                    let mut body = BytesMut::with_capacity(length);
                    while body.len() < length && !self.conn.eof() {
                        let chunk = self.conn.read_binary(BULK_CHUNK.min(length - body.len()))?;
                        body.put_slice(&chunk);
                    }
                    if body.len() < length {
                        return Err(RedisError::Protocol(format!(
                            "bulk string truncated at {} of {} bytes",
                            body.len(),
                            length
                        )));
                    }
                    self.conn.read_binary(2)?; // trailing "\r\n"
                    Ok(Value::Bulk(body.freeze()))
                }
            },

            b'*' => match parse_length(rest, "array")? {
                None => Ok(Value::Null),
                Some(length) => {
                    let mut items = Vec::with_capacity(length);
                    for _ in 0..length {
                        items.push(self.read_value()?);
                    }
                    Ok(Value::Array(items))
                }
            },

            b'-' => Err(RedisError::Protocol(rest.to_string())),

            other => Err(RedisError::Protocol(format!(
                "unexpected reply prefix {:?}",
                other as char
            ))),
        }
    }
}

impl<T: Transport> Drop for RedisProtocol<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: Transport> fmt::Debug for RedisProtocol<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisProtocol")
            .field("endpoint", &self.conn.endpoint())
            .field("auth", &self.auth)
            .field("state", &self.state)
            .finish()
    }
}

/// Encode an argument list as a RESP array of bulk strings
fn encode_command<A: AsRef<[u8]>>(args: &[A]) -> BytesMut {
    let mut frame = BytesMut::new();
    frame.put_u8(b'*');
    frame.put_slice(args.len().to_string().as_bytes());
    frame.put_slice(CRLF);
    for arg in args {
        let bytes = arg.as_ref();
        frame.put_u8(b'$');
        frame.put_slice(bytes.len().to_string().as_bytes());
        frame.put_slice(CRLF);
        frame.put_slice(bytes);
        frame.put_slice(CRLF);
    }
    frame
}

/// Parse a `$`/`*` header length; `-1` means null
fn parse_length(text: &str, kind: &str) -> RedisResult<Option<usize>> {
    let length = text
        .parse::<i64>()
        .map_err(|_| RedisError::Protocol(format!("invalid {kind} length: {text:?}")))?;
    match length {
        -1 => Ok(None),
        n if n >= 0 => Ok(Some(n as usize)),
        n => Err(RedisError::Protocol(format!("invalid {kind} length: {n}"))),
    }
}
