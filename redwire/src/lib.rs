//! Synchronous RESP2 client for Redis-compatible servers
//!
//! `redwire` implements the client side of the Redis Serialization Protocol
//! (RESP, version 2): it connects to a server, optionally authenticates,
//! encodes commands into request frames and decodes reply frames, including
//! nested arrays, into [`Value`]s. I/O is blocking; there is no pooling,
//! pipelining or reconnection layer.
//!
//! # Quick Start
//!
//! ```no_run
//! use redwire::RedisProtocol;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut redis = RedisProtocol::open("redis://localhost")?;
//!
//!     redis.command(&["SET", "key", "value"])?;
//!     let value = redis.command(&["GET", "key"])?;
//!     println!("{:?}", value.as_str());
//!
//!     Ok(())
//! }
//! ```
//!
//! Authentication is taken from the connection string's user-info component
//! (`redis://secret@host`) or set explicitly via
//! [`ConnectionConfig::with_password`]. For protocol operations outside the
//! one-shot request/reply model, such as SUBSCRIBE, use
//! [`RedisProtocol::send`] and [`RedisProtocol::receive`].

#![deny(warnings)]
#![warn(missing_docs)]

pub mod protocol;
pub mod transport;

pub use protocol::RedisProtocol;
pub use transport::{TcpTransport, Transport};

pub use redwire_core::{
    ConnectionConfig, Endpoint, RedisError, RedisResult, Secret, Value,
};
