//! Core types for the `redwire` Redis protocol client
//!
//! This crate provides the fundamental, I/O-free types used throughout the
//! redwire client library: the decoded RESP value, the error taxonomy, the
//! opaque credential wrapper, and connection configuration.

#![deny(warnings)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod secret;
pub mod value;

pub use config::{ConnectionConfig, Endpoint};
pub use error::{RedisError, RedisResult};
pub use secret::Secret;
pub use value::Value;
