//! SealWire Tunnel
//!
//! Stream facade over the SealWire protocol core. A [`Tunnel`] wraps the
//! two halves of any blocking bidirectional byte stream, runs the mutual
//! authentication handshake, and then behaves as a plain
//! [`std::io::Read`] + [`std::io::Write`] byte stream whose bytes travel
//! AES-256-encrypted.
//!
//! # Security Invariants & Hard Failures
//!
//! - A `Tunnel` value exists only after the handshake has succeeded; every
//!   failure path destroys partially derived key material before the error
//!   escapes
//! - The peer identity exposed by [`Tunnel::remote_public_key`] is the one
//!   that was cryptographically matched during the handshake, not the one
//!   the caller proposed
//! - The session key is never renegotiated; a new tunnel requires a new
//!   handshake
//! - The session cipher has no padding: callers mark application message
//!   boundaries with [`Tunnel::flush_writer`] (zero padding to the block
//!   boundary) and discard the padding with [`Tunnel::flush_reader`]
//!
//! # Concurrency
//!
//! A tunnel is not internally synchronized. One thread may read while
//! another writes by splitting it ([`Tunnel::into_split`]); the two halves
//! share no state. Reads and writes block exactly as the underlying stream
//! blocks; timeouts are the caller's to configure on that stream.
//!
//! # Example
//!
//! ```no_run
//! use std::io::Write;
//! use std::net::TcpStream;
//!
//! use rand::rngs::OsRng;
//! use sealwire_tunnel::{LocalKey, PeerPublicKey, Tunnel, TunnelConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let local = LocalKey::generate(&mut OsRng, 2048)?;
//! let peer = PeerPublicKey::from_blob(&std::fs::read("peer.blob")?)?;
//!
//! let stream = TcpStream::connect("127.0.0.1:4433")?;
//! let reader = stream.try_clone()?;
//! let config = TunnelConfig::initiator(local, vec![peer]);
//! let mut tunnel = Tunnel::establish(&config, reader, stream)?;
//!
//! tunnel.write_all(b"hello over the wire")?;
//! tunnel.flush_writer()?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod config;
pub mod tunnel;

pub use config::{Role, TunnelConfig};
pub use tunnel::{Tunnel, TunnelReader, TunnelWriter};

pub use sealwire_core::{LocalKey, PeerPublicKey, ProtocolError, BLOCK_SIZE};
