//! SealWire Protocol Core
//!
//! Authenticated encrypted tunnel protocol over an arbitrary bidirectional
//! byte stream. Two peers, each holding a long-lived RSA key pair, mutually
//! authenticate via a challenge-response handshake, agree on a symmetric
//! session key, and thereafter exchange application bytes confidentially.
//!
//! This crate provides:
//! - Length-prefixed wire codec with strict bounds checking
//! - RSA identity keys and their CSP public-key blob form
//! - The initiator/responder handshake engine
//! - AES-256 block-cipher stream transforms for the established session
//!
//! The stream facade that applications read from and write to lives in
//! `sealwire-tunnel`.
//!
//! # Security Invariants & Hard Failures
//!
//! - Any handshake failure is terminal; partially derived key material is
//!   zeroized before the error escapes
//! - The session key travels exactly once, RSA-OAEP-encrypted to the
//!   initiator's public key; it is never renegotiated
//! - A peer whose modulus is not in the acceptable set is rejected before
//!   any secret is exposed
//! - Any bounds violation on the wire terminates the handshake
//! - Direct use of `unsafe` is forbidden (#![forbid(unsafe_code)])
//!
//! # Caveats
//!
//! The session cipher is AES-256-ECB with no padding, fixed by the wire
//! protocol. ECB is ordinarily unsafe for structured plaintext; callers are
//! responsible for arranging non-repeating plaintext blocks (the transported
//! IV is surfaced for exactly that purpose). Post-handshake ciphertext
//! carries no MAC: callers requiring integrity must layer one above the
//! tunnel.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod cipher;
pub mod error;
pub mod handshake;
pub mod keys;
pub mod wire;

pub use cipher::{DecryptingReader, EncryptingWriter, SessionKey, BLOCK_SIZE};
pub use error::ProtocolError;
pub use handshake::{initiate, respond, Established, CHALLENGE_SIZE};
pub use keys::{LocalKey, PeerPublicKey};
