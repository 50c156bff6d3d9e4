//! Tunnel configuration.

use sealwire_core::{LocalKey, PeerPublicKey};

/// Role in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Opens the exchange: sends its identity and the challenge first.
    Initiator,
    /// Answers the exchange: generates and transports the session key.
    Responder,
}

/// Configuration for establishing a tunnel.
///
/// Carries the local private identity and the set of remote identities this
/// peer is willing to authenticate against. Key storage and distribution
/// are the caller's concern; the tunnel only consumes the result.
#[derive(Debug)]
pub struct TunnelConfig {
    /// The local long-lived key pair.
    pub local: LocalKey,
    /// Remote public keys acceptable as the peer's identity.
    pub acceptable: Vec<PeerPublicKey>,
    /// Which side of the handshake this peer drives.
    pub role: Role,
}

impl TunnelConfig {
    /// Configuration for the initiating side.
    pub fn initiator(local: LocalKey, acceptable: Vec<PeerPublicKey>) -> Self {
        Self {
            local,
            acceptable,
            role: Role::Initiator,
        }
    }

    /// Configuration for the responding side.
    pub fn responder(local: LocalKey, acceptable: Vec<PeerPublicKey>) -> Self {
        Self {
            local,
            acceptable,
            role: Role::Responder,
        }
    }
}
