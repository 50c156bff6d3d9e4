//! Protocol errors.
//!
//! All handshake errors are terminal. There is no recovery and no retry:
//! when an error surfaces, the half-built tunnel has already been torn down
//! and its key material zeroized.
//!
//! Two of the variants are not faults but protocol outcomes: the identity
//! rejections (`PeerKeyUntrusted`, `PeerSignatureInvalid`). Callers that
//! want to treat them as a policy decision rather than an error can test
//! [`ProtocolError::is_identity_rejection`].

use std::fmt;
use std::io;

/// All possible protocol errors.
#[derive(Debug)]
pub enum ProtocolError {
    // --- Identity rejection (normal-flow outcomes) ---
    /// Peer's public-key modulus is not in the acceptable set.
    PeerKeyUntrusted,

    /// Peer's signature over the challenge did not verify.
    PeerSignatureInvalid,

    // --- Cryptographic failures (terminal) ---
    /// RSA-OAEP encryption of the session-key envelope failed.
    EncryptFailed,

    /// RSA-OAEP decryption of the session-key envelope failed.
    DecryptFailed,

    /// Signing the challenge with the local private key failed.
    SignFailed,

    /// Key generation failed.
    KeyGenerationFailed,

    /// Decrypted session-key envelope did not contain `key || iv` with the
    /// expected sizes.
    MalformedEnvelope,

    // --- I/O and framing failures (terminal) ---
    /// Underlying stream error (including short reads).
    Io(io::Error),

    /// Length prefix does not terminate within its maximum width.
    LengthOverflow,

    /// Length prefix announces a blob above the wire bound.
    BlobTooLarge,

    /// Public-key blob is not a well-formed RSA public-key blob.
    MalformedKeyBlob,

    /// Length-prefixed string is not valid UTF-8.
    InvalidUtf8,
}

impl ProtocolError {
    /// Whether this is an identity-rejection outcome rather than a fault.
    ///
    /// Identity rejections are the normal-flow "we do not trust this peer"
    /// results; everything else is a cryptographic, I/O, or framing failure.
    pub fn is_identity_rejection(&self) -> bool {
        matches!(self, Self::PeerKeyUntrusted | Self::PeerSignatureInvalid)
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Deliberately terse. Do not leak details.
        match self {
            Self::PeerKeyUntrusted => write!(f, "peer key not in acceptable set"),
            Self::PeerSignatureInvalid => write!(f, "peer challenge signature invalid"),
            Self::EncryptFailed => write!(f, "envelope encryption failed"),
            Self::DecryptFailed => write!(f, "envelope decryption failed"),
            Self::SignFailed => write!(f, "challenge signing failed"),
            Self::KeyGenerationFailed => write!(f, "key generation failed"),
            Self::MalformedEnvelope => write!(f, "malformed session-key envelope"),
            Self::Io(e) => write!(f, "stream error: {}", e),
            Self::LengthOverflow => write!(f, "length prefix overflow"),
            Self::BlobTooLarge => write!(f, "blob too large"),
            Self::MalformedKeyBlob => write!(f, "malformed public-key blob"),
            Self::InvalidUtf8 => write!(f, "string is not valid utf-8"),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ProtocolError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ProtocolError> for io::Error {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::Io(inner) => inner,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
