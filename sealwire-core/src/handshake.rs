//! Mutual authentication handshake.
//!
//! Two symmetric roles drive a fixed wire exchange on the raw underlying
//! stream. Nothing is encrypted until the exchange completes:
//!
//! ```text
//! Initiator                                Responder
//!     | -- LP(initiator public-key blob) ---> |  (1)
//!     | -- 256 raw challenge bytes ---------> |  (2)
//!     | <-- LP(OAEP(LP(key) || LP(iv))) ----- |  (3)
//!     | <-- LP(responder public-key blob) --- |  (4)
//!     | <-- LP(sign_sha256(challenge)) ------ |  (5)
//! ```
//!
//! The responder writes (3) before it reads (2); the ordering is an
//! artifact of the wire format and is preserved for compatibility.
//!
//! At success each side holds proof that the peer controls the private key
//! behind a public key in its acceptable set: the responder signed the
//! initiator's fresh challenge, and the initiator demonstrated possession
//! by decrypting the session-key envelope (the responder's assurance is
//! implicit in any readable ciphertext that follows). An unacceptable
//! identity fails the handshake before any secret is exposed; every
//! failure destroys partially derived key material before returning.

use std::io::{Read, Write};

use rand_core::CryptoRngCore;
use zeroize::Zeroizing;

use crate::cipher::SessionKey;
use crate::error::ProtocolError;
use crate::keys::{LocalKey, PeerPublicKey};
use crate::wire;

/// Width of the random challenge, fixed by the protocol.
pub const CHALLENGE_SIZE: usize = 256;

/// The product of a successful handshake.
pub struct Established {
    /// Session key material to install into the cipher pipeline.
    pub session: SessionKey,
    /// The authenticated peer identity, as parsed off the wire.
    pub peer: PeerPublicKey,
}

fn trusted(peer: &PeerPublicKey, acceptable: &[PeerPublicKey]) -> bool {
    acceptable.iter().any(|key| key.matches(peer))
}

/// Run the initiator side of the handshake.
///
/// Sends the local identity and a fresh challenge, receives the session-key
/// envelope, and verifies the responder's identity and challenge signature.
///
/// # Errors
///
/// `PeerKeyUntrusted` if the responder's modulus is not in `acceptable`;
/// `PeerSignatureInvalid` if its challenge signature does not verify; any
/// I/O, framing, or cryptographic failure otherwise.
pub fn initiate<Rng, R, W>(
    rng: &mut Rng,
    local: &LocalKey,
    acceptable: &[PeerPublicKey],
    reader: &mut R,
    writer: &mut W,
) -> Result<Established, ProtocolError>
where
    Rng: CryptoRngCore,
    R: Read,
    W: Write,
{
    wire::write_blob(writer, &local.public().to_blob())?;

    let mut challenge = [0u8; CHALLENGE_SIZE];
    rng.fill_bytes(&mut challenge);
    writer.write_all(&challenge)?;
    writer.flush()?;

    let envelope = wire::read_blob(reader)?;
    let material = local.decrypt(&envelope)?;
    let mut remaining = &material[..];
    let key = Zeroizing::new(
        wire::read_blob(&mut remaining).map_err(|_| ProtocolError::MalformedEnvelope)?,
    );
    let iv = wire::read_blob(&mut remaining).map_err(|_| ProtocolError::MalformedEnvelope)?;
    if !remaining.is_empty() {
        return Err(ProtocolError::MalformedEnvelope);
    }
    let session = SessionKey::from_parts(&key, &iv)?;

    let peer = PeerPublicKey::from_blob(&wire::read_blob(reader)?)?;
    if !trusted(&peer, acceptable) {
        return Err(ProtocolError::PeerKeyUntrusted);
    }

    let signature = wire::read_blob(reader)?;
    if !peer.verify(&challenge, &signature) {
        return Err(ProtocolError::PeerSignatureInvalid);
    }

    Ok(Established { session, peer })
}

/// Run the responder side of the handshake.
///
/// Receives and vets the initiator's identity, generates the session key
/// and transports it under RSA-OAEP, then proves the local identity by
/// signing the initiator's challenge.
///
/// # Errors
///
/// `PeerKeyUntrusted` if the initiator's modulus is not in `acceptable`;
/// any I/O, framing, or cryptographic failure otherwise.
pub fn respond<Rng, R, W>(
    rng: &mut Rng,
    local: &LocalKey,
    acceptable: &[PeerPublicKey],
    reader: &mut R,
    writer: &mut W,
) -> Result<Established, ProtocolError>
where
    Rng: CryptoRngCore,
    R: Read,
    W: Write,
{
    let peer = PeerPublicKey::from_blob(&wire::read_blob(reader)?)?;
    if !trusted(&peer, acceptable) {
        return Err(ProtocolError::PeerKeyUntrusted);
    }

    let session = SessionKey::generate(rng);
    let mut material = Zeroizing::new(Vec::with_capacity(2 + session.key().len() + session.iv().len()));
    wire::write_blob(&mut *material, session.key())?;
    wire::write_blob(&mut *material, session.iv())?;
    let envelope = peer.encrypt(rng, &material)?;
    wire::write_blob(writer, &envelope)?;
    writer.flush()?;

    let mut challenge = [0u8; CHALLENGE_SIZE];
    reader.read_exact(&mut challenge)?;

    wire::write_blob(writer, &local.public().to_blob())?;
    let signature = local.sign(&challenge)?;
    wire::write_blob(writer, &signature)?;
    writer.flush()?;

    Ok(Established { session, peer })
}
