//! RSA identity keys and their wire blob form.
//!
//! Peers identify each other by long-lived RSA key pairs. On the wire a
//! public key travels as a CSP public-key blob, reproduced byte-exactly for
//! interoperability:
//!
//! ```text
//! +-------+-------+----------+-----------+  BLOBHEADER (8 bytes)
//! | 0x06  | 0x02  | 0x0000   | algId LE  |
//! +-------+-------+----------+-----------+
//! | "RSA1" magic  | bitlen LE | pubexp LE |  RSAPUBKEY (12 bytes)
//! +---------------+-----------+-----------+
//! | modulus, bitlen/8 bytes, little-endian |
//! +----------------------------------------+
//! ```
//!
//! Identity matching is modulus byte-equality: a parsed remote key is
//! trusted only when its modulus equals that of a member of the caller's
//! acceptable set.
//!
//! The envelope cipher is RSA-OAEP with a SHA-1 digest (the only OAEP
//! variant the source ecosystem emits); challenge signatures are
//! PKCS#1 v1.5 over SHA-256.

use std::fmt;

use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Oaep, RsaPrivateKey, RsaPublicKey};
use rand_core::CryptoRngCore;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::ProtocolError;

/// Public-key blob type byte.
const BLOB_TYPE_PUBLIC: u8 = 0x06;
/// Blob format version.
const BLOB_VERSION: u8 = 0x02;
/// CALG_RSA_KEYX: RSA used for key exchange.
const ALG_RSA_KEYX: u32 = 0x0000_a400;
/// CALG_RSA_SIGN: RSA used for signing. Accepted on parse.
const ALG_RSA_SIGN: u32 = 0x0000_2400;
/// "RSA1" in little-endian byte order.
const RSA1_MAGIC: u32 = 0x3141_5352;
/// BLOBHEADER + RSAPUBKEY.
const BLOB_HEADER_LENGTH: usize = 20;

/// A peer's public RSA identity.
///
/// Construction happens either from a wire blob ([`PeerPublicKey::from_blob`])
/// or from the public half of a [`LocalKey`]. Cheap to clone; carries no
/// secret material.
#[derive(Clone, PartialEq, Eq)]
pub struct PeerPublicKey {
    key: RsaPublicKey,
}

impl PeerPublicKey {
    /// Wrap an already-parsed RSA public key.
    pub fn new(key: RsaPublicKey) -> Self {
        Self { key }
    }

    /// Serialize to the CSP public-key blob wire form.
    pub fn to_blob(&self) -> Vec<u8> {
        let modulus_length = self.key.size();
        let mut blob = Vec::with_capacity(BLOB_HEADER_LENGTH + modulus_length);

        blob.push(BLOB_TYPE_PUBLIC);
        blob.push(BLOB_VERSION);
        blob.extend_from_slice(&0u16.to_le_bytes());
        blob.extend_from_slice(&ALG_RSA_KEYX.to_le_bytes());

        blob.extend_from_slice(&RSA1_MAGIC.to_le_bytes());
        blob.extend_from_slice(&((modulus_length * 8) as u32).to_le_bytes());

        // CSP blobs carry a 32-bit public exponent.
        let e = self.key.e().to_bytes_le();
        let mut exponent = [0u8; 4];
        let width = e.len().min(4);
        exponent[..width].copy_from_slice(&e[..width]);
        blob.extend_from_slice(&exponent);

        let mut modulus = self.key.n().to_bytes_le();
        modulus.resize(modulus_length, 0);
        blob.extend_from_slice(&modulus);

        blob
    }

    /// Parse a CSP public-key blob.
    ///
    /// # Errors
    ///
    /// `MalformedKeyBlob` if the header, magic, algorithm, bit length, or
    /// modulus do not form a valid public key.
    pub fn from_blob(blob: &[u8]) -> Result<Self, ProtocolError> {
        if blob.len() < BLOB_HEADER_LENGTH {
            return Err(ProtocolError::MalformedKeyBlob);
        }
        if blob[0] != BLOB_TYPE_PUBLIC || blob[1] != BLOB_VERSION {
            return Err(ProtocolError::MalformedKeyBlob);
        }
        if blob[2] != 0 || blob[3] != 0 {
            return Err(ProtocolError::MalformedKeyBlob);
        }
        let algorithm = u32::from_le_bytes([blob[4], blob[5], blob[6], blob[7]]);
        if algorithm != ALG_RSA_KEYX && algorithm != ALG_RSA_SIGN {
            return Err(ProtocolError::MalformedKeyBlob);
        }
        let magic = u32::from_le_bytes([blob[8], blob[9], blob[10], blob[11]]);
        if magic != RSA1_MAGIC {
            return Err(ProtocolError::MalformedKeyBlob);
        }

        let bitlen = u32::from_le_bytes([blob[12], blob[13], blob[14], blob[15]]) as usize;
        if bitlen == 0 || bitlen % 8 != 0 {
            return Err(ProtocolError::MalformedKeyBlob);
        }
        let modulus_length = bitlen / 8;
        if blob.len() != BLOB_HEADER_LENGTH + modulus_length {
            return Err(ProtocolError::MalformedKeyBlob);
        }

        let exponent = u32::from_le_bytes([blob[16], blob[17], blob[18], blob[19]]);
        let modulus = BigUint::from_bytes_le(&blob[BLOB_HEADER_LENGTH..]);

        let key = RsaPublicKey::new(modulus, BigUint::from(exponent))
            .map_err(|_| ProtocolError::MalformedKeyBlob)?;
        Ok(Self { key })
    }

    /// Whether this key's modulus byte-equals `other`'s.
    pub fn matches(&self, other: &PeerPublicKey) -> bool {
        self.key.n() == other.key.n()
    }

    /// Short identity fingerprint for out-of-band verification.
    ///
    /// First 8 bytes of SHA-256 over the wire blob, as 16 hex characters.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.to_blob());
        hex::encode(&digest[..8])
    }

    /// Encrypt `plaintext` to this key with RSA-OAEP.
    ///
    /// # Errors
    ///
    /// `EncryptFailed` if the plaintext does not fit the OAEP capacity of
    /// the modulus.
    pub fn encrypt<Rng: CryptoRngCore>(
        &self,
        rng: &mut Rng,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, ProtocolError> {
        self.key
            .encrypt(rng, Oaep::new::<Sha1>(), plaintext)
            .map_err(|_| ProtocolError::EncryptFailed)
    }

    /// Verify a PKCS#1 v1.5 SHA-256 signature over `message`.
    ///
    /// A malformed signature encoding verifies as `false`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = Signature::try_from(signature) else {
            return false;
        };
        VerifyingKey::<Sha256>::new(self.key.clone())
            .verify(message, &signature)
            .is_ok()
    }
}

impl fmt::Debug for PeerPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerPublicKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// The local long-lived RSA key pair.
///
/// Holds the private half; never serialized by this crate. Supplied by the
/// caller and expected to outlive any tunnel built on it.
#[derive(Clone)]
pub struct LocalKey {
    private: RsaPrivateKey,
    public: PeerPublicKey,
}

impl LocalKey {
    /// Generate a fresh key pair.
    ///
    /// # Errors
    ///
    /// `KeyGenerationFailed` if prime generation fails.
    pub fn generate<Rng: CryptoRngCore>(rng: &mut Rng, bits: usize) -> Result<Self, ProtocolError> {
        let private =
            RsaPrivateKey::new(rng, bits).map_err(|_| ProtocolError::KeyGenerationFailed)?;
        Ok(Self::from_private(private))
    }

    /// Wrap an existing private key.
    pub fn from_private(private: RsaPrivateKey) -> Self {
        let public = PeerPublicKey::new(private.to_public_key());
        Self { private, public }
    }

    /// The public half of this identity.
    pub fn public(&self) -> &PeerPublicKey {
        &self.public
    }

    /// Decrypt an RSA-OAEP ciphertext with the private key.
    ///
    /// The plaintext is returned zeroizing: session-key material flows
    /// through here.
    ///
    /// # Errors
    ///
    /// `DecryptFailed` on any OAEP failure.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, ProtocolError> {
        self.private
            .decrypt(Oaep::new::<Sha1>(), ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| ProtocolError::DecryptFailed)
    }

    /// Produce a PKCS#1 v1.5 SHA-256 signature over `message`.
    ///
    /// # Errors
    ///
    /// `SignFailed` if signing fails.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        SigningKey::<Sha256>::new(self.private.clone())
            .try_sign(message)
            .map(|signature| signature.to_vec())
            .map_err(|_| ProtocolError::SignFailed)
    }
}

impl fmt::Debug for LocalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never render the private half.
        f.debug_struct("LocalKey")
            .field("fingerprint", &self.public.fingerprint())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use std::sync::OnceLock;

    fn test_key() -> &'static LocalKey {
        static KEY: OnceLock<LocalKey> = OnceLock::new();
        KEY.get_or_init(|| LocalKey::generate(&mut OsRng, 2048).unwrap())
    }

    #[test]
    fn blob_layout_is_exact() {
        let blob = test_key().public().to_blob();
        assert_eq!(blob.len(), 20 + 256);
        // BLOBHEADER
        assert_eq!(blob[0], 0x06);
        assert_eq!(blob[1], 0x02);
        assert_eq!(&blob[2..4], &[0, 0]);
        assert_eq!(&blob[4..8], &0x0000_a400u32.to_le_bytes());
        // RSAPUBKEY
        assert_eq!(&blob[8..12], b"RSA1");
        assert_eq!(&blob[12..16], &2048u32.to_le_bytes());
        assert_eq!(&blob[16..20], &65537u32.to_le_bytes());
    }

    #[test]
    fn blob_round_trips() {
        let public = test_key().public();
        let parsed = PeerPublicKey::from_blob(&public.to_blob()).unwrap();
        assert!(parsed.matches(public));
        assert_eq!(parsed.fingerprint(), public.fingerprint());
    }

    #[test]
    fn parse_rejects_malformed_blobs() {
        let blob = test_key().public().to_blob();

        let truncated = &blob[..blob.len() - 1];
        assert!(matches!(
            PeerPublicKey::from_blob(truncated),
            Err(ProtocolError::MalformedKeyBlob)
        ));

        let mut bad_magic = blob.clone();
        bad_magic[8] = b'X';
        assert!(matches!(
            PeerPublicKey::from_blob(&bad_magic),
            Err(ProtocolError::MalformedKeyBlob)
        ));

        let mut bad_type = blob.clone();
        bad_type[0] = 0x07;
        assert!(matches!(
            PeerPublicKey::from_blob(&bad_type),
            Err(ProtocolError::MalformedKeyBlob)
        ));

        let mut bad_bitlen = blob;
        bad_bitlen[12] = 0x01;
        assert!(matches!(
            PeerPublicKey::from_blob(&bad_bitlen),
            Err(ProtocolError::MalformedKeyBlob)
        ));
    }

    #[test]
    fn sign_verify_round_trips() {
        let key = test_key();
        let message = b"challenge bytes";
        let signature = key.sign(message).unwrap();
        assert!(key.public().verify(message, &signature));
    }

    #[test]
    fn tampered_signature_fails() {
        let key = test_key();
        let message = b"challenge bytes";
        let mut signature = key.sign(message).unwrap();
        signature[0] ^= 0x01;
        assert!(!key.public().verify(message, &signature));
        assert!(!key.public().verify(b"other message", &key.sign(message).unwrap()));
        assert!(!key.public().verify(message, &[0u8; 256]));
        assert!(!key.public().verify(message, b"not a signature"));
    }

    #[test]
    fn oaep_round_trips() {
        let key = test_key();
        let plaintext = b"session key material";
        let ciphertext = key.public().encrypt(&mut OsRng, plaintext).unwrap();
        assert_ne!(&ciphertext[..], &plaintext[..]);
        assert_eq!(&key.decrypt(&ciphertext).unwrap()[..], &plaintext[..]);
    }

    #[test]
    fn oaep_rejects_tampered_ciphertext() {
        let key = test_key();
        let mut ciphertext = key.public().encrypt(&mut OsRng, b"secret").unwrap();
        ciphertext[0] ^= 0xff;
        assert!(matches!(
            key.decrypt(&ciphertext),
            Err(ProtocolError::DecryptFailed)
        ));
    }

    #[test]
    fn debug_is_redacted() {
        let rendered = format!("{:?}", test_key());
        assert!(rendered.contains("fingerprint"));
        assert!(!rendered.contains("private"));
    }
}
