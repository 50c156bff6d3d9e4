//! AES-256 session cipher transforms.
//!
//! The established tunnel is two disjoint byte pipelines over the same
//! underlying stream. Each direction owns one stateful transform built from
//! the shared session key: [`EncryptingWriter`] on the write side,
//! [`DecryptingReader`] on the read side. The cipher is AES-256 in ECB mode
//! with no padding, so both transforms operate strictly in 16-byte blocks
//! and buffer at most one block each.
//!
//! The 16-byte IV transported with the key is not consumed by ECB; it is
//! retained on the session key for callers that chain blocks above the
//! tunnel by prepending it as plaintext.

use std::io::{self, Read, Write};

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;
use rand_core::CryptoRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::ProtocolError;

/// Plaintext bytes consumed per cipher block.
pub const BLOCK_SIZE: usize = 16;

/// Session key width: AES-256.
pub const KEY_SIZE: usize = 32;

/// Width of the transported IV.
pub const IV_SIZE: usize = 16;

/// Symmetric key material for one tunnel's lifetime.
///
/// Generated by the responder, transported to the initiator inside the
/// RSA-OAEP envelope. Zeroized on drop; never reused across tunnels.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    key: [u8; KEY_SIZE],
    iv: [u8; IV_SIZE],
}

impl SessionKey {
    /// Generate fresh key material from a cryptographic RNG.
    pub fn generate<Rng: CryptoRngCore>(rng: &mut Rng) -> Self {
        let mut key = [0u8; KEY_SIZE];
        let mut iv = [0u8; IV_SIZE];
        rng.fill_bytes(&mut key);
        rng.fill_bytes(&mut iv);
        Self { key, iv }
    }

    /// Reassemble key material decrypted from an envelope.
    ///
    /// # Errors
    ///
    /// `MalformedEnvelope` if either part has the wrong width.
    pub fn from_parts(key: &[u8], iv: &[u8]) -> Result<Self, ProtocolError> {
        if key.len() != KEY_SIZE || iv.len() != IV_SIZE {
            return Err(ProtocolError::MalformedEnvelope);
        }
        let mut session = Self {
            key: [0u8; KEY_SIZE],
            iv: [0u8; IV_SIZE],
        };
        session.key.copy_from_slice(key);
        session.iv.copy_from_slice(iv);
        Ok(session)
    }

    /// The AES-256 key.
    pub fn key(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// The transported IV.
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }
}

/// Encrypt-on-write transform for the outbound half.
///
/// Buffers plaintext until a full block accumulates, then writes the
/// encrypted block through. A trailing sub-block stays buffered until more
/// plaintext arrives or the owner pads to the boundary; ECB with no padding
/// cannot emit a partial block.
pub struct EncryptingWriter<W> {
    cipher: Aes256,
    inner: W,
    block: Zeroizing<[u8; BLOCK_SIZE]>,
    pending: usize,
}

impl<W: Write> EncryptingWriter<W> {
    /// Attach the transform to the write half of the underlying stream.
    pub fn new(session: &SessionKey, inner: W) -> Self {
        Self {
            cipher: Aes256::new(GenericArray::from_slice(session.key())),
            inner,
            block: Zeroizing::new([0u8; BLOCK_SIZE]),
            pending: 0,
        }
    }

    /// Plaintext bytes buffered below one block.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Detach and return the underlying writer.
    ///
    /// Buffered sub-block plaintext is discarded (it was never emitted).
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn emit_block(&mut self) -> io::Result<()> {
        let mut out = *self.block;
        self.cipher.encrypt_block(GenericArray::from_mut_slice(&mut out));
        self.inner.write_all(&out)?;
        self.block.zeroize();
        self.pending = 0;
        Ok(())
    }
}

impl<W: Write> Write for EncryptingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut consumed = 0;
        while consumed < buf.len() {
            let take = (BLOCK_SIZE - self.pending).min(buf.len() - consumed);
            self.block[self.pending..self.pending + take]
                .copy_from_slice(&buf[consumed..consumed + take]);
            self.pending += take;
            consumed += take;
            if self.pending == BLOCK_SIZE {
                self.emit_block()?;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // No cipher state is committed; only the underlying stream flushes.
        self.inner.flush()
    }
}

/// Decrypt-on-read transform for the inbound half.
///
/// Reads exactly one ciphertext block from the underlying stream, decrypts
/// it, and serves plaintext from the block buffer. A stream that ends at a
/// block boundary reads as clean EOF; one that ends mid-block surfaces as
/// an unexpected-EOF error.
pub struct DecryptingReader<R> {
    cipher: Aes256,
    inner: R,
    block: Zeroizing<[u8; BLOCK_SIZE]>,
    filled: usize,
    consumed: usize,
}

impl<R: Read> DecryptingReader<R> {
    /// Attach the transform to the read half of the underlying stream.
    pub fn new(session: &SessionKey, inner: R) -> Self {
        Self {
            cipher: Aes256::new(GenericArray::from_slice(session.key())),
            inner,
            block: Zeroizing::new([0u8; BLOCK_SIZE]),
            filled: 0,
            consumed: 0,
        }
    }

    /// Decrypted bytes buffered from the current block.
    pub fn buffered(&self) -> usize {
        self.filled - self.consumed
    }

    /// Drop the buffered remainder of the current block.
    ///
    /// Returns how many bytes were discarded. The sender's block-boundary
    /// flush pads with zeros; the receiver, knowing its own message
    /// boundary, discards them here.
    pub fn discard_buffered(&mut self) -> usize {
        let discarded = self.buffered();
        self.consumed = self.filled;
        discarded
    }

    /// Detach and return the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill_block(&mut self) -> io::Result<bool> {
        let mut ciphertext = [0u8; BLOCK_SIZE];
        let mut got = 0;
        while got < BLOCK_SIZE {
            match self.inner.read(&mut ciphertext[got..]) {
                Ok(0) if got == 0 => return Ok(false),
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream ended mid cipher block",
                    ))
                }
                Ok(n) => got += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        *self.block = ciphertext;
        self.cipher
            .decrypt_block(GenericArray::from_mut_slice(&mut *self.block));
        self.filled = BLOCK_SIZE;
        self.consumed = 0;
        Ok(true)
    }
}

impl<R: Read> Read for DecryptingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.consumed == self.filled && !self.fill_block()? {
            return Ok(0);
        }
        let take = self.buffered().min(buf.len());
        buf[..take].copy_from_slice(&self.block[self.consumed..self.consumed + take]);
        self.consumed += take;
        Ok(take)
    }
}
