//! The tunnel facade.
//!
//! Post-handshake the tunnel is two disjoint byte pipelines over the same
//! underlying stream: the read half owns the decryptor, the write half owns
//! the encryptor, and neither shares state with the other. That is what
//! makes one thread reading while another writes safe without locks.
//!
//! Byte counters advance on every successful application read/write and
//! are used to reason about block alignment; the zero padding emitted by
//! [`TunnelWriter::flush_writer`] is deliberately invisible to them.

use std::io::{self, Read, Write};

use rand::rngs::OsRng;

use sealwire_core::cipher::{DecryptingReader, EncryptingWriter, BLOCK_SIZE, IV_SIZE};
use sealwire_core::handshake::{self, Established};
use sealwire_core::{PeerPublicKey, ProtocolError};

use crate::config::{Role, TunnelConfig};

/// The read half of a tunnel: decrypt-on-read plus its byte counter.
pub struct TunnelReader<R> {
    inner: DecryptingReader<R>,
    bytes_read: u64,
}

impl<R: Read> TunnelReader<R> {
    /// Application bytes read since the handshake completed.
    ///
    /// Padding discarded by [`flush_reader`](Self::flush_reader) is not
    /// counted.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Discard up to the next block boundary.
    ///
    /// The peer's block-boundary flush pads its trailing block with zeros;
    /// the receiver, knowing its own application message length, drops them
    /// here. Returns how many pad bytes were discarded (zero when already
    /// aligned).
    pub fn flush_reader(&mut self) -> usize {
        self.inner.discard_buffered()
    }

    /// Detach and return the underlying read half.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

impl<R: Read> Read for TunnelReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

/// The write half of a tunnel: encrypt-on-write plus its byte counter.
pub struct TunnelWriter<W> {
    inner: EncryptingWriter<W>,
    bytes_written: u64,
}

impl<W: Write> TunnelWriter<W> {
    /// Application bytes written since the handshake completed.
    ///
    /// Padding emitted by [`flush_writer`](Self::flush_writer) is not
    /// counted.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Pad to the block boundary and flush the underlying stream.
    ///
    /// The cipher has no padding mode, so a trailing sub-block would
    /// otherwise sit in the encryptor forever. Called after an
    /// application-level message boundary to force ciphertext delivery;
    /// the receiver discards the zero padding via
    /// [`TunnelReader::flush_reader`].
    pub fn flush_writer(&mut self) -> io::Result<()> {
        let pending = self.inner.pending();
        if pending != 0 {
            let pad = [0u8; BLOCK_SIZE];
            self.inner.write_all(&pad[..BLOCK_SIZE - pending])?;
        }
        self.inner.flush()
    }

    /// Detach and return the underlying write half.
    ///
    /// Any sub-block plaintext still pending in the encryptor is discarded.
    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

impl<W: Write> Write for TunnelWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        // Flushes the underlying stream only; no cipher state is committed.
        self.inner.flush()
    }
}

/// An authenticated duplex channel over one underlying stream.
///
/// Created exclusively by [`Tunnel::establish`]; if the handshake fails, no
/// tunnel value ever exists and the error carries the cause. Reads and
/// writes transform every byte through the session cipher.
pub struct Tunnel<R, W> {
    reader: TunnelReader<R>,
    writer: TunnelWriter<W>,
    peer: PeerPublicKey,
    iv: [u8; IV_SIZE],
}

impl<R: Read, W: Write> Tunnel<R, W> {
    /// Run the handshake on the given stream halves and build the tunnel.
    ///
    /// The two halves must belong to the same bidirectional stream (for a
    /// `TcpStream`, a `try_clone` pair). Entropy is drawn from the OS
    /// CSPRNG.
    ///
    /// # Errors
    ///
    /// `PeerKeyUntrusted` / `PeerSignatureInvalid` when the peer fails
    /// authentication; any I/O, framing, or cryptographic failure
    /// otherwise. Session-key material derived before the failure is
    /// zeroized; the stream halves are dropped with the error unless the
    /// caller kept its own handles.
    pub fn establish(config: &TunnelConfig, mut reader: R, mut writer: W) -> Result<Self, ProtocolError> {
        let mut rng = OsRng;
        let Established { session, peer } = match config.role {
            Role::Initiator => handshake::initiate(
                &mut rng,
                &config.local,
                &config.acceptable,
                &mut reader,
                &mut writer,
            )?,
            Role::Responder => handshake::respond(
                &mut rng,
                &config.local,
                &config.acceptable,
                &mut reader,
                &mut writer,
            )?,
        };

        Ok(Self {
            reader: TunnelReader {
                inner: DecryptingReader::new(&session, reader),
                bytes_read: 0,
            },
            writer: TunnelWriter {
                inner: EncryptingWriter::new(&session, writer),
                bytes_written: 0,
            },
            peer,
            iv: *session.iv(),
            // `session` drops here and zeroizes; the transforms hold the
            // only remaining copy of the key schedule.
        })
    }

    /// Plaintext bytes consumed per cipher block.
    pub fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    /// The authenticated peer identity.
    pub fn remote_public_key(&self) -> &PeerPublicKey {
        &self.peer
    }

    /// The IV transported with the session key.
    ///
    /// Not consumed by the ECB session cipher; surfaced for callers that
    /// chain blocks above the tunnel.
    pub fn session_iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }

    /// Application bytes read since the handshake completed.
    pub fn bytes_read(&self) -> u64 {
        self.reader.bytes_read()
    }

    /// Application bytes written since the handshake completed.
    pub fn bytes_written(&self) -> u64 {
        self.writer.bytes_written()
    }

    /// Pad to the block boundary and flush. See [`TunnelWriter::flush_writer`].
    pub fn flush_writer(&mut self) -> io::Result<()> {
        self.writer.flush_writer()
    }

    /// Discard up to the next block boundary. See [`TunnelReader::flush_reader`].
    pub fn flush_reader(&mut self) -> usize {
        self.reader.flush_reader()
    }

    /// Split into independent read and write halves.
    ///
    /// The halves share no state and may be driven from different threads.
    pub fn into_split(self) -> (TunnelReader<R>, TunnelWriter<W>) {
        (self.reader, self.writer)
    }

    /// Tear down the tunnel, keeping the underlying stream open.
    ///
    /// Returns the raw stream halves. Cipher state and key material are
    /// dropped and zeroized; sub-block plaintext pending in the encryptor
    /// is discarded.
    pub fn into_inner(self) -> (R, W) {
        (self.reader.into_inner(), self.writer.into_inner())
    }

    /// Tear down the tunnel and close the underlying stream.
    ///
    /// Flushes the underlying stream, then drops the cipher transforms (key
    /// material is zeroized) and both stream halves, closing them.
    pub fn close(mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl<R: Read, W: Write> Read for Tunnel<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<R: Read, W: Write> Write for Tunnel<R, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
