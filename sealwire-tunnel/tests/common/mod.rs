//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::io::{self, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use rand::rngs::OsRng;
use sealwire_tunnel::LocalKey;

/// Three 2048-bit key pairs, generated once per test binary.
fn fixtures() -> &'static (LocalKey, LocalKey, LocalKey) {
    static KEYS: OnceLock<(LocalKey, LocalKey, LocalKey)> = OnceLock::new();
    KEYS.get_or_init(|| {
        (
            LocalKey::generate(&mut OsRng, 2048).unwrap(),
            LocalKey::generate(&mut OsRng, 2048).unwrap(),
            LocalKey::generate(&mut OsRng, 2048).unwrap(),
        )
    })
}

pub fn key_a() -> &'static LocalKey {
    &fixtures().0
}

pub fn key_b() -> &'static LocalKey {
    &fixtures().1
}

/// A key pair unrelated to A and B.
pub fn key_c() -> &'static LocalKey {
    &fixtures().2
}

/// A connected loopback socket pair.
pub fn tcp_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let dialer = TcpStream::connect(addr).unwrap();
    let (listened, _) = listener.accept().unwrap();
    (dialer, listened)
}

/// Write-through wrapper that counts bytes reaching the wire.
pub struct CountingWriter<W> {
    inner: W,
    count: Arc<AtomicUsize>,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> (Self, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner,
                count: Arc::clone(&count),
            },
            count,
        )
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count.fetch_add(n, Ordering::Relaxed);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
