//! UDP datagram socket backed by [`std::net::UdpSocket`].
//!
//! The original PAL's `Socket` is explicitly UDP-only (region sync traffic is
//! small, periodic, and loss-tolerant by design — a dropped update is
//! superseded by the next cycle). `select` is built on `set_read_timeout`
//! rather than a raw `poll`/`select(2)` call since that is all a single
//! socket's timed-wait needs and it is what `std` already exposes.

use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use crate::pal::{SelectOutcome, Socket};
use crate::result::{Result, SfError};

pub struct LinuxSocket {
    inner: UdpSocket,
}

impl LinuxSocket {
    /// Binds a UDP socket at `bind_addr` and connects it to `peer_addr` so
    /// that `send`/`recv` need not repeat the remote address each call.
    pub fn new<A: ToSocketAddrs, B: ToSocketAddrs>(bind_addr: A, peer_addr: B) -> Result<Self> {
        let inner = UdpSocket::bind(bind_addr).map_err(|_| SfError::SokOpen)?;
        inner.connect(peer_addr).map_err(|_| SfError::SokOpen)?;
        // select() manages its own timeout; recv() must not block forever
        // when called without a preceding select().
        inner
            .set_read_timeout(Some(Duration::from_millis(1)))
            .map_err(|_| SfError::SokOpen)?;
        Ok(Self { inner })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.inner.local_addr().map_err(|_| SfError::SokOpen)
    }
}

impl Socket for LinuxSocket {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        self.inner.send(buf).map_err(|_| SfError::SokSend)
    }

    fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        match self.inner.recv(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                Ok(0)
            }
            Err(_) => Err(SfError::SokRecv),
        }
    }

    fn select(&self, timeout_us: u64) -> Result<SelectOutcome> {
        let deadline = Instant::now() + Duration::from_micros(timeout_us);
        let mut probe = [0u8; 0];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(SelectOutcome::TimedOut);
            }

            self.inner
                .set_read_timeout(Some(remaining))
                .map_err(|_| SfError::SokSel)?;

            match self.inner.peek(&mut probe) {
                Ok(_) => {
                    return Ok(SelectOutcome::Ready {
                        remaining_us: deadline.saturating_duration_since(Instant::now()).as_micros()
                            as u64,
                    });
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                    return Ok(SelectOutcome::TimedOut);
                }
                Err(_) => return Err(SfError::SokSel),
            }
        }
    }
}
