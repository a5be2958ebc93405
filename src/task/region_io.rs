//! Tasks that synchronize a [`Region`] across a [`Socket`].
//!
//! Grounded in `sf/core/RegionRxTask.hpp`. The original is a class template
//! over a compile-time socket count (`RegionRxTask<TCnt>`) holding raw
//! pointer arrays; here that becomes a `Vec` of entries built through a
//! builder, consistent with the `Vec<CoreConfig>`-over-const-generic-array
//! resolution used elsewhere (see `StateVectorConfigBuilder`). There is no
//! `RegionTxTask` in the original sources, only the result code range
//! reserved for it (`E_RTX_*`); it is modeled here as the RX task's mirror
//! image, grounded in the same file.

use crate::element::Element;
use crate::pal::{SelectOutcome, Socket};
use crate::region::Region;
use crate::result::{Result, SfError};
use crate::task::Task;

struct RxEntry<'lock> {
    sock: Box<dyn Socket>,
    region: Region<'lock>,
    rx_cnt_elem: Option<Element<u32>>,
    age_elem: Option<Element<u32>>,
    buf: Vec<u8>,
}

/// Polls a set of sockets for a fixed time budget each step, copying any
/// datagram received in full into the paired region.
pub struct RegionRxTask<'lock> {
    entries: Vec<RxEntry<'lock>>,
    timeout_us: u64,
    additional_polls: u32,
}

impl<'lock> RegionRxTask<'lock> {
    pub fn new(timeout_us: u64, additional_polls: u32) -> Self {
        Self {
            entries: Vec::new(),
            timeout_us,
            additional_polls,
        }
    }

    pub fn bind(
        mut self,
        sock: Box<dyn Socket>,
        region: Region<'lock>,
        rx_cnt_elem: Option<Element<u32>>,
        age_elem: Option<Element<u32>>,
    ) -> Self {
        let size = region.size();
        self.entries.push(RxEntry {
            sock,
            region,
            rx_cnt_elem,
            age_elem,
            buf: vec![0u8; size],
        });
        self
    }

    /// Reads as many bytes as are currently available for `entry` into its
    /// buffer, returning `true` once the buffer has been filled and written
    /// to the region.
    fn try_fill(entry: &mut RxEntry<'lock>, received: &mut usize) -> Result<bool> {
        while *received < entry.buf.len() {
            let n = entry.sock.recv(&mut entry.buf[*received..])?;
            if n == 0 {
                return Ok(false);
            }
            *received += n;
        }
        entry.region.write(&entry.buf)?;
        Ok(true)
    }
}

impl<'lock> Task for RegionRxTask<'lock> {
    fn init_impl(&mut self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(SfError::RrxNull);
        }
        Ok(())
    }

    fn step_enable(&mut self) -> Result<()> {
        let mut recvd = vec![false; self.entries.len()];
        let mut progress = vec![0usize; self.entries.len()];
        let mut remaining_us = self.timeout_us;

        while remaining_us > 0 {
            let mut any_ready = false;
            for (i, entry) in self.entries.iter_mut().enumerate() {
                if recvd[i] {
                    continue;
                }
                match entry.sock.select(remaining_us)? {
                    SelectOutcome::Ready { remaining_us: r } => {
                        remaining_us = r;
                        any_ready = true;
                        if Self::try_fill(entry, &mut progress[i])? {
                            recvd[i] = true;
                        }
                    }
                    SelectOutcome::TimedOut => {
                        remaining_us = 0;
                    }
                }
            }
            if !any_ready {
                break;
            }
        }

        for _ in 0..self.additional_polls {
            for (i, entry) in self.entries.iter_mut().enumerate() {
                if recvd[i] {
                    continue;
                }
                if let SelectOutcome::Ready { .. } = entry.sock.select(0)? {
                    if Self::try_fill(entry, &mut progress[i])? {
                        recvd[i] = true;
                    }
                }
            }
        }

        for (i, entry) in self.entries.iter().enumerate() {
            if recvd[i] {
                if let Some(elem) = &entry.rx_cnt_elem {
                    elem.write(elem.read() + 1);
                }
                if let Some(elem) = &entry.age_elem {
                    elem.write(0);
                }
            } else if let Some(elem) = &entry.age_elem {
                elem.write(elem.read() + 1);
            }
        }

        Ok(())
    }
}

struct TxEntry<'lock> {
    sock: Box<dyn Socket>,
    region: Region<'lock>,
    buf: Vec<u8>,
}

/// Sends the current contents of a set of regions over their paired sockets
/// each step. The mirror image of [`RegionRxTask`]: where rx polls for
/// readiness, tx simply reads the region and writes the datagram.
pub struct RegionTxTask<'lock> {
    entries: Vec<TxEntry<'lock>>,
}

impl<'lock> RegionTxTask<'lock> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn bind(mut self, sock: Box<dyn Socket>, region: Region<'lock>) -> Self {
        let size = region.size();
        self.entries.push(TxEntry {
            sock,
            region,
            buf: vec![0u8; size],
        });
        self
    }
}

impl<'lock> Default for RegionTxTask<'lock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'lock> Task for RegionTxTask<'lock> {
    fn init_impl(&mut self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(SfError::RtxNull);
        }
        Ok(())
    }

    fn step_enable(&mut self) -> Result<()> {
        for entry in &mut self.entries {
            entry.region.read(&mut entry.buf)?;
            let n = entry.sock.send(&entry.buf)?;
            if n != entry.buf.len() {
                return Err(SfError::RtxSize);
            }
        }
        Ok(())
    }
}
