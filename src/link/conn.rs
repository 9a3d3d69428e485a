use crate::frame::codec;
use crate::frame::{FrameFlags, MAX_FRAME, MAX_PAYLOAD, WINDOW_SIZE};
use crate::link::channel::Channel;
use crate::link::errors::LinkError;
use std::io;
use tracing::trace;

/// Retry limits for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum consecutive retransmission rounds during `send` (and FIN
    /// attempts during `close`) before giving up with a partial result.
    pub max_bursts: u8,
    /// Maximum consecutive zero-length reads before a wait loop is abandoned.
    pub max_idle_reads: u8,
}

impl RetryConfig {
    /// Read budget for the passive post-receive drain (`wait`): long enough
    /// to outlast a peer still running its full retransmission schedule.
    pub fn drain_budget(&self) -> u32 {
        2 * self.max_bursts as u32 * self.max_idle_reads as u32
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig { max_bursts: 8, max_idle_reads: 8 }
    }
}

/// One slot of the receive-reassembly ring. `len == 0` means empty.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Slot {
    pub(crate) data: [u8; MAX_PAYLOAD],
    pub(crate) len: u16,
}

impl Slot {
    const EMPTY: Slot = Slot { data: [0u8; MAX_PAYLOAD], len: 0 };
}

/// State of one logical link over a [`Channel`].
///
/// `seq` is the next sequence number this side assigns to outbound data;
/// `ack` is the next sequence number expected from the peer (the cumulative
/// acknowledgment pointer). A slot at ring position `(seq - ack + wnd) % W`
/// holds the payload for sequence number `seq` while it lies within
/// `[ack, ack + W)`. `ack` only advances when the head slot is delivered to
/// the application.
#[derive(Debug)]
pub struct Connection<C: Channel> {
    pub(crate) chan: C,
    pub(crate) cfg: RetryConfig,
    pub(crate) seq: u16,
    pub(crate) ack: u16,
    pub(crate) wnd: u8,
    pub(crate) closed: bool,
    pub(crate) slots: [Slot; WINDOW_SIZE],
}

impl<C: Channel> Connection<C> {
    pub fn new(chan: C, cfg: RetryConfig) -> Self {
        Connection {
            chan,
            cfg,
            seq: 0,
            ack: 0,
            wnd: 0,
            closed: false,
            slots: [Slot::EMPTY; WINDOW_SIZE],
        }
    }

    /// Re-zero sequence counters and the closed flag so the same channel and
    /// config can carry another logical transfer.
    pub fn reset(&mut self) {
        self.seq = 0;
        self.ack = 0;
        self.wnd = 0;
        self.closed = false;
        for slot in &mut self.slots {
            slot.len = 0;
        }
    }

    /// Whether the transfer has been finalized by a FIN exchange.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.chan
    }

    pub fn into_channel(self) -> C {
        self.chan
    }

    /// Encode and write one frame to the channel.
    pub(crate) fn write_frame(
        &mut self,
        flags: FrameFlags,
        seq: u16,
        ack: u16,
        payload: &[u8],
    ) -> Result<(), LinkError> {
        let mut buf = [0u8; MAX_FRAME];
        let n = codec::encode_into(&mut buf, flags, seq, ack, payload)
            .map_err(|e| LinkError::Send(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
        self.chan.write(&buf[..n]).map_err(LinkError::Send)
    }

    /// Deliver buffered window data into `out`, oldest slot first.
    ///
    /// A slot smaller than the remaining capacity is fully consumed and the
    /// cumulative-ack pointer and ring cursor advance past it; a larger slot
    /// is partially consumed with its remainder shifted down and no advance.
    pub(crate) fn drain_window(&mut self, out: &mut [u8]) -> usize {
        let mut copied = 0;

        for _ in 0..WINDOW_SIZE {
            let idx = self.wnd as usize % WINDOW_SIZE;
            let avail = self.slots[idx].len as usize;
            if avail == 0 {
                break;
            }

            let room = out.len() - copied;
            if room == 0 {
                break;
            }

            if avail <= room {
                out[copied..copied + avail].copy_from_slice(&self.slots[idx].data[..avail]);
                copied += avail;

                self.slots[idx].len = 0;
                self.ack = self.ack.wrapping_add(1);
                self.wnd = self.wnd.wrapping_add(1);
                trace!(seq = self.ack.wrapping_sub(1), bytes = avail, "slot delivered");
            } else {
                let slot = &mut self.slots[idx];
                out[copied..].copy_from_slice(&slot.data[..room]);
                copied += room;

                slot.data.copy_within(room..avail, 0);
                slot.len = (avail - room) as u16;
                trace!(bytes = room, left = slot.len, "slot partially delivered");
                break;
            }
        }

        copied
    }
}

// -- Unit tests --
