use crate::frame::codec::{self, Decode};
use crate::frame::{FrameBuf, FrameFlags, WINDOW_SIZE};
use crate::link::channel::Channel;
use crate::link::conn::Connection;
use crate::link::errors::LinkError;
use tracing::{debug, trace};

impl<C: Channel> Connection<C> {
    /// Fill `out` with the next in-order bytes from the peer.
    ///
    /// Buffered window data is delivered first; the channel is only polled
    /// for more when capacity remains. Returns the number of bytes delivered,
    /// possibly zero when the read budget ran out before anything arrived.
    /// Fails with [`LinkError::Finalized`] when the link is closed and
    /// nothing was left to deliver.
    pub fn recv(&mut self, out: &mut [u8]) -> Result<usize, LinkError> {
        let mut filled = self.drain_window(out);
        if filled == out.len() {
            return Ok(filled);
        }

        if self.closed {
            if filled > 0 {
                return Ok(filled);
            }
            debug!("recv on finalized connection");
            return Err(LinkError::Finalized);
        }

        let mut idle: u8 = 0;
        let mut fb = FrameBuf::new();
        'read: loop {
            let n = self.chan.read(fb.space()).map_err(LinkError::Recv)?;
            if n == 0 {
                idle += 1;
                if idle >= self.cfg.max_idle_reads {
                    trace!(collected = filled, "recv timed out");
                    break;
                }
                continue;
            }
            fb.advance(n);

            loop {
                let advance = match codec::decode(fb.bytes()) {
                    Decode::NeedMore => break,
                    Decode::Invalid => {
                        debug!(dropped = fb.bytes().len(), "malformed frame, discarding buffer");
                        fb.clear();
                        break;
                    }
                    Decode::Frame(f) => {
                        idle = 0;

                        if f.flags.contains(FrameFlags::ACK) {
                            // This side has nothing outstanding to acknowledge.
                            trace!(ack = f.ack, "stray ack dropped");
                        } else if f.flags.contains(FrameFlags::FIN) {
                            debug!("fin received, closing");
                            self.closed = true;
                            self.write_frame(FrameFlags::FIN, self.seq, self.ack, &[])?;
                            break 'read;
                        } else {
                            self.accept_data(f.seq, f.payload, out, &mut filled)?;
                        }

                        f.frame_len()
                    }
                };
                fb.consume(advance);

                if filled == out.len() {
                    break 'read;
                }
            }
        }

        Ok(filled)
    }

    /// Classify a data frame against the receive window, buffer it if it is
    /// new, drain whatever became contiguous, and acknowledge it.
    fn accept_data(
        &mut self,
        seq: u16,
        payload: &[u8],
        out: &mut [u8],
        filled: &mut usize,
    ) -> Result<(), LinkError> {
        let off = seq.wrapping_sub(self.ack);

        if (off as usize) < WINDOW_SIZE {
            if !payload.is_empty() {
                let idx = (off as usize + self.wnd as usize) % WINDOW_SIZE;
                let slot = &mut self.slots[idx];
                if slot.len == 0 {
                    slot.data[..payload.len()].copy_from_slice(payload);
                    slot.len = payload.len() as u16;
                    trace!(seq, bytes = payload.len(), "data frame buffered");

                    *filled += self.drain_window(&mut out[*filled..]);
                } else {
                    debug!(seq, "duplicate data frame");
                }
            }
        } else if off >= 0x8000 {
            // Behind the cumulative pointer: already delivered, but the ack
            // may have been lost. Acknowledge again.
            debug!(seq, "duplicate of delivered data");
        } else {
            // At or beyond the window's far edge. Never buffered, never acked.
            debug!(seq, "data frame beyond window, dropped");
            return Ok(());
        }

        trace!(ack = seq, "sending ack");
        self.write_frame(FrameFlags::ACK, self.seq, seq, &[])
    }
}

// -- Unit tests --
