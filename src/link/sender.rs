use crate::frame::codec::{self, Decode};
use crate::frame::{FrameBuf, FrameFlags, MAX_PAYLOAD, WINDOW_SIZE};
use crate::link::channel::Channel;
use crate::link::conn::Connection;
use crate::link::errors::LinkError;
use tracing::{debug, trace, warn};

impl<C: Channel> Connection<C> {
    /// Transfer `data` to the peer, returning the number of bytes the window
    /// advanced past. A count smaller than `data.len()` means the
    /// retransmission budget ran out or the peer closed the link mid-stream;
    /// both are normal outcomes under loss, not errors.
    pub fn send(&mut self, data: &[u8]) -> Result<usize, LinkError> {
        if self.closed {
            debug!("send on finalized connection");
            return Err(LinkError::Finalized);
        }

        let mut rest = data;
        let mut mask: u32 = 0; // selective-ACK bits for the current burst
        let mut rounds: u8 = 0; // consecutive bursts with no decoded frame

        while !rest.is_empty() {
            // Burst: one frame per window slot, skipping slots a previous
            // round already saw acknowledged.
            let mut spanned = 0;
            let mut off = 0;
            while spanned < WINDOW_SIZE && off < rest.len() {
                let chunk = (rest.len() - off).min(MAX_PAYLOAD);
                if mask & (1u32 << spanned) == 0 {
                    let seq = self.seq.wrapping_add(spanned as u16);
                    trace!(seq, bytes = chunk, "sending data frame");
                    self.write_frame(
                        FrameFlags::empty(),
                        seq,
                        self.ack,
                        &rest[off..off + chunk],
                    )?;
                }
                off += chunk;
                spanned += 1;
            }

            rounds += 1;
            let full = u32::MAX >> (32 - spanned);

            // Wait for acknowledgments until the burst is covered, the peer
            // closes, or the read budget runs dry.
            let mut idle: u8 = 0;
            let mut fb = FrameBuf::new();
            'wait: loop {
                let n = self.chan.read(fb.space()).map_err(LinkError::Recv)?;
                if n == 0 {
                    idle += 1;
                    if idle >= self.cfg.max_idle_reads {
                        trace!("ack wait timed out, falling back to retransmit");
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
                            rounds = 0;

                            if f.flags.contains(FrameFlags::ACK) {
                                // Selective acknowledgment of one frame.
                                let slot = f.ack.wrapping_sub(self.seq);
                                if (slot as usize) < spanned {
                                    mask |= 1u32 << slot;
                                    trace!(ack = f.ack, "ack received");
                                } else {
                                    warn!(ack = f.ack, "ack out of range, ignored");
                                }
                            } else if f.flags.contains(FrameFlags::FIN) {
                                // Cumulative: everything below f.ack arrived.
                                let covered = f.ack.wrapping_sub(self.seq);
                                if covered != 0 && (covered as usize) <= spanned {
                                    mask |= (1u32 << covered) - 1;
                                    debug!(ack = f.ack, "fin received, cumulative ack");
                                } else {
                                    warn!(ack = f.ack, "fin out of range, ignored");
                                }
                                self.closed = true;
                                self.write_frame(FrameFlags::FIN, self.seq, self.ack, &[])?;
                            } else {
                                // Half-duplex per direction: inbound data
                                // while waiting on acks is not accepted.
                                debug!(seq = f.seq, bytes = f.payload.len(), "data frame ignored during ack wait");
                            }

                            f.frame_len()
                        }
                    };
                    fb.consume(advance);
                }

                if mask & full == full {
                    trace!("burst fully acknowledged");
                    break 'wait;
                }
                if self.closed {
                    // Buffered trailing frames were drained above; react now.
                    break 'wait;
                }
            }

            if rounds >= self.cfg.max_bursts {
                debug!(sent = data.len() - rest.len(), "retransmission budget exhausted");
                break;
            }

            // Advance past the contiguous acknowledged prefix.
            let k = ((!mask).trailing_zeros() as usize).min(spanned);
            if k > 0 {
                let consumed = (k * MAX_PAYLOAD).min(rest.len());
                rest = &rest[consumed..];
                mask >>= k;
                self.seq = self.seq.wrapping_add(k as u16);
                trace!(slots = k, seq = self.seq, "send window advanced");
            }

            if self.closed {
                debug!("connection closed by peer during send");
                break;
            }
        }

        Ok(data.len() - rest.len())
    }
}

// -- Unit tests --
