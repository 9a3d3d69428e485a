use crate::frame::codec::{self, Decode};
use crate::frame::{FrameBuf, FrameFlags};
use crate::link::channel::Channel;
use crate::link::conn::Connection;
use crate::link::errors::LinkError;
use tracing::{debug, trace};

impl<C: Channel> Connection<C> {
    /// Run the FIN handshake: send a FIN and wait for the peer's FIN reply,
    /// retrying up to `max_attempts` times.
    ///
    /// Returns `Ok(true)` once the peer confirmed (the link is then closed),
    /// or `Ok(false)` when every attempt went unanswered: teardown is not
    /// confirmed, `is_closed()` stays false, and the caller decides whether
    /// to retry or abandon the link.
    pub fn close(&mut self, max_attempts: u8) -> Result<bool, LinkError> {
        if self.closed {
            return Ok(true);
        }

        for attempt in 0..max_attempts {
            trace!(attempt, "sending fin");
            self.write_frame(FrameFlags::FIN, self.seq, self.ack, &[])?;

            let mut idle: u8 = 0;
            let mut fb = FrameBuf::new();
            loop {
                let n = self.chan.read(fb.space()).map_err(LinkError::Recv)?;
                if n == 0 {
                    idle += 1;
                    if idle >= self.cfg.max_idle_reads {
                        trace!("fin wait timed out, resending");
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
                            if f.flags.contains(FrameFlags::FIN) {
                                debug!("fin confirmed by peer");
                                self.closed = true;
                                return Ok(true);
                            }
                            trace!(seq = f.seq, "non-fin frame skipped during close");
                            f.frame_len()
                        }
                    };
                    fb.consume(advance);
                }
            }
        }

        debug!(max_attempts, "close attempts exhausted, teardown not confirmed");
        Ok(false)
    }

    /// Passive drain for a receiver that has finished reading: for up to
    /// `budget` read attempts, answer every checksum-valid frame (whatever
    /// its flags) with a FIN, so a peer whose final acknowledgments were lost
    /// stops retransmitting.
    pub fn wait(&mut self, budget: u32) -> Result<(), LinkError> {
        trace!(budget, "passive drain");

        let mut fb = FrameBuf::new();
        for _ in 0..budget {
            let n = self.chan.read(fb.space()).map_err(LinkError::Recv)?;
            if n == 0 {
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
                        trace!(seq = f.seq, "frame during drain, replying fin");
                        self.write_frame(FrameFlags::FIN, self.seq, self.ack, &[])?;
                        f.frame_len()
                    }
                };
                fb.consume(advance);
            }
        }

        trace!("passive drain done");
        Ok(())
    }
}

// -- Unit tests --
