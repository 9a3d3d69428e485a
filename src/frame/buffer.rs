use crate::frame::MAX_FRAME;

/// Fixed-capacity accumulation buffer for inbound channel bytes.
///
/// Reads land in `space()`, complete frames are peeled off the front with
/// `consume()`, and a malformed frame throws the whole thing away with
/// `clear()`. Sized to one MTU: any complete frame fits, so as long as the
/// caller decodes between fills the buffer can never wedge full.
#[derive(Debug)]
pub struct FrameBuf {
    buf: [u8; MAX_FRAME],
    len: usize,
}

impl FrameBuf {
    pub fn new() -> Self {
        FrameBuf { buf: [0u8; MAX_FRAME], len: 0 }
    }

    /// The unfilled tail, handed to the channel read callback.
    pub fn space(&mut self) -> &mut [u8] {
        &mut self.buf[self.len..]
    }

    /// Record that the channel wrote `n` bytes into `space()`.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.len + n <= MAX_FRAME);
        self.len += n;
    }

    /// The accumulated bytes, ready for decoding.
    pub fn bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Drop `n` bytes from the front, shifting any leftover down.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.len);
        self.buf.copy_within(n..self.len, 0);
        self.len -= n;
    }

    /// Discard everything accumulated so far.
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for FrameBuf {
    fn default() -> Self {
        Self::new()
    }
}

// -- Unit tests --
