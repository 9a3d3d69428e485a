use std::io;

/// The unreliable byte channel underneath a connection.
///
/// Implementations wrap whatever actually moves the bytes (a serial port, a
/// UDP socket, a radio driver) together with any state they need. Both
/// methods are non-blocking by contract and must accept buffers up to the
/// full frame size ([`crate::frame::MAX_FRAME`]).
pub trait Channel {
    /// Read up to `buf.len()` bytes. `Ok(0)` means no data is currently
    /// available and counts as one timeout tick for the calling engine.
    /// `Err` is a fatal channel failure.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write the whole buffer. `Err` is a fatal channel failure.
    fn write(&mut self, buf: &[u8]) -> io::Result<()>;
}
