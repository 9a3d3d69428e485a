use thiserror::Error;

#[derive(Debug, PartialEq, Error)]
pub enum FrameError {
    #[error("Invalid buffer: expected {expected} bytes, actual {found} bytes")]
    BufferTooSmall { expected: usize, found: usize },

    #[error("Payload too large: {len} bytes")]
    PayloadTooLarge { len: usize },
}
