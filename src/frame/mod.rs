pub mod buffer;
pub mod checksum;
pub mod codec;
pub mod errors;
pub mod flags;

// -- Re-export structs for more concise usage

pub use buffer::FrameBuf;
pub use codec::{Decode, FrameView};
pub use errors::FrameError;
pub use flags::FrameFlags;

/// Largest frame the link will carry (the MTU of the protocol).
pub const MAX_FRAME: usize = 185;

/// Header length including the trailing 2-byte checksum.
pub const HEADER_LEN: usize = 9;

/// Largest payload a single frame can carry.
pub const MAX_PAYLOAD: usize = MAX_FRAME - HEADER_LEN;

/// Number of slots in the send/receive window. Bounded by the width of the
/// `u32` selective-ACK bitmask.
pub const WINDOW_SIZE: usize = 8;

const _: () = assert!(WINDOW_SIZE <= 32);
const _: () = assert!(MAX_FRAME <= 0x7fff);
