use bitflags::bitflags;

/// Fixed tag pattern carried in the top six bits of every flag byte. A frame
/// whose tag does not match is treated as garbage on the wire.
pub const TAG: u8 = 0b1100_1100;

/// Mask selecting the tag bits of the flag byte.
pub const TAG_MASK: u8 = 0b1111_1100;

bitflags! {
    // Bit positions [ tag, tag, tag, tag, tag, tag, FIN, ACK ]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FrameFlags: u8 {
        const FIN = 1 << 1;
        const ACK = 1 << 0;
    }
}

// -- Unit tests --
