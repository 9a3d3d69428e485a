use crate::frame::checksum::checksum;
use crate::frame::errors::FrameError;
use crate::frame::flags::{FrameFlags, TAG, TAG_MASK};
use crate::frame::{HEADER_LEN, MAX_PAYLOAD};

/// A decoded frame borrowing its payload from the accumulation buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView<'a> {
    pub flags: FrameFlags,
    pub seq: u16,
    pub ack: u16,
    pub payload: &'a [u8],
}

impl FrameView<'_> {
    /// Number of encoded bytes this frame occupies on the wire.
    pub fn frame_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }
}

/// Classification of the head of a partially accumulated byte buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decode<'a> {
    /// A complete, checksum-valid frame sits at the start of the buffer.
    Frame(FrameView<'a>),
    /// Not enough bytes yet; keep the buffer and append the next read.
    NeedMore,
    /// Bad tag, oversized length, or checksum mismatch. Byte alignment with
    /// the peer is lost; the caller must discard the whole buffer.
    Invalid,
}

/// Encode one frame into `buf`, returning the encoded length.
pub fn encode_into(
    buf: &mut [u8],
    flags: FrameFlags,
    seq: u16,
    ack: u16,
    payload: &[u8],
) -> Result<usize, FrameError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge { len: payload.len() });
    }
    let total = HEADER_LEN + payload.len();
    if buf.len() < total {
        return Err(FrameError::BufferTooSmall { expected: total, found: buf.len() });
    }

    buf[0] = TAG | flags.bits();
    buf[1..3].copy_from_slice(&seq.to_be_bytes());
    buf[3..5].copy_from_slice(&ack.to_be_bytes());
    buf[5..7].copy_from_slice(&(payload.len() as u16).to_be_bytes());
    buf[7..7 + payload.len()].copy_from_slice(payload);

    let crc = checksum(&buf[..7 + payload.len()]);
    buf[7 + payload.len()..total].copy_from_slice(&crc.to_be_bytes());

    Ok(total)
}

/// Classify the head of `buf` per the framing rules.
pub fn decode(buf: &[u8]) -> Decode<'_> {
    if buf.len() < HEADER_LEN {
        return Decode::NeedMore;
    }
    if buf[0] & TAG_MASK != TAG {
        return Decode::Invalid;
    }

    let len = u16::from_be_bytes([buf[5], buf[6]]) as usize;
    if len > MAX_PAYLOAD {
        return Decode::Invalid;
    }
    if buf.len() < HEADER_LEN + len {
        return Decode::NeedMore;
    }

    let crc = u16::from_be_bytes([buf[7 + len], buf[8 + len]]);
    if checksum(&buf[..7 + len]) != crc {
        return Decode::Invalid;
    }

    Decode::Frame(FrameView {
        flags: FrameFlags::from_bits_truncate(buf[0]),
        seq: u16::from_be_bytes([buf[1], buf[2]]),
        ack: u16::from_be_bytes([buf[3], buf[4]]),
        payload: &buf[7..7 + len],
    })
}

// -- Unit tests --
