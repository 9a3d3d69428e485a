//! A minimal reliable-delivery link protocol over an unreliable byte channel.
//!
//! The channel can be anything that moves bytes with best effort (a serial
//! line, a radio link, a lossy datagram pipe); the application exposes it
//! through the two non-blocking callbacks of the [`Channel`] trait. On top of
//! that, `arqlink` adds framing, checksums, 16-bit sequence numbers, a small
//! sliding window with selective acknowledgment, timeout-driven
//! retransmission, and a FIN-based teardown handshake.
//!
//! Wire format (all multi-byte fields big-endian):
//!
//! ```text
//! ------------------------------------------
//! | flag | seq | ack | len | payload | crc |
//! |  1B  | 2B  | 2B  | 2B  |  <len>  | 2B  |
//! ------------------------------------------
//! flag: | tag (6 bits) | FIN | ACK |
//! ```
//!
//! One [`Connection`] is held per logical link. `send` and `recv` each drive
//! a bounded unit of work and return a byte count that may be smaller than
//! requested; partial progress is the protocol's normal behavior under loss,
//! not an error. `close` runs the FIN handshake and `wait` passively answers
//! a peer whose final acknowledgments may have been lost.

pub mod frame;
pub mod link;

pub use link::channel::Channel;
pub use link::conn::{Connection, RetryConfig};
pub use link::errors::LinkError;
