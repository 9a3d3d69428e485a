pub mod channel;
pub mod conn;
pub mod errors;
pub mod receiver;
pub mod sender;
pub mod teardown;

// -- Re-export structs for more concise usage

pub use channel::Channel;
pub use conn::{Connection, RetryConfig};
pub use errors::LinkError;

// Unit test helpers
