use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("receive channel failed: {0}")]
    Recv(#[source] io::Error),

    #[error("send channel failed: {0}")]
    Send(#[source] io::Error),

    #[error("connection already finalized")]
    Finalized,
}
