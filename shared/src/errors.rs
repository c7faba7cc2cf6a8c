//! Shared error types for the test harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Serialization failed: {message}")]
    SerializationError { message: String },

    #[error("Event protocol error: {message}")]
    ProtocolError { message: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
