//! Errors surfaced by the RPC client stubs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("registration failed: {0}")]
    RegistrationFailed(String),

    #[error("unregistration failed: {0}")]
    UnregistrationFailed(String),

    #[error("lookup failed: {0}")]
    LookupFailed(String),

    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
