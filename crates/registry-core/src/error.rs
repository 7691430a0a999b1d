//! Errors surfaced by registry store operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("storage fault: {0}")]
    StorageFault(String),

    #[error("bad argument: {0}")]
    BadArgument(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
