//! Errors surfaced by [`crate::ServiceManager`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to fork/exec {path}: {source}")]
    ExecFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
