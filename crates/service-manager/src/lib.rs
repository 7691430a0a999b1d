//! service-manager: forks, polls, and restarts one child process on
//! behalf of a caller that wants it kept alive.

mod error;
mod signals;
mod state;
mod supervisor;

pub use error::{Result, SupervisorError};
pub use signals::install_sigint_handler;
pub use state::State;
pub use supervisor::ServiceManager;
