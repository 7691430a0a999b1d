//! `SIGINT` handling: the supervisor stops its child once, then lets the
//! process exit normally. Deliberately not a global — the caller owns the
//! `ServiceManager` and decides when to install the handler, so a process
//! embedding more than one supervisor is never limited to wiring up just
//! one of them.

use std::sync::Arc;
use std::thread;

use signal_hook::consts::SIGINT;
use signal_hook::iterator::Signals;

use crate::ServiceManager;

/// Spawns a background thread that calls `manager.stop()` on the first
/// `SIGINT` it observes, then exits. The thread is detached; it lives for
/// as long as the process does.
pub fn install_sigint_handler(manager: Arc<ServiceManager>) -> std::io::Result<()> {
    let mut signals = Signals::new([SIGINT])?;
    thread::spawn(move || {
        if signals.forever().next().is_some() {
            tracing::info!("SIGINT received, stopping supervised child");
            manager.stop();
        }
    });
    Ok(())
}
