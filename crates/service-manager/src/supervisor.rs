//! [`ServiceManager`]: forks/execs one child process, restarts it on
//! every unclean exit, and tears it down on request.

use std::path::PathBuf;
use std::process::{Child, Command};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::error::Result;
use crate::state::State;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct ServiceManager {
    executable: PathBuf,
    args: Vec<String>,
    state: Arc<Mutex<State>>,
    pid: Arc<Mutex<Option<Pid>>>,
    terminate: Arc<AtomicBool>,
    stopped_once: Mutex<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ServiceManager {
    pub fn new(executable: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            executable: executable.into(),
            args,
            state: Arc::new(Mutex::new(State::NotStarted)),
            pid: Arc::new(Mutex::new(None)),
            terminate: Arc::new(AtomicBool::new(false)),
            stopped_once: Mutex::new(false),
            handle: Mutex::new(None),
        }
    }

    /// Spawns the background monitor thread and busy-waits until it has
    /// performed its first fork (left `NotStarted`), mirroring the
    /// original supervisor's `Activate()`. Without this, a caller that
    /// immediately calls [`Self::wait`] would see the still-`NotStarted`
    /// state, read it as "not running", and return before the child was
    /// ever spawned. A second call is a no-op: the monitor is already
    /// running.
    pub fn start(&self) {
        {
            let mut handle = self.handle.lock().expect("handle lock poisoned");
            if handle.is_some() {
                return;
            }
            let executable = self.executable.clone();
            let args = self.args.clone();
            let state = Arc::clone(&self.state);
            let pid = Arc::clone(&self.pid);
            let terminate = Arc::clone(&self.terminate);
            *handle = Some(thread::spawn(move || {
                monitor_loop(executable, args, state, pid, terminate)
            }));
        }
        while self.state() == State::NotStarted {
            thread::sleep(POLL_INTERVAL);
        }
    }

    pub fn state(&self) -> State {
        *self.state.lock().expect("state lock poisoned")
    }

    pub fn pid(&self) -> Option<Pid> {
        *self.pid.lock().expect("pid lock poisoned")
    }

    /// Sets the terminate flag, joins the monitor thread, then delivers
    /// `SIGTERM` to the child (best effort — the child may already have
    /// exited). Re-entrant: a second call is a no-op.
    pub fn stop(&self) {
        {
            let mut stopped = self.stopped_once.lock().expect("stop lock poisoned");
            if *stopped {
                return;
            }
            *stopped = true;
        }
        self.terminate.store(true, Ordering::Release);
        if let Some(handle) = self.handle.lock().expect("handle lock poisoned").take() {
            let _ = handle.join();
        }
        if let Some(pid) = self.pid() {
            tracing::info!(?pid, "sending SIGTERM to supervised child");
            let _ = signal::kill(pid, Signal::SIGTERM);
        }
        *self.state.lock().expect("state lock poisoned") = State::Stopped;
    }

    /// Blocks until the child is no longer `Running` (including
    /// `Stopped`). Interruptible only by a concurrent [`Self::stop`].
    pub fn wait(&self) {
        loop {
            if self.state() != State::Running {
                return;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn monitor_loop(
    executable: PathBuf,
    args: Vec<String>,
    state: Arc<Mutex<State>>,
    pid: Arc<Mutex<Option<Pid>>>,
    terminate: Arc<AtomicBool>,
) {
    let mut child: Option<Child> = None;
    loop {
        if terminate.load(Ordering::Acquire) {
            return;
        }
        let current = *state.lock().expect("state lock poisoned");
        match current {
            State::NotStarted => match spawn_child(&executable, &args) {
                Ok(c) => {
                    *pid.lock().expect("pid lock poisoned") = Some(Pid::from_raw(c.id() as i32));
                    child = Some(c);
                    *state.lock().expect("state lock poisoned") = State::Running;
                }
                Err(e) => {
                    tracing::error!(error = %e, "exec failed, supervisor terminating");
                    *state.lock().expect("state lock poisoned") = State::Error;
                    return;
                }
            },
            State::Running => {
                if let Some(c) = child.as_mut() {
                    match c.try_wait() {
                        Ok(Some(status)) => {
                            *state.lock().expect("state lock poisoned") = if status.success() {
                                State::Finished
                            } else {
                                State::Crashed
                            };
                            *pid.lock().expect("pid lock poisoned") = None;
                            child = None;
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "wait on child failed");
                            *state.lock().expect("state lock poisoned") = State::Unknown;
                        }
                    }
                }
                thread::sleep(POLL_INTERVAL);
            }
            State::Stopped => return,
            other if other.restarts() => {
                *state.lock().expect("state lock poisoned") = State::NotStarted;
            }
            _ => unreachable!("State::restarts() covers every variant but NotStarted/Running/Stopped"),
        }
    }
}

fn spawn_child(executable: &PathBuf, args: &[String]) -> Result<Child> {
    Command::new(executable).args(args).spawn().map_err(|source| {
        crate::error::SupervisorError::ExecFailed {
            path: executable.display().to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_child_is_reported_and_restarted() {
        let manager = ServiceManager::new("true", vec![]);
        manager.start();
        manager.wait();
        assert!(matches!(manager.state(), State::Running | State::Finished));
    }

    #[test]
    fn stop_is_idempotent() {
        let manager = ServiceManager::new("sleep", vec!["5".to_string()]);
        manager.start();
        manager.stop();
        manager.stop();
        assert_eq!(manager.state(), State::Stopped);
    }

    #[test]
    fn missing_executable_is_fatal() {
        let manager = ServiceManager::new("/nonexistent/definitely-not-a-binary", vec![]);
        manager.start();
        // give the monitor thread time to hit the exec failure
        thread::sleep(Duration::from_millis(50));
        assert_eq!(manager.state(), State::Error);
    }
}
