// SPDX-License-Identifier: GPL-3.0-only

//! Forward termination signals from the launcher to the kernel.
//!
//! The signals are blocked on the main thread before anything else is
//! spawned, so every thread inherits the mask and only the forwarding thread
//! picks them up with `sigwait`. The child gets them unblocked again right
//! before `exec`.

use nix::sys::signal::{kill, SigSet, Signal};
use nix::unistd::Pid;
use std::os::unix::process::CommandExt as _;
use std::process;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

const FORWARDED: [Signal; 3] = [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP];

pub(crate) struct SignalForwarder {
    mask: SigSet,
}

impl SignalForwarder {
    /// Must run before any other thread is started.
    pub(crate) fn install() -> nix::Result<Self> {
        let mut mask = SigSet::empty();
        for signal in FORWARDED {
            mask.add(signal);
        }
        mask.thread_block()?;
        Ok(Self { mask })
    }

    /// Restore the default mask in the child.
    pub(crate) fn prepare(&self, command: &mut process::Command) {
        let mask = self.mask;
        // SAFETY: pthread_sigmask is async-signal-safe and nothing is allocated.
        unsafe {
            command.pre_exec(move || mask.thread_unblock().map_err(std::io::Error::from));
        }
    }

    /// Start relaying to `pid`. The thread lives until the launcher exits,
    /// but stops signalling `pid` once the returned [`Relay`] is dropped.
    /// Drop it as soon as the child is reaped, the pid may be reused after that.
    pub(crate) fn forward_to(&self, pid: u32) -> Relay {
        let mask = self.mask;
        let pid = Pid::from_raw(pid as i32);
        let done = Arc::new(AtomicBool::new(false));
        let relay = Relay { done: done.clone() };
        std::thread::spawn(move || {
            while let Ok(signal) = mask.wait() {
                if done.load(Ordering::Acquire) {
                    eprintln!("Launcher received {signal} after the kernel exited, ignoring");
                    continue;
                }
                eprintln!("Launcher received {signal}, forwarding to the kernel");
                if let Err(e) = kill(pid, signal) {
                    eprintln!("Failed to forward {signal} to the kernel: {e}");
                }
            }
        });
        relay
    }
}

/// Handle to a running relay. Dropping it ends forwarding.
pub(crate) struct Relay {
    done: Arc<AtomicBool>,
}

impl Drop for Relay {
    fn drop(&mut self) {
        self.done.store(true, Ordering::Release);
    }
}

impl Drop for SignalForwarder {
    fn drop(&mut self) {
        let _ = self.mask.thread_unblock();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_forwarded_set() {
        let forwarder = SignalForwarder::install().unwrap();
        for signal in FORWARDED {
            assert!(forwarder.mask.contains(signal));
        }
        assert!(!forwarder.mask.contains(Signal::SIGKILL));
    }

    #[test]
    fn test_dropping_relay_stops_forwarding() {
        let forwarder = SignalForwarder::install().unwrap();
        let relay = forwarder.forward_to(std::process::id());
        let done = relay.done.clone();
        assert!(!done.load(Ordering::Acquire));
        drop(relay);
        assert!(done.load(Ordering::Acquire));
    }

    #[test]
    fn test_child_gets_signal_unblocked() {
        let forwarder = SignalForwarder::install().unwrap();
        let mut command = process::Command::new("sh");
        command.args(["-c", "kill -TERM $$"]);
        forwarder.prepare(&mut command);
        let status = command.status().unwrap();
        assert_eq!(128 + 15, crate::command::ExitCodeOf::exit_code(&status));
    }
}
