// SPDX-License-Identifier: GPL-3.0-only

use std::process;

use crate::invocation::Invocation;

pub(crate) struct Command {
    command: process::Command,
    log: bool,
}

impl Command {
    pub(crate) fn new(invocation: &Invocation, log: bool) -> Self {
        let mut command = process::Command::new(invocation.program());
        command.args(invocation.args());
        Self { command, log }
    }

    pub(crate) fn spawn(&mut self) -> std::io::Result<process::Child> {
        if self.log {
            println!("Running JJava kernel: {:?}", &self.command);
        }
        self.command.spawn()
    }
}

/// Exit code the launcher reports for a finished child.
pub(crate) trait ExitCodeOf {
    fn exit_code(&self) -> i32;
}

impl ExitCodeOf for process::ExitStatus {
    fn exit_code(&self) -> i32 {
        if let Some(code) = self.code() {
            return code;
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt as _;
            if let Some(signal) = self.signal() {
                return 128 + signal;
            }
        }
        1
    }
}

impl std::ops::Deref for Command {
    type Target = process::Command;

    fn deref(&self) -> &Self::Target {
        &self.command
    }
}

impl std::ops::DerefMut for Command {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.command
    }
}
