// SPDX-License-Identifier: GPL-3.0-only

use std::ffi::{OsStr, OsString};

use crate::{
    command::{Command, ExitCodeOf},
    config::Settings,
    error::LaunchError,
    invocation::{self, Invocation},
};

#[cfg(unix)]
use crate::signal::SignalForwarder;

/// Runs an invocation to completion and reports its exit code.
pub(crate) trait Spawn {
    fn run(&mut self, invocation: &Invocation) -> Result<i32, LaunchError>;
}

/// Start the kernel described by `positional` (`<kernel_path> <connection_file>`)
/// and return its exit code.
///
/// `jvm_opts` is the raw value of the options variable, `None` if unset.
pub(crate) fn launch(
    positional: &[OsString],
    jvm_opts: Option<&OsStr>,
    settings: &Settings,
    spawner: &mut impl Spawn,
) -> Result<i32, LaunchError> {
    let [kernel_path, connection_file, ..] = positional else {
        return Err(LaunchError::MissingArguments(positional.to_vec()));
    };

    let opts = match jvm_opts {
        Some(opts) => invocation::tokenize(&settings.jvm_opts_var, opts, settings.tokenizer)?,
        None => Vec::new(),
    };
    let invocation = Invocation::new(&settings.java, opts, kernel_path, connection_file);

    spawner.run(&invocation)
}

/// Spawns through the operating system with inherited stdio.
pub(crate) struct SystemSpawner {
    log: bool,
    #[cfg(unix)]
    forwarder: Option<SignalForwarder>,
}

impl SystemSpawner {
    pub(crate) fn new(settings: &Settings) -> std::io::Result<Self> {
        #[cfg(unix)]
        let forwarder = if settings.forward_signals {
            Some(SignalForwarder::install()?)
        } else {
            None
        };

        Ok(Self {
            log: settings.log_command,
            #[cfg(unix)]
            forwarder,
        })
    }
}

impl Spawn for SystemSpawner {
    fn run(&mut self, invocation: &Invocation) -> Result<i32, LaunchError> {
        let mut command = Command::new(invocation, self.log);

        #[cfg(unix)]
        if let Some(forwarder) = &self.forwarder {
            forwarder.prepare(&mut command);
        }

        let child = command.spawn().map_err(|source| LaunchError::Spawn {
            program: invocation.program().to_string_lossy().into_owned(),
            source,
        })?;
        let mut child = drop_guard::guard(child, |mut child| {
            let _ = child.kill();
            let _ = child.wait();
        });

        #[cfg(unix)]
        let relay = self.forwarder.as_ref().map(|f| f.forward_to(child.id()));

        let status = child.wait().map_err(LaunchError::Wait)?;

        #[cfg(unix)]
        drop(relay);

        Ok(status.exit_code())
    }
}
