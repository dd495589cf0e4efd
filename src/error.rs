// SPDX-License-Identifier: GPL-3.0-only

use std::{ffi::OsString, fmt::Display};

#[derive(Debug)]
pub(crate) enum LaunchError {
    /// Fewer than two positional arguments. Holds what was given.
    MissingArguments(Vec<OsString>),
    JvmOptions {
        var: String,
        reason: String,
    },
    Spawn {
        program: String,
        source: std::io::Error,
    },
    Wait(std::io::Error),
}

impl Display for LaunchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingArguments(given) => match given.first() {
                None => f.write_str("Missing arguments: <kernel_path> <connection_file>"),
                Some(kernel_path) => {
                    write!(
                        f,
                        "Missing arguments: {} <connection_file>",
                        kernel_path.to_string_lossy()
                    )
                }
            },
            Self::JvmOptions { var, reason } => {
                write!(f, "Could not parse JVM options from `{var}`: {reason}")
            }
            Self::Spawn { program, .. } => write!(f, "Failed to start `{program}`"),
            Self::Wait(_) => f.write_str("Failed to wait for the kernel process"),
        }
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::Wait(e) => Some(e),
            _ => None,
        }
    }
}
