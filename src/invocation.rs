// SPDX-License-Identifier: GPL-3.0-only

use std::ffi::{OsStr, OsString};

use crate::{config::Tokenizer, error::LaunchError};

/// Opens the JShell internals to the kernel, which evaluates code through them reflectively.
const ADD_OPENS: [&str; 2] = ["--add-opens", "jdk.jshell/jdk.jshell=ALL-UNNAMED"];

/// Split the value of the JVM options variable into argv tokens.
pub(crate) fn tokenize(
    var: &str,
    options: &OsStr,
    tokenizer: Tokenizer,
) -> Result<Vec<OsString>, LaunchError> {
    match tokenizer {
        Tokenizer::Whitespace => split_whitespace(var, options),
        Tokenizer::Shell => {
            let options = options.to_str().ok_or_else(|| not_utf8(var))?;
            shell_words::split(options)
                .map(|words| words.into_iter().map(OsString::from).collect())
                .map_err(|e| LaunchError::JvmOptions {
                    var: var.to_owned(),
                    reason: e.to_string(),
                })
        }
    }
}

fn not_utf8(var: &str) -> LaunchError {
    LaunchError::JvmOptions {
        var: var.to_owned(),
        reason: String::from("value is not valid UTF-8"),
    }
}

/// Bytes other than ASCII whitespace pass through untouched.
#[cfg(unix)]
fn split_whitespace(_var: &str, options: &OsStr) -> Result<Vec<OsString>, LaunchError> {
    use std::os::unix::ffi::OsStrExt as _;

    Ok(options
        .as_bytes()
        .split(u8::is_ascii_whitespace)
        .filter(|token| !token.is_empty())
        .map(|token| OsStr::from_bytes(token).to_owned())
        .collect())
}

#[cfg(not(unix))]
fn split_whitespace(var: &str, options: &OsStr) -> Result<Vec<OsString>, LaunchError> {
    let options = options.to_str().ok_or_else(|| not_utf8(var))?;
    Ok(options.split_whitespace().map(OsString::from).collect())
}

/// The command line handed to the operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Invocation {
    tokens: Vec<OsString>,
}

impl Invocation {
    pub(crate) fn new(
        java: &str,
        jvm_opts: Vec<OsString>,
        kernel_path: &OsStr,
        connection_file: &OsStr,
    ) -> Self {
        let mut tokens = Vec::with_capacity(jvm_opts.len() + 6);
        tokens.push(OsString::from(java));
        tokens.extend(jvm_opts);
        tokens.extend(ADD_OPENS.map(OsString::from));
        tokens.push("-jar".into());
        tokens.push(kernel_path.to_owned());
        tokens.push(connection_file.to_owned());
        Self { tokens }
    }

    pub(crate) fn tokens(&self) -> &[OsString] {
        &self.tokens
    }

    pub(crate) fn program(&self) -> &OsStr {
        &self.tokens()[0]
    }

    pub(crate) fn args(&self) -> &[OsString] {
        &self.tokens()[1..]
    }
}
