// SPDX-License-Identifier: GPL-3.0-only

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::ValueEnum;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(about = "Start the JJava kernel in a Java virtual machine")]
pub(crate) struct Args {
    /// <kernel_path> <connection_file>
    #[arg(value_name = "ARGS", value_parser = clap::value_parser!(OsString))]
    pub(crate) positional: Vec<OsString>,

    #[arg(long = "config-file", env = "JJAVA_LAUNCHER_CONFIG")]
    pub(crate) config_file: Option<PathBuf>,

    #[arg(long = "print-config")]
    pub(crate) print_config: bool,

    #[arg(long)]
    pub(crate) java: Option<String>,

    #[arg(long = "jvm-opts-var")]
    pub(crate) jvm_opts_var: Option<String>,

    #[arg(long, value_enum)]
    pub(crate) tokenizer: Option<Tokenizer>,

    /// Do not print the kernel command line
    #[arg(long)]
    pub(crate) quiet: bool,

    #[arg(long = "no-forward-signals")]
    pub(crate) no_forward_signals: bool,
}

#[derive(Deserialize, ValueEnum, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Tokenizer {
    /// Split on runs of whitespace
    #[default]
    Whitespace,
    /// POSIX shell words, quotes allowed
    Shell,
}

/// The `[launcher]` table of the settings file. Every key is optional.
#[derive(Deserialize, Default, Debug)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    java: Option<String>,
    jvm_opts_var: Option<String>,
    tokenizer: Option<Tokenizer>,
    log_command: Option<bool>,
    forward_signals: Option<bool>,
}

#[derive(Deserialize, Default, Debug)]
#[serde(default, deny_unknown_fields)]
struct File {
    launcher: FileConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) java: String,
    pub(crate) jvm_opts_var: String,
    pub(crate) tokenizer: Tokenizer,
    pub(crate) log_command: bool,
    pub(crate) forward_signals: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            java: String::from("java"),
            jvm_opts_var: String::from("JJAVA_JVM_OPTS"),
            tokenizer: Tokenizer::default(),
            log_command: true,
            forward_signals: true,
        }
    }
}

impl Settings {
    fn merge_file(mut self, file: FileConfig) -> Self {
        if let Some(java) = file.java {
            self.java = java;
        }
        if let Some(var) = file.jvm_opts_var {
            self.jvm_opts_var = var;
        }
        if let Some(tokenizer) = file.tokenizer {
            self.tokenizer = tokenizer;
        }
        if let Some(log_command) = file.log_command {
            self.log_command = log_command;
        }
        if let Some(forward_signals) = file.forward_signals {
            self.forward_signals = forward_signals;
        }
        self
    }

    fn merge_args(mut self, args: &Args) -> Self {
        if let Some(java) = &args.java {
            self.java = java.clone();
        }
        if let Some(var) = &args.jvm_opts_var {
            self.jvm_opts_var = var.clone();
        }
        if let Some(tokenizer) = args.tokenizer {
            self.tokenizer = tokenizer;
        }
        if args.quiet {
            self.log_command = false;
        }
        if args.no_forward_signals {
            self.forward_signals = false;
        }
        self
    }
}

fn read_file(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.to_string_lossy()))?;
    let file: File = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.to_string_lossy()))?;
    Ok(file.launcher)
}

/// Resolve settings with precedence: command line, then settings file, then defaults.
pub(crate) fn resolve(args: &Args) -> Result<Settings> {
    let mut settings = Settings::default();
    if let Some(path) = &args.config_file {
        settings = settings.merge_file(read_file(path)?);
    }
    Ok(settings.merge_args(args))
}

/// Everything the launcher takes from its environment, read once.
#[derive(Debug)]
pub(crate) struct LaunchConfig {
    pub(crate) positional: Vec<OsString>,
    pub(crate) jvm_opts: Option<OsString>,
    pub(crate) settings: Settings,
    pub(crate) print_config: bool,
}

pub(crate) fn get_config() -> Result<LaunchConfig> {
    let args = Args::parse();
    let settings = resolve(&args).context("Failed to resolve launcher settings")?;
    let jvm_opts = std::env::var_os(&settings.jvm_opts_var);

    Ok(LaunchConfig {
        positional: args.positional,
        jvm_opts,
        settings,
        print_config: args.print_config,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write as _;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("jjava-launcher").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["kernel.jar", "/tmp/conn.json"]);
        assert_eq!(
            vec![OsString::from("kernel.jar"), OsString::from("/tmp/conn.json")],
            args.positional
        );
        let settings = Settings::default().merge_args(&args);
        assert_eq!(Settings::default(), settings);
        assert_eq!("java", settings.java);
        assert_eq!("JJAVA_JVM_OPTS", settings.jvm_opts_var);
        assert_eq!(Tokenizer::Whitespace, settings.tokenizer);
        assert!(settings.log_command);
        assert!(settings.forward_signals);
    }

    #[test]
    fn test_missing_positionals_still_parse() {
        let args = parse(&["kernel.jar"]);
        assert_eq!(vec![OsString::from("kernel.jar")], args.positional);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_positionals() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt as _;

        let connection_file = OsStr::from_bytes(b"/tmp/conn-\xff.json");
        let args = Args::try_parse_from([
            OsStr::new("jjava-launcher"),
            OsStr::new("kernel.jar"),
            connection_file,
        ])
        .unwrap();
        assert_eq!(connection_file, args.positional[1].as_os_str());
    }

    #[test]
    fn test_file_then_cli_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[launcher]
java = "/opt/jdk/bin/java"
jvm_opts_var = "KERNEL_JVM_OPTS"
tokenizer = "shell"
log_command = false
"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let settings = Settings::default().merge_file(read_file(file.path()).unwrap());
        assert_eq!("/opt/jdk/bin/java", settings.java);
        assert_eq!("KERNEL_JVM_OPTS", settings.jvm_opts_var);
        assert_eq!(Tokenizer::Shell, settings.tokenizer);
        assert!(!settings.log_command);
        assert!(settings.forward_signals);

        let args = parse(&[
            "--config-file",
            &path,
            "--java",
            "java17",
            "--tokenizer",
            "whitespace",
            "--no-forward-signals",
            "k.jar",
            "c.json",
        ]);
        let settings = resolve(&args).unwrap();
        assert_eq!("java17", settings.java);
        assert_eq!("KERNEL_JVM_OPTS", settings.jvm_opts_var);
        assert_eq!(Tokenizer::Whitespace, settings.tokenizer);
        assert!(!settings.log_command);
        assert!(!settings.forward_signals);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[launcher]\njvm_opts = \"-Xmx1g\"\n").unwrap();
        assert!(read_file(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_file(&dir.path().join("absent.toml")).is_err());
    }
}
