use anyhow::{Context, Result};
use std::process::ExitCode;

mod command;
mod config;
mod error;
mod invocation;
mod launch;
#[cfg(unix)]
mod signal;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = config::get_config()?;

    if args.print_config {
        println!("{:#?}", &args.settings);
        return Ok(ExitCode::SUCCESS);
    }

    let mut spawner = launch::SystemSpawner::new(&args.settings)
        .context("Failed to set up signal forwarding")?;
    let code = launch::launch(
        &args.positional,
        args.jvm_opts.as_deref(),
        &args.settings,
        &mut spawner,
    )
    .context("Failed to launch kernel")?;

    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}
