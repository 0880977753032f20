//! `obuild`, a parallel build driver.
//!
//! Reads a build description (`obuild.cfg` by default), lets it register
//! rules through the embedded command language, then drives the requested
//! target through the engine.

mod cli;
mod host;

use std::fmt::Display;
use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::host::App;
use obuild_core::driver;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    std::process::exit(exit_code);
}

async fn run() -> i32 {
    // Keep the exit-code convention: anything but a clean build is 1, and
    // `-h`/`--version` are a successful exit.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let failed = err.use_stderr();
            let _ = err.print();
            return i32::from(failed);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "obuild=warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let progname = progname();

    if let Some(dir) = &cli.directory {
        if std::env::set_current_dir(dir).is_err() {
            return report(
                &progname,
                format_args!("failed changing directory: {}", dir.display()),
            );
        }
    }

    let jobs = match cli.jobs {
        0 => num_cpus::get(),
        n => n,
    };
    tracing::debug!(jobs, file = %cli.file.display(), target = %cli.target, "configured");

    let mut app = App::new(jobs, cli.ignore_env);

    if let Some(snippet) = &cli.eval {
        if let Err(err) = obuild_script::run(&mut app, snippet).await {
            return report(&progname, format_args!("failed creating rules: {err}"));
        }
    }

    let source = match std::fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(err) => {
            return report(
                &progname,
                format_args!("failed reading '{}': {err}", cli.file.display()),
            );
        }
    };
    if let Err(err) = obuild_script::run(&mut app, &source).await {
        return report(&progname, format_args!("failed creating rules: {err}"));
    }

    if app.rule_count() == 0 {
        return report(&progname, "no targets");
    }

    match driver::exec_main(&mut app, &cli.target).await {
        Ok(()) => 0,
        Err(err) => report(&progname, err),
    }
}

/// Basename of argv[0], for error prefixes.
fn progname() -> String {
    std::env::args()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "obuild".to_string())
}

/// The single formatter every build error goes through.
fn report(progname: &str, message: impl Display) -> i32 {
    eprintln!("{progname}: {message}");
    1
}
