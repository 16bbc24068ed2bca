use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use marquee::cli::Cli;
use marquee::error::SubmitError;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env("MARQUEE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match marquee::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Submit failures have already been shown to the user.
            if err.downcast_ref::<SubmitError>().is_none() {
                eprintln!("Error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
