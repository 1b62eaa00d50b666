use clap::Parser;
use sensor_merge::cli::{init_logging, run, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    // Usage errors exit here with clap's status 2, before any file is touched
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Error: {}", e);
        return ExitCode::from(e.exit_code());
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
