mod platform;

use std::process::ExitCode;

use clap::Parser;
use hunter_logging::hunter_error;

use platform::args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    platform::logging::initialize(args.log.into());

    match platform::run_app(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            hunter_error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
