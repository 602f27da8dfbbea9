use std::path::Path;
use std::process::ExitCode;

use lvops::{Config, Error, ModuleParams, Outcome, SystemExecutor};
use tracing_subscriber::EnvFilter;

fn run() -> Result<String, Error> {
    let path = std::env::args_os().nth(1).ok_or(Error::Usage)?;
    let params = ModuleParams::from_file(Path::new(&path))?;
    lvops::execute(&params, SystemExecutor::new(Config::from_env()))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let result = run();
    if let Err(error) = &result {
        tracing::error!(%error, "volume request failed");
    }
    let outcome = Outcome::from(result);

    match serde_json::to_string(&outcome) {
        Ok(json) => println!("{json}"),
        Err(error) => eprintln!("failed to encode outcome: {error}"),
    }
    if outcome.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
