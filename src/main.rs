use std::error::Error;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crossquery::cli::Args;
use crossquery::db::{ConnectionConfig, Context};
use crossquery::engine::EngineRegistry;
use crossquery::output::{Outputable, ResponseView};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<bool, Box<dyn Error>> {
    let config = match &args.url {
        Some(url) => ConnectionConfig::from_url(url)?,
        None => ConnectionConfig::resolve()?,
    };
    let client = EngineRegistry::with_defaults().connect(&config)?;
    let ctx = match args.timeout_ms {
        Some(ms) => Context::with_timeout(Duration::from_millis(ms)),
        None => Context::background(),
    };

    let response = client.run(&ctx, &args.command.to_request());
    println!("{}", ResponseView::from(&response).format(args.format));
    client.close(&ctx)?;
    Ok(response.is_success())
}

fn main() -> ExitCode {
    init_logging();
    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
