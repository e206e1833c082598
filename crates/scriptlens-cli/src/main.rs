use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod commands;
mod dotenv;
mod exit_codes;

use args::Cli;

fn main() {
    // Before the runtime starts: setting variables is only sound single-threaded.
    dotenv::load(".env");

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let code = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(commands::dispatch(cli.cmd)),
        Err(e) => Err(e.into()),
    };

    let code = code.unwrap_or_else(|e| {
        eprintln!("fatal: {:#}", e);
        exit_codes::CONFIG_ERROR
    });
    std::process::exit(code);
}
