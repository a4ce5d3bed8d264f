//! tvplay entry point
//!
//! ```bash
//! tvplay stations
//! tvplay play CCTV-1
//! tvplay speed --seconds 10
//! ```

use anyhow::Result;
use clap::Parser;

use tvplay::cli::{Cli, Command, ExitCode, Output};
use tvplay::commands;
use tvplay::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::load();
    if let Some(url) = cli.catalog_url.clone() {
        config.catalog_url = url;
    }

    let exit_code = run(cli, &config).await;
    std::process::exit(exit_code.into());
}

async fn run(cli: Cli, config: &Config) -> ExitCode {
    let output = Output::new(&cli);

    match cli.command {
        Command::Stations(cmd) => commands::stations_cmd(cmd, config, &output).await,
        Command::Play(cmd) => commands::play_cmd(cmd, config, &output).await,
        Command::Speed(cmd) => commands::speed_cmd(cmd, &output).await,
    }
}

/// stderr logging, filtered by RUST_LOG (default: info for this crate)
fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,tvplay=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
