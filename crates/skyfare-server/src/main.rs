use std::path::PathBuf;

use clap::Parser;
use skyfare_luggage::Config;
use tracing::error;

#[derive(Parser)]
#[command(name = "skyfare-server")]
#[command(about = "HTTP API for the skyfare simplex solver and luggage fares", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match Config::load_or_default(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    config.init_logging();

    if let Err(e) = skyfare_server::run_server(&config).await {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}
