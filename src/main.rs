mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use tunedrop::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tunedrop::observability::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Server(args) => {
            let mut config = Config::load(args.config)
                .map_err(|e| format!("Failed to load config: {}", e))?;
            if let Some(address) = args.address {
                config.server.bind_addr = address;
            }
            tunedrop::api::run(config).await?
        }
    }

    Ok(())
}
