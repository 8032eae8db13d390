use chatlink::adapter::inbound::cli::command::{Cli, Commands};
use chatlink::adapter::inbound::cli::output::{self, OutputConfig};
use chatlink::adapter::inbound::cli::{check, run};
use chatlink::domain::IdentityProvider;
use chatlink::infrastructure::config::Config;
use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    output::configure(OutputConfig::new(cli.json, cli.quiet));

    let config = match Config::load_or_default(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            output::error(&format!("Failed to load config: {e}"));
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run(args) => run::execute(config, args).await,
        Commands::CheckConfig => check::execute(&cli.config, &config),
        Commands::ClientId => {
            println!("{}", IdentityProvider::generate());
            Ok(())
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Fatal error");
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
