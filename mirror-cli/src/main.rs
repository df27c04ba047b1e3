//! mirror CLI: one-shot replies, interactive chat and session history. Config from env and optional CLI args.

use anyhow::Result;
use clap::Parser;
use mirror_chat::{ChatConfig, ConfigOverrides};
use mirror_cli::{run_chat, run_history, run_reply, Cli, Commands};
use mirror_core::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Reply { text, rules } => run_reply(&text, rules.as_deref()),
        Commands::Chat { session } => {
            let config = ChatConfig::load(ConfigOverrides::from(session))?;
            init_tracing(&config.log_file)?;
            run_chat(config).await
        }
        Commands::History { session } => {
            let config = ChatConfig::load(ConfigOverrides::from(session))?;
            init_tracing(&config.log_file)?;
            run_history(config).await
        }
    }
}
