mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sourcechat::config::Config;

use commands::ask::AskArgs;
use commands::chat::ChatArgs;
use commands::config::ConfigArgs;

#[derive(Parser)]
#[command(name = "sourcechat")]
#[command(version = "0.1.0")]
#[command(about = "Terminal chat client for a retrieval-backed support bot")]
struct SourcechatArgs {
	#[command(subcommand)]
	command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
	/// Start an interactive chat session
	Chat(ChatArgs),

	/// Ask a single question without conversation context
	Ask(AskArgs),

	/// Show or update the configuration
	Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = SourcechatArgs::parse();

	// Load configuration
	let config = Config::load()?;

	match args.command {
		Some(Commands::Chat(chat_args)) => commands::chat::execute(&chat_args, &config).await,
		Some(Commands::Ask(ask_args)) => commands::ask::execute(&ask_args, &config).await,
		Some(Commands::Config(config_args)) => commands::config::execute(&config_args, config),
		// No subcommand starts an interactive session
		None => commands::chat::execute(&ChatArgs::default(), &config).await,
	}
}
