// Copyright 2025 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Configuration command - show or update the config file

use anyhow::Result;
use clap::Args;

use sourcechat::config::{validate_endpoint, Config, LogLevel};
use sourcechat::directories;

#[derive(Args, Debug)]
pub struct ConfigArgs {
	/// Set the chat service endpoint URL
	#[arg(long)]
	pub endpoint: Option<String>,

	/// Set the conversation window size
	#[arg(long)]
	pub window: Option<usize>,

	/// Set the request timeout in seconds
	#[arg(long)]
	pub timeout: Option<u64>,

	/// Set the log level (none, info or debug)
	#[arg(long)]
	pub log_level: Option<String>,

	/// Show the data directory locations
	#[arg(long)]
	pub dirs: bool,
}

pub fn execute(args: &ConfigArgs, mut config: Config) -> Result<()> {
	if args.dirs {
		return directories::print_directory_info();
	}

	let mut modified = false;

	if let Some(endpoint) = &args.endpoint {
		validate_endpoint(endpoint)?;
		config.endpoint = endpoint.clone();
		println!("Set endpoint to {}", endpoint);
		modified = true;
	}

	if let Some(window) = args.window {
		config.conversation_window = window;
		println!("Set conversation window to {}", window);
		modified = true;
	}

	if let Some(timeout) = args.timeout {
		config.request_timeout_seconds = timeout;
		println!("Set request timeout to {} seconds", timeout);
		modified = true;
	}

	if let Some(log_level) = &args.log_level {
		match log_level.to_lowercase().as_str() {
			"none" => config.log_level = LogLevel::None,
			"info" => config.log_level = LogLevel::Info,
			"debug" => config.log_level = LogLevel::Debug,
			other => {
				println!("Unknown log level: {}", other);
				println!("Valid levels are 'none', 'info' or 'debug'.");
				return Ok(());
			}
		}
		println!("Set log level to {}", log_level.to_lowercase());
		modified = true;
	}

	// If no modifications were made, make sure a default config file exists
	if !modified {
		let config_path = Config::create_default_config()?;
		println!("Configuration file: {}", config_path.display());
	} else {
		config.save()?;
		println!("Configuration saved successfully");
	}

	// Show current configuration
	println!("\nCurrent configuration:");
	println!("Endpoint:            {}", config.endpoint);
	println!("Conversation window: {}", config.conversation_window);
	println!("Request timeout:     {}s", config.request_timeout_seconds);
	let log_level = match config.log_level {
		LogLevel::None => "none",
		LogLevel::Info => "info",
		LogLevel::Debug => "debug",
	};
	println!("Log level:           {}", log_level);

	Ok(())
}
