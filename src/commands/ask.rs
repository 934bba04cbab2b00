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

// One-shot question command - no conversation context

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::io::{self, Read};

use sourcechat::api::{ChatBackend, RemoteChatClient};
use sourcechat::config::Config;
use sourcechat::session::filter_documents;

#[derive(Args, Debug)]
pub struct AskArgs {
	/// Question to ask the bot
	#[arg(value_name = "INPUT")]
	pub input: Option<String>,

	/// Use a specific endpoint instead of the configured one (runtime only, not saved)
	#[arg(long)]
	pub endpoint: Option<String>,

	/// Output raw text without colors
	#[arg(long)]
	pub raw: bool,
}

pub async fn execute(args: &AskArgs, config: &Config) -> Result<()> {
	let endpoint = args
		.endpoint
		.clone()
		.unwrap_or_else(|| config.endpoint.clone());
	sourcechat::config::validate_endpoint(&endpoint)?;

	// Get input from argument or piped stdin
	let input = match &args.input {
		Some(input) => input.trim().to_string(),
		None if !atty::is(atty::Stream::Stdin) => {
			let mut buffer = String::new();
			io::stdin()
				.read_to_string(&mut buffer)
				.context("Failed to read question from stdin")?;
			buffer.trim().to_string()
		}
		None => String::new(),
	};

	if input.is_empty() {
		return Err(anyhow::anyhow!(
			"No input provided. Pass a question as an argument or pipe it on stdin."
		));
	}

	let client = RemoteChatClient::new(&endpoint, config.request_timeout())?;
	let reply = client
		.chat(&input, &[])
		.await
		.context("Chat request failed")?;

	let documents = filter_documents(reply.documents);

	if args.raw {
		println!("{}", reply.message);
		for doc in &documents {
			println!("{} ({})", doc.title, doc.source);
		}
	} else {
		println!("{}", reply.message.bright_green());
		if !documents.is_empty() {
			println!();
			println!("{}", "Sources:".bold());
			for doc in &documents {
				println!(
					"  {} {}",
					doc.title.bright_white(),
					format!("({})", doc.source).bright_black()
				);
			}
		}
	}

	Ok(())
}
