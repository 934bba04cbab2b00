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

// Interactive chat session command

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{CompletionType, Config as RustylineConfig, EditMode, Editor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use sourcechat::api::RemoteChatClient;
use sourcechat::config::Config;
use sourcechat::session::{logger, ChatSession, Message, SessionError, FAILURE_PREFIX};

use super::animation::show_loading_animation;

// Session commands
pub const HELP_COMMAND: &str = "/help";
pub const EXIT_COMMAND: &str = "/exit";
pub const QUIT_COMMAND: &str = "/quit";
pub const CLEAR_COMMAND: &str = "/clear";

#[derive(Args, Debug, Default)]
pub struct ChatArgs {
	/// Use a specific endpoint instead of the configured one (runtime only, not saved)
	#[arg(long)]
	pub endpoint: Option<String>,

	/// Override the conversation window size (runtime only, not saved)
	#[arg(long)]
	pub window: Option<usize>,

	/// Name for the session log file
	#[arg(long, short)]
	pub session: Option<String>,
}

pub async fn execute(args: &ChatArgs, config: &Config) -> Result<()> {
	let endpoint = args
		.endpoint
		.clone()
		.unwrap_or_else(|| config.endpoint.clone());
	sourcechat::config::validate_endpoint(&endpoint)?;

	let window_size = args.window.unwrap_or(config.conversation_window);
	let session_name = args
		.session
		.clone()
		.unwrap_or_else(logger::default_session_name);
	let log_enabled = config.log_level.is_info_enabled();
	let debug = config.log_level.is_debug_enabled();

	// Ctrl+C during a request sets this flag; the client reports the
	// request as cancelled once it settles. During line editing rustyline
	// handles Ctrl+C itself, so the handler only fires mid-request.
	let ctrl_c_pressed = Arc::new(AtomicBool::new(false));
	{
		let flag = ctrl_c_pressed.clone();
		ctrlc::set_handler(move || {
			flag.store(true, Ordering::SeqCst);
			println!("\nCtrl+C pressed, cancelling the current request...");
		})?;
	}

	let client = RemoteChatClient::new(&endpoint, config.request_timeout())?
		.with_cancel_flag(ctrl_c_pressed.clone());
	let mut session = ChatSession::new(window_size);

	println!(
		"{} {}",
		"Connected to".bright_black(),
		endpoint.bright_white()
	);
	println!(
		"{}",
		format!("Type a message to chat, {} for commands.", HELP_COMMAND).bright_black()
	);
	println!();

	loop {
		let input = read_user_input()?;
		let trimmed = input.trim();

		if trimmed.is_empty() {
			continue;
		}

		if trimmed.starts_with('/') {
			if log_enabled {
				let _ = logger::log_session_command(&session_name, trimmed);
			}

			match trimmed {
				HELP_COMMAND => print_help(),
				EXIT_COMMAND | QUIT_COMMAND => {
					println!("Exiting session.");
					break;
				}
				CLEAR_COMMAND => match session.clear() {
					Ok(()) => println!("{}", "Conversation cleared.".bright_black()),
					Err(e) => println!("{}", e.to_string().yellow()),
				},
				unknown => {
					println!(
						"Unknown command: {}. Type {} for available commands.",
						unknown, HELP_COMMAND
					);
				}
			}
			continue;
		}

		// Fresh cancellation state for each request
		ctrl_c_pressed.store(false, Ordering::SeqCst);

		// Spawn the loading animation while the request is in flight
		let animation_cancel = Arc::new(AtomicBool::new(false));
		let animation_flag = animation_cancel.clone();
		let animation_handle = tokio::spawn(async move {
			let _ = show_loading_animation(animation_flag).await;
		});

		let request_start = Instant::now();
		let result = session.submit(trimmed, &client).await;

		// Stop the animation before printing anything
		animation_cancel.store(true, Ordering::SeqCst);
		let _ = animation_handle.await;

		match result {
			Ok(message) => {
				if debug {
					println!(
						"{}",
						format!(
							"Request settled in {} ms ({} messages in log)",
							request_start.elapsed().as_millis(),
							session.messages().len()
						)
						.bright_black()
					);
				}

				print_bot_message(&message);

				if log_enabled {
					// Log the user message and the reply that settled it
					let log = session.messages();
					for entry in log.iter().rev().take(2).rev() {
						let _ = logger::log_message(&session_name, entry);
					}
					if message.content.starts_with(FAILURE_PREFIX) {
						let _ = logger::log_error(&session_name, &message.content);
					}
				}
			}
			Err(SessionError::EmptyMessage) => continue,
			Err(SessionError::RequestInFlight) => {
				println!(
					"{}",
					"A request is already in flight, please wait.".yellow()
				);
			}
		}
	}

	Ok(())
}

// Read user input with history support
fn read_user_input() -> Result<String> {
	// Configure rustyline
	let rustyline_config = RustylineConfig::builder()
		.completion_type(CompletionType::List)
		.edit_mode(EditMode::Emacs)
		.auto_add_history(true) // Automatically add lines to history
		.bell_style(rustyline::config::BellStyle::None) // No bell
		.build();

	let mut editor: Editor<(), rustyline::history::FileHistory> =
		Editor::with_config(rustyline_config)?;

	let prompt = "> ".bright_blue().to_string();

	match editor.readline(&prompt) {
		Ok(line) => {
			let _ = editor.add_history_entry(line.clone());
			Ok(line)
		}
		Err(ReadlineError::Interrupted) => {
			// Ctrl+C at the prompt just clears the line
			println!("\nCancelled");
			Ok(String::new())
		}
		Err(ReadlineError::Eof) => {
			// Ctrl+D ends the session
			Ok(EXIT_COMMAND.to_string())
		}
		Err(err) => {
			println!("Error: {:?}", err);
			Ok(String::new())
		}
	}
}

// Print a bot message with its source list
fn print_bot_message(message: &Message) {
	println!();
	println!("{}", message.content.bright_green());

	if let Some(documents) = &message.documents {
		println!();
		println!("{}", "Sources:".bold());
		for doc in documents {
			println!(
				"  {} {}",
				doc.title.bright_white(),
				format!("({})", doc.source).bright_black()
			);
		}
	}
	println!();
}

fn print_help() {
	println!("Available commands:");
	println!("  {} - Show this help", HELP_COMMAND);
	println!("  {} - Clear the conversation log", CLEAR_COMMAND);
	println!("  {} - Exit the session", EXIT_COMMAND);
	println!("  {} - Exit the session", QUIT_COMMAND);
}
