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

// Session logging - single JSONL file per session with typed entries

use crate::session::{Document, Message, Role};
use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Generate a session name from the current local time
pub fn default_session_name() -> String {
	let now = chrono::Local::now();
	format!("chat_{}", now.format("%Y%m%d_%H%M%S"))
}

/// Get the JSONL log file path for a session
pub fn get_session_log_file(session_name: &str) -> Result<PathBuf> {
	let sessions_dir = crate::directories::get_sessions_dir()?;
	Ok(sessions_dir.join(format!("{}.jsonl", session_name)))
}

/// Log one message from the session log, user or bot. Bot messages carry
/// their (already filtered) source list.
pub fn log_message(session_name: &str, message: &Message) -> Result<()> {
	let log_file = get_session_log_file(session_name)?;

	let entry_type = match message.role {
		Role::User => "USER",
		Role::Bot => "BOT",
	};
	let sources = message.documents.as_deref().map(document_sources);

	let log_entry = serde_json::json!({
		"type": entry_type,
		"timestamp": message.timestamp,
		"content": message.content,
		"sources": sources,
	});
	append_to_log(&log_file, &serde_json::to_string(&log_entry)?)?;
	Ok(())
}

/// Log errors for debugging
pub fn log_error(session_name: &str, error: &str) -> Result<()> {
	let log_file = get_session_log_file(session_name)?;
	let log_entry = serde_json::json!({
		"type": "ERROR",
		"timestamp": get_timestamp(),
		"error": error
	});
	append_to_log(&log_file, &serde_json::to_string(&log_entry)?)?;
	Ok(())
}

/// Log session command execution (/clear and friends)
pub fn log_session_command(session_name: &str, command_line: &str) -> Result<()> {
	let log_file = get_session_log_file(session_name)?;
	let log_entry = serde_json::json!({
		"type": "COMMAND",
		"timestamp": get_timestamp(),
		"command": command_line
	});
	append_to_log(&log_file, &serde_json::to_string(&log_entry)?)?;
	Ok(())
}

fn document_sources(documents: &[Document]) -> Vec<serde_json::Value> {
	documents
		.iter()
		.map(|doc| {
			serde_json::json!({
				"title": doc.title,
				"source": doc.source,
			})
		})
		.collect()
}

/// Helper to get timestamp
fn get_timestamp() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}

/// Helper to append to log file ensuring single lines
fn append_to_log(log_file: &PathBuf, content: &str) -> Result<()> {
	let mut file = OpenOptions::new()
		.create(true)
		.append(true)
		.open(log_file)?;

	// Ensure content is on a single line - replace any newlines with spaces
	let single_line_content = content.replace(['\n', '\r'], " ");
	writeln!(file, "{}", single_line_content)?;
	Ok(())
}
