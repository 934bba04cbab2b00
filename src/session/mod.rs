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

// Session module: the message log and the submission state machine

mod documents;
pub mod logger;

pub use documents::filter_documents;

use crate::api::{ApiError, ChatBackend, ChatReply};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Prefix of the synthetic bot message appended when a request fails
pub const FAILURE_PREFIX: &str = "There was a problem with the request: ";

/// Default number of recent messages sent to the service as context
pub const DEFAULT_CONVERSATION_WINDOW: usize = 5;

fn current_timestamp() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}

/// Who authored a message
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
	#[serde(rename = "user")]
	User,
	#[serde(rename = "bot")]
	Bot,
}

/// A source document returned by the chat service alongside a reply.
/// Field names match the service wire format; documents are never mutated
/// locally. Deduplication identity is `source`, not `id`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Document {
	pub id: String,
	pub source: String,
	pub title: String,
	pub content: String,
	#[serde(default)]
	pub tags: Vec<String>,
}

/// One entry in the session's message log
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Message {
	pub role: Role,
	pub content: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub documents: Option<Vec<Document>>,
	pub timestamp: u64,
}

impl Message {
	pub fn user(content: &str) -> Self {
		Self {
			role: Role::User,
			content: content.to_string(),
			documents: None,
			timestamp: current_timestamp(),
		}
	}

	pub fn bot(content: String, documents: Option<Vec<Document>>) -> Self {
		Self {
			role: Role::Bot,
			content,
			documents,
			timestamp: current_timestamp(),
		}
	}
}

/// Submission state of the session. There is no dedicated error state:
/// failures resolve back to `Idle` with a synthetic bot message appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	Idle,
	Sending,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
	#[error("message is empty")]
	EmptyMessage,
	#[error("a request is already in flight")]
	RequestInFlight,
}

/// An accepted submission: the trimmed query plus the conversation window
/// snapshotted before the user message was appended to the log.
#[derive(Debug, Clone)]
pub struct PendingRequest {
	pub query: String,
	pub conversation: Vec<Message>,
}

/// Holder of the message log and in-flight request state for one user's
/// chat interaction. The log is append-only and owned exclusively by the
/// session; rendering layers read it through `messages()`.
pub struct ChatSession {
	messages: Vec<Message>,
	state: SessionState,
	window_size: usize,
}

impl ChatSession {
	pub fn new(window_size: usize) -> Self {
		Self {
			messages: Vec::new(),
			state: SessionState::Idle,
			window_size,
		}
	}

	/// Read-only view of the full message log, in turn-taking order
	pub fn messages(&self) -> &[Message] {
		&self.messages
	}

	pub fn state(&self) -> SessionState {
		self.state
	}

	pub fn window_size(&self) -> usize {
		self.window_size
	}

	/// The bounded recent-history slice sent to the service as context:
	/// the last `window_size` messages of the log, or the whole log when it
	/// is shorter. Recomputed on every call, never stored.
	pub fn conversation_window(&self) -> &[Message] {
		let start = self.messages.len().saturating_sub(self.window_size);
		&self.messages[start..]
	}

	/// Drop the whole log. Only valid between requests.
	pub fn clear(&mut self) -> Result<(), SessionError> {
		if self.state == SessionState::Sending {
			return Err(SessionError::RequestInFlight);
		}
		self.messages.clear();
		Ok(())
	}

	/// Transition `Idle -> Sending`.
	///
	/// Accepts a non-empty (post-trim) submission: snapshots the
	/// conversation window BEFORE the new user message is appended, appends
	/// the user message, and returns the pending request for the remote
	/// call. A submission while a request is outstanding is rejected and
	/// mutates nothing.
	pub fn begin(&mut self, input: &str) -> Result<PendingRequest, SessionError> {
		if self.state == SessionState::Sending {
			return Err(SessionError::RequestInFlight);
		}

		let query = input.trim();
		if query.is_empty() {
			return Err(SessionError::EmptyMessage);
		}

		let conversation = self.conversation_window().to_vec();
		self.messages.push(Message::user(query));
		self.state = SessionState::Sending;

		Ok(PendingRequest {
			query: query.to_string(),
			conversation,
		})
	}

	/// Transition `Sending -> Idle` on success: append the bot reply with
	/// its documents filtered for display. An empty post-filter document
	/// list is stored as no documents at all.
	pub fn complete(&mut self, reply: ChatReply) -> Message {
		let filtered = filter_documents(reply.documents);
		let documents = if filtered.is_empty() {
			None
		} else {
			Some(filtered)
		};

		let message = Message::bot(reply.message, documents);
		self.messages.push(message.clone());
		self.state = SessionState::Idle;
		message
	}

	/// Transition `Sending -> Idle` on failure: append a synthetic bot
	/// message embedding the error description. No documents.
	pub fn fail(&mut self, error: &ApiError) -> Message {
		let message = Message::bot(format!("{}{}", FAILURE_PREFIX, error), None);
		self.messages.push(message.clone());
		self.state = SessionState::Idle;
		message
	}

	/// Drive one full submission: begin, call the backend, settle.
	///
	/// The user-message append is synchronous and always precedes the
	/// network call; the bot-message append happens after the call settles,
	/// exactly once per accepted submission. Backend errors never escape:
	/// they become the synthetic failure message.
	pub async fn submit(
		&mut self,
		input: &str,
		backend: &dyn ChatBackend,
	) -> Result<Message, SessionError> {
		let pending = self.begin(input)?;

		match backend.chat(&pending.query, &pending.conversation).await {
			Ok(reply) => Ok(self.complete(reply)),
			Err(error) => Ok(self.fail(&error)),
		}
	}
}
