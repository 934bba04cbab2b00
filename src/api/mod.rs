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

// HTTP boundary: the single chat endpoint and its wire format

use crate::session::{Document, Message, Role};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// Bodies quoted in error messages are capped to keep the synthetic failure
// message readable
const ERROR_BODY_LIMIT: usize = 200;

/// Errors from the chat service boundary. The session controller converts
/// every kind into a visible failure message; nothing here is retried.
#[derive(Debug, Error)]
pub enum ApiError {
	#[error("request failed: {0}")]
	Transport(#[from] reqwest::Error),
	#[error("chat service returned HTTP {status}: {body}")]
	Status { status: u16, body: String },
	#[error("malformed reply from chat service: {0}")]
	MalformedReply(String),
	#[error("failed to encode conversation payload: {0}")]
	Payload(#[source] serde_json::Error),
	#[error("request cancelled")]
	Cancelled,
}

/// A successful reply from the chat service, validated against this schema
/// at the boundary. Both fields are required; a 2xx body that does not
/// match is reported as `ApiError::MalformedReply`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
	pub message: String,
	pub documents: Vec<Document>,
}

/// Request body for the chat endpoint.
///
/// `conversation` is a JSON-encoded string whose contents are themselves
/// the JSON array of wire messages. The deployed service expects this
/// double encoding, so the client preserves it.
#[derive(Debug, Serialize)]
struct ChatRequest {
	query: String,
	conversation: String,
}

/// Message format for the chat service wire. Unlike the session's own
/// `Message`, wire messages carry no timestamp and use the service's
/// field names.
#[derive(Debug, Serialize)]
struct WireMessage<'a> {
	#[serde(rename = "type")]
	role: Role,
	content: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	docs: Option<&'a [Document]>,
}

// Convert session messages to the wire format
fn convert_messages(messages: &[Message]) -> Vec<WireMessage<'_>> {
	messages
		.iter()
		.map(|msg| WireMessage {
			role: msg.role,
			content: &msg.content,
			docs: msg.documents.as_deref(),
		})
		.collect()
}

// Serialize the conversation window into the inner JSON string
fn encode_conversation(messages: &[Message]) -> Result<String, ApiError> {
	serde_json::to_string(&convert_messages(messages)).map_err(ApiError::Payload)
}

fn body_snippet(body: &str) -> String {
	let trimmed = body.trim();
	if trimmed.chars().count() > ERROR_BODY_LIMIT {
		let cut: String = trimmed.chars().take(ERROR_BODY_LIMIT).collect();
		format!("{}...", cut)
	} else {
		trimmed.to_string()
	}
}

/// Anything that can answer a chat query given the recent conversation.
/// The remote client implements it for production; tests substitute stubs.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
	async fn chat(&self, query: &str, conversation: &[Message]) -> Result<ChatReply, ApiError>;
}

/// Client for the remote chat endpoint: one POST per submission, no
/// streaming, no retry. An optional shared flag cancels around the request.
pub struct RemoteChatClient {
	endpoint: String,
	client: Client,
	cancel_flag: Option<Arc<AtomicBool>>,
}

impl RemoteChatClient {
	pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ApiError> {
		let client = Client::builder().timeout(timeout).build()?;

		Ok(Self {
			endpoint: endpoint.to_string(),
			client,
			cancel_flag: None,
		})
	}

	/// Attach a shared cancellation flag, typically set from a Ctrl+C
	/// handler. The flag is checked before the request starts and after it
	/// settles; a set flag surfaces as `ApiError::Cancelled`.
	pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
		self.cancel_flag = Some(flag);
		self
	}

	fn check_cancelled(&self) -> Result<(), ApiError> {
		if let Some(ref flag) = self.cancel_flag {
			if flag.load(Ordering::SeqCst) {
				return Err(ApiError::Cancelled);
			}
		}
		Ok(())
	}
}

#[async_trait::async_trait]
impl ChatBackend for RemoteChatClient {
	async fn chat(&self, query: &str, conversation: &[Message]) -> Result<ChatReply, ApiError> {
		// Check for cancellation before starting
		self.check_cancelled()?;

		let request_body = ChatRequest {
			query: query.to_string(),
			conversation: encode_conversation(conversation)?,
		};

		let response = self
			.client
			.post(&self.endpoint)
			.header("Content-Type", "application/json")
			.json(&request_body)
			.send()
			.await?;

		let status = response.status();
		let body = response.text().await?;

		// A request cancelled mid-flight still settled; report it as
		// cancelled rather than surfacing a reply nobody is waiting for
		self.check_cancelled()?;

		// Any non-success status is one uniform failure kind; the status
		// code only feeds the error description
		if !status.is_success() {
			return Err(ApiError::Status {
				status: status.as_u16(),
				body: body_snippet(&body),
			});
		}

		serde_json::from_str::<ChatReply>(&body).map_err(|e| {
			ApiError::MalformedReply(format!("{}. Response: {}", e, body_snippet(&body)))
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::matchers::{method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn user_message(content: &str) -> Message {
		Message::user(content)
	}

	fn bot_message_with_doc(content: &str) -> Message {
		Message::bot(
			content.to_string(),
			Some(vec![Document {
				id: "d1".to_string(),
				source: "http://example.com/a".to_string(),
				title: "A".to_string(),
				content: "excerpt".to_string(),
				tags: vec!["guide".to_string()],
			}]),
		)
	}

	#[test]
	fn test_conversation_is_double_encoded() {
		let window = vec![user_message("hi"), bot_message_with_doc("hello")];

		let encoded = encode_conversation(&window).unwrap();

		// The encoded value is itself a JSON document: an array of wire
		// messages without timestamps
		let inner: serde_json::Value = serde_json::from_str(&encoded).unwrap();
		let items = inner.as_array().unwrap();
		assert_eq!(items.len(), 2);
		assert_eq!(items[0]["type"], "user");
		assert_eq!(items[0]["content"], "hi");
		assert!(items[0].get("docs").is_none());
		assert!(items[0].get("timestamp").is_none());
		assert_eq!(items[1]["type"], "bot");
		assert_eq!(items[1]["docs"][0]["source"], "http://example.com/a");
	}

	#[test]
	fn test_empty_conversation_encodes_as_empty_array() {
		assert_eq!(encode_conversation(&[]).unwrap(), "[]");
	}

	#[test]
	fn test_body_snippet_truncates_long_bodies() {
		let long = "x".repeat(500);
		let snippet = body_snippet(&long);
		assert!(snippet.ends_with("..."));
		assert!(snippet.chars().count() <= ERROR_BODY_LIMIT + 3);
	}

	#[tokio::test]
	async fn test_successful_reply_is_parsed() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"message": "hi",
				"documents": [{
					"id": "1",
					"source": "http://example.com/a",
					"title": "A",
					"content": "excerpt",
					"tags": ["guide"]
				}]
			})))
			.mount(&server)
			.await;

		let client = RemoteChatClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
		let reply = client.chat("hello", &[]).await.unwrap();

		assert_eq!(reply.message, "hi");
		assert_eq!(reply.documents.len(), 1);
		assert_eq!(reply.documents[0].source, "http://example.com/a");
	}

	#[tokio::test]
	async fn test_request_carries_query_and_encoded_window() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"message": "ok",
				"documents": []
			})))
			.mount(&server)
			.await;

		let window = vec![user_message("first"), bot_message_with_doc("second")];
		let client = RemoteChatClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
		client.chat("third", &window).await.unwrap();

		let requests = server.received_requests().await.unwrap();
		assert_eq!(requests.len(), 1);

		let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
		assert_eq!(body["query"], "third");

		// The conversation field is a string, not a nested array
		let conversation = body["conversation"].as_str().unwrap();
		let inner: serde_json::Value = serde_json::from_str(conversation).unwrap();
		assert_eq!(inner.as_array().unwrap().len(), 2);
		assert_eq!(inner[0]["content"], "first");
	}

	#[tokio::test]
	async fn test_non_success_status_maps_to_status_error() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
			.mount(&server)
			.await;

		let client = RemoteChatClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
		let error = client.chat("hello", &[]).await.unwrap_err();

		match error {
			ApiError::Status { status, body } => {
				assert_eq!(status, 500);
				assert_eq!(body, "upstream exploded");
			}
			other => panic!("expected Status error, got: {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_malformed_success_body_is_a_distinct_error() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(
				ResponseTemplate::new(200)
					.set_body_json(serde_json::json!({ "unexpected": true })),
			)
			.mount(&server)
			.await;

		let client = RemoteChatClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
		let error = client.chat("hello", &[]).await.unwrap_err();

		assert!(matches!(error, ApiError::MalformedReply(_)));
	}

	#[tokio::test]
	async fn test_set_cancel_flag_short_circuits_the_request() {
		let flag = Arc::new(AtomicBool::new(true));
		// Endpoint is never contacted; any address works
		let client = RemoteChatClient::new("http://127.0.0.1:9", Duration::from_secs(5))
			.unwrap()
			.with_cancel_flag(flag);

		let error = client.chat("hello", &[]).await.unwrap_err();

		assert!(matches!(error, ApiError::Cancelled));
	}

	#[tokio::test]
	async fn test_transport_failure_maps_to_transport_error() {
		// Nothing listens on this port; the connection is refused
		let client =
			RemoteChatClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

		let error = client.chat("hello", &[]).await.unwrap_err();

		assert!(matches!(error, ApiError::Transport(_)));
	}
}
