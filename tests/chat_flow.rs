// End-to-end submission flow: session controller + HTTP client against a
// mock chat service

use std::time::Duration;

use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use sourcechat::api::RemoteChatClient;
use sourcechat::session::{ChatSession, Role, SessionState, FAILURE_PREFIX};

const WINDOW: usize = 5;

#[tokio::test]
async fn submission_against_replying_service_appends_user_then_bot() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
			"message": "hi",
			"documents": []
		})))
		.mount(&server)
		.await;

	let client = RemoteChatClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
	let mut session = ChatSession::new(WINDOW);

	let reply = session.submit("hello", &client).await.unwrap();

	assert_eq!(reply.content, "hi");
	assert!(reply.documents.is_none());

	let log = session.messages();
	assert_eq!(log.len(), 2);
	assert_eq!(log[0].role, Role::User);
	assert_eq!(log[0].content, "hello");
	assert_eq!(log[1].role, Role::Bot);
	assert_eq!(log[1].content, "hi");
	assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn submission_against_failing_service_appends_failure_message() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(503).set_body_string("service down"))
		.mount(&server)
		.await;

	let client = RemoteChatClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
	let mut session = ChatSession::new(WINDOW);

	let reply = session.submit("hello", &client).await.unwrap();

	assert!(reply.content.starts_with(FAILURE_PREFIX));
	assert!(reply.content.contains("503"));
	assert!(reply.content.contains("service down"));
	assert!(reply.documents.is_none());

	let log = session.messages();
	assert_eq!(log.len(), 2);
	assert_eq!(log[0].content, "hello");
	assert_eq!(log[1].role, Role::Bot);
	assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn replies_with_duplicate_documents_are_deduplicated_in_the_log() {
	let server = MockServer::start().await;
	let document = |id: &str, source: &str| {
		serde_json::json!({
			"id": id,
			"source": source,
			"title": format!("Title {}", id),
			"content": "excerpt",
			"tags": ["guide"]
		})
	};
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
			"message": "answer",
			"documents": [
				document("1", "http://example.com/a"),
				document("2", "http://example.com/b"),
				document("3", "http://example.com/a"),
				document("4", "http://x/?post_type=page"),
			]
		})))
		.mount(&server)
		.await;

	let client = RemoteChatClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
	let mut session = ChatSession::new(WINDOW);

	let reply = session.submit("question", &client).await.unwrap();

	let documents = reply.documents.expect("surviving documents are kept");
	assert_eq!(documents.len(), 2);
	assert_eq!(documents[0].id, "1");
	assert_eq!(documents[1].id, "2");
}
