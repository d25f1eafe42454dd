//! Integration tests for the completion client adapter against a mock
//! chat-completions endpoint.

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use predica_cli::api::{system_instruction, CompletionClient, OpenAiClient, Reply, ResponseSchema};
use predica_cli::config::AiConfig;
use predica_cli::error::PredicaError;
use predica_cli::session::Language;

fn client_for(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new(&AiConfig {
        api_url: server.uri(),
        api_key: "test-key".to_string(),
        model: "gpt-4o-mini".to_string(),
        max_tokens: Some(256),
    })
}

fn chat_reply(content: &str) -> Value {
    json!({
        "choices": [
            { "message": { "content": content }, "finish_reason": "stop" }
        ],
        "usage": { "prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30 }
    })
}

async fn first_request_body(server: &MockServer) -> Value {
    let requests = server
        .received_requests()
        .await
        .expect("request recording enabled");
    serde_json::from_slice(&requests[0].body).expect("request body is JSON")
}

#[tokio::test]
async fn test_text_reply_is_trimmed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("  Une homélie.  ")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reply = client
        .complete("Proposer une homélie", Language::French, None)
        .await
        .unwrap();

    assert_eq!(reply, Reply::Text("Une homélie.".to_string()));
}

#[tokio::test]
async fn test_each_language_sends_its_own_system_instruction() {
    for language in Language::all() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("ok")))
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.complete("un texte", language, None).await.unwrap();

        let body = first_request_body(&server).await;
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(
            body["messages"][0]["content"],
            system_instruction(language),
            "wrong system instruction for {language}"
        );
        // The other languages' instruction texts never leak in
        for other in Language::all() {
            if other != language {
                assert_ne!(body["messages"][0]["content"], system_instruction(other));
            }
        }
    }
}

#[tokio::test]
async fn test_structured_request_carries_schema_and_parses_reply() {
    let server = MockServer::start().await;
    let content = "{\"key_messages\": [\"un\", \"deux\", \"trois\", \"quatre\", \"cinq\"]}";
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(content)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reply = client
        .complete(
            "Proposer 5 messages clés",
            Language::French,
            Some(ResponseSchema::KeyMessages),
        )
        .await
        .unwrap();

    assert_eq!(
        reply,
        Reply::KeyMessages(vec![
            "un".to_string(),
            "deux".to_string(),
            "trois".to_string(),
            "quatre".to_string(),
            "cinq".to_string(),
        ])
    );

    let body = first_request_body(&server).await;
    assert_eq!(body["response_format"]["type"], "json_schema");
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["max_tokens"], 256);
}

#[tokio::test]
async fn test_structured_reply_that_is_not_a_list_is_a_schema_violation() {
    let server = MockServer::start().await;
    let content = "{\"key_messages\": \"un seul message\"}";
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(content)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .complete("Proposer 5 messages clés", Language::French, Some(ResponseSchema::KeyMessages))
        .await;

    assert_matches!(result, Err(PredicaError::SchemaViolation(_)));
}

#[tokio::test]
async fn test_structured_reply_that_is_not_json_is_a_schema_violation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_reply("Voici cinq messages clés : ...")),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .complete("Proposer 5 messages clés", Language::French, Some(ResponseSchema::KeyMessages))
        .await;

    assert_matches!(result, Err(PredicaError::SchemaViolation(_)));
}

#[tokio::test]
async fn test_empty_key_message_list_is_a_schema_violation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_reply("{\"key_messages\": []}")),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .complete("Proposer 5 messages clés", Language::French, Some(ResponseSchema::KeyMessages))
        .await;

    assert_matches!(result, Err(PredicaError::SchemaViolation(_)));
}

#[tokio::test]
async fn test_server_error_is_upstream_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.complete("un texte", Language::English, None).await;

    assert_matches!(result, Err(PredicaError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn test_auth_failure_is_upstream_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": {"message": "Invalid API key"}})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.complete("un texto", Language::Spanish, None).await;

    let error = result.unwrap_err();
    assert_matches!(error, PredicaError::UpstreamUnavailable(_));
    assert!(error.to_string().contains("401"));
}

#[tokio::test]
async fn test_reply_without_content_is_upstream_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.complete("un texte", Language::French, None).await;

    assert_matches!(result, Err(PredicaError::UpstreamUnavailable(_)));
}
