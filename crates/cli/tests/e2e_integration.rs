//! End-to-end tests for the DocRelay relay.
//!
//! These run the whole stack (gateway router, SQLite store, relay pipeline
//! and real HTTP providers) against local provider doubles.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use docrelay_config::{AppConfig, ModelConfig, ProviderConfig};
use docrelay_documents::SqliteDocumentStore;
use docrelay_gateway::{GatewayState, build_router};
use docrelay_relay::RelayPipeline;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

// ── Provider doubles ─────────────────────────────────────────────────────

type Seen = Arc<Mutex<Vec<(HeaderMap, Value)>>>;

/// A provider endpoint that records every request and answers with a fixed
/// status and body.
struct ProviderDouble {
    url: String,
    seen: Seen,
}

impl ProviderDouble {
    async fn spawn(path: &str, status: u16, reply: Value) -> Self {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();

        let app = Router::new().route(
            path,
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let recorder = recorder.clone();
                let reply = reply.clone();
                async move {
                    recorder.lock().unwrap().push((headers, body));
                    (StatusCode::from_u16(status).unwrap(), Json(reply))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}{path}"),
            seen,
        }
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn last(&self) -> (HeaderMap, Value) {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

fn chat_reply(text: &str) -> Value {
    json!({
        "id": "chatcmpl-e2e",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }]
    })
}

// ── Harness ──────────────────────────────────────────────────────────────

struct Stack {
    app: Router,
    openai: ProviderDouble,
    claude: ProviderDouble,
    custom: ProviderDouble,
}

async fn stack(
    custom_status: u16,
    custom_reply: Value,
    customize: impl FnOnce(&mut AppConfig),
) -> Stack {
    let openai =
        ProviderDouble::spawn("/v1/chat/completions", 200, chat_reply("# OpenAI answer")).await;
    let claude = ProviderDouble::spawn(
        "/v1/complete",
        200,
        json!({"completion": " Claude answer", "stop_reason": "stop_sequence"}),
    )
    .await;
    let custom = ProviderDouble::spawn("/process", custom_status, custom_reply).await;

    let mut config = AppConfig::default();
    config.providers.openai = ProviderConfig {
        api_key: Some("sk-operator-openai".into()),
        api_url: openai.url.trim_end_matches("/chat/completions").to_string(),
        timeout_secs: 5,
        ..ProviderConfig::openai()
    };
    config.providers.claude = ProviderConfig {
        api_key: Some("sk-operator-claude".into()),
        api_url: claude.url.clone(),
        timeout_secs: 5,
        ..ProviderConfig::claude()
    };
    config.providers.custom = ProviderConfig {
        api_key: Some("operator-custom".into()),
        api_url: custom.url.clone(),
        timeout_secs: 5,
        ..ProviderConfig::custom()
    };
    customize(&mut config);

    let store = Arc::new(SqliteDocumentStore::open("sqlite::memory:", 1).await.unwrap());
    let pipeline = RelayPipeline::from_config(&config, store.clone()).unwrap();
    let state = Arc::new(GatewayState {
        pipeline: Arc::new(pipeline),
        store,
        bearer_tokens: config.gateway.bearer_tokens.clone(),
    });

    Stack {
        app: build_router(state, &config.gateway),
        openai,
        claude,
        custom,
    }
}

async fn call(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn upload(app: &Router, filename: &str, content: &str) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/api/documents",
        json!({"filename": filename, "content": content}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

// ── E2E: relay through each provider ────────────────────────────────────

#[tokio::test]
async fn e2e_openai_relay_in_caller_order() {
    let s = stack(200, json!({"result": "unused"}), |_| {}).await;
    let a = upload(&s.app, "a.txt", "Alpha findings.").await;
    let b = upload(&s.app, "b.txt", "Beta findings.").await;

    let (status, body) = call(
        &s.app,
        "POST",
        "/api/send-to-ai",
        json!({"api": "openai", "prompt": "Compare them", "selectedDocumentIds": [b, a]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "message": "# OpenAI answer"}));

    let (headers, sent) = s.openai.last();
    assert_eq!(headers["authorization"], "Bearer sk-operator-openai");
    assert_eq!(sent["model"], "gpt-3.5-turbo");
    assert_eq!(sent["max_tokens"], 100);
    assert_eq!(sent["messages"][0]["content"], "You are a helpful assistant.");
    assert_eq!(
        sent["messages"][1]["content"],
        "Beta findings.\n\nAlpha findings.\n\nCompare them\n\nFormat the response in Markdown."
    );
    assert_eq!(s.claude.calls(), 0);
    assert_eq!(s.custom.calls(), 0);
}

#[tokio::test]
async fn e2e_claude_with_caller_key() {
    let s = stack(200, json!({"result": "unused"}), |_| {}).await;
    let doc = upload(&s.app, "notes.txt", "Meeting notes.").await;

    let (status, body) = call(
        &s.app,
        "POST",
        "/api/send-to-ai",
        json!({
            "api": "claude",
            "selectedDocumentIds": [doc],
            "useFrontendApiKey": true,
            "claudeApiKey": "sk-caller-claude",
            "maxTokens": "300"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Claude answer");

    let (headers, sent) = s.claude.last();
    assert_eq!(headers["authorization"], "Bearer sk-caller-claude");
    assert!(headers.contains_key("anthropic-version"));
    assert_eq!(sent["max_tokens_to_sample"], 300);
    assert_eq!(
        sent["prompt"],
        "\n\nHuman: Meeting notes.\n\nSummarize\n\nFormat the response in Markdown.\n\nAssistant:"
    );
}

#[tokio::test]
async fn e2e_custom_fields_and_truncation() {
    let s = stack(200, json!({"output": {"text": "custom answer"}}), |config| {
        config.providers.custom.model = "small-custom".into();
        config.providers.custom.prompt_field = Some("input".into());
        config.providers.custom.max_tokens_field = Some("limit".into());
        config.providers.custom.response_field = Some("output.text".into());
        config.models.push(ModelConfig {
            id: "small-custom".into(),
            context_window: 300,
            tokenizer: "cl100k_base".into(),
        });
    })
    .await;
    let doc = upload(&s.app, "short.txt", "A short document.").await;

    let (status, body) = call(
        &s.app,
        "POST",
        "/api/send-to-ai",
        json!({"api": "custom", "selectedDocumentIds": [doc], "maxTokens": 1000}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "custom answer");

    let (_, sent) = s.custom.last();
    assert_eq!(sent["model"], "small-custom");
    assert!(sent["input"].as_str().unwrap().starts_with("A short document."));
    let limit = sent["limit"].as_u64().unwrap();
    assert!(limit > 0 && limit < 200, "limit was {limit}");
}

// ── E2E: failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_provider_error_passes_through() {
    let s = stack(500, json!({"error": "model overloaded"}), |_| {}).await;
    let doc = upload(&s.app, "a.txt", "Text.").await;

    let (status, body) = call(
        &s.app,
        "POST",
        "/api/send-to-ai",
        json!({"api": "custom", "selectedDocumentIds": [doc]}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "provider");
    assert_eq!(body["details"], json!({"error": "model overloaded"}));
    assert_eq!(s.custom.calls(), 1);
}

#[tokio::test]
async fn e2e_malformed_provider_reply_is_502() {
    let s = stack(200, json!({"unexpected": true}), |_| {}).await;
    let doc = upload(&s.app, "a.txt", "Text.").await;

    let (status, body) = call(
        &s.app,
        "POST",
        "/api/send-to-ai",
        json!({"api": "custom", "selectedDocumentIds": [doc]}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "normalization");
}

#[tokio::test]
async fn e2e_rejections_make_no_provider_calls() {
    let s = stack(200, json!({"result": "x"}), |_| {}).await;
    let doc = upload(&s.app, "a.txt", "Text.").await;

    let (status, _) = call(
        &s.app,
        "POST",
        "/api/send-to-ai",
        json!({"api": "OpenAI", "selectedDocumentIds": [doc]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &s.app,
        "POST",
        "/api/send-to-ai",
        json!({"api": "openai", "selectedDocumentIds": []}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &s.app,
        "POST",
        "/api/send-to-ai",
        json!({
            "api": "openai",
            "selectedDocumentIds": [doc],
            "useFrontendApiKey": true,
            "openAiApiKey": "  "
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "credential");

    let (status, body) = call(
        &s.app,
        "POST",
        "/api/send-to-ai",
        json!({"api": "openai", "selectedDocumentIds": ["ffffffffffffffffffffffff"]}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "resolution");

    assert_eq!(s.openai.calls(), 0);
}

#[tokio::test]
async fn e2e_missing_operator_key_is_credential_error() {
    let s = stack(200, json!({"result": "x"}), |config| {
        config.providers.custom.api_key = None;
    })
    .await;
    let doc = upload(&s.app, "a.txt", "Text.").await;

    let (status, body) = call(
        &s.app,
        "POST",
        "/api/send-to-ai",
        json!({"api": "custom", "selectedDocumentIds": [doc]}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "credential");
    assert_eq!(s.custom.calls(), 0);
}

// ── E2E: document lifecycle ──────────────────────────────────────────────

#[tokio::test]
async fn e2e_document_lifecycle() {
    let s = stack(200, json!({"result": "x"}), |_| {}).await;
    let first = upload(&s.app, "first.txt", "one").await;
    let second = upload(&s.app, "second.txt", "two").await;

    let (status, body) = call(&s.app, "GET", "/api/uploaded-documents", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["documents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![second.as_str(), first.as_str()]);

    let (status, body) = call(
        &s.app,
        "DELETE",
        "/api/delete-documents",
        json!({"documentIds": [first]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);

    let (status, _) = call(
        &s.app,
        "POST",
        "/api/send-to-ai",
        json!({"api": "custom", "selectedDocumentIds": [first]}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn e2e_bearer_auth() {
    let s = stack(200, json!({"result": "x"}), |config| {
        config.gateway.bearer_tokens = vec!["gateway-token".into()];
    })
    .await;

    let (status, _) = call(&s.app, "GET", "/api/uploaded-documents", Value::Null).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/api/uploaded-documents")
        .header("Authorization", "Bearer gateway-token")
        .body(Body::empty())
        .unwrap();
    let response = s.app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = s.app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
