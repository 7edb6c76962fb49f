//! # Groq Client
//!
//! Streams completions from Groq's OpenAI-compatible endpoint through
//! `genai`. `LLM_API_URL` names the full completions URL
//! (`.../openai/v1/chat/completions`); any provider speaking the same
//! protocol works by pointing it elsewhere.

use super::{ChatCompletion, CompletionRequest, LlmError, Role};
use async_trait::async_trait;
use futures_util::StreamExt;
use genai::adapter::AdapterKind;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest, ChatStreamEvent};
use genai::resolver::{AuthData, Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};
use lib_core::LlmConfig;
use tracing::{debug, warn};

const COMPLETIONS_PATH: &str = "chat/completions";

pub struct GroqClient {
    client: Client,
}

impl GroqClient {
    pub fn new(config: LlmConfig) -> Self {
        let base_url = endpoint_base(&config.api_url);
        let api_key = config.api_key;

        // Every model name is routed to the Groq adapter at the configured URL.
        let target_resolver = ServiceTargetResolver::from_resolver_fn(
            move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
                let ServiceTarget { model, .. } = target;
                Ok(ServiceTarget {
                    endpoint: Endpoint::from_owned(base_url.clone()),
                    auth: AuthData::from_single(api_key.clone()),
                    model: ModelIden::new(AdapterKind::Groq, model.model_name),
                })
            },
        );

        let client = Client::builder()
            .with_service_target_resolver(target_resolver)
            .build();

        Self { client }
    }
}

/// Base URL the adapter appends `chat/completions` to.
fn endpoint_base(api_url: &str) -> String {
    let trimmed = api_url.trim_end_matches('/');
    let base = trimmed.strip_suffix(COMPLETIONS_PATH).unwrap_or(trimmed);
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    }
}

fn chat_request(request: &CompletionRequest) -> ChatRequest {
    request
        .messages
        .iter()
        .fold(ChatRequest::default(), |chat_req, message| match message.role {
            Role::System => chat_req.with_system(&message.content),
            Role::User => chat_req.append_message(ChatMessage::user(&message.content)),
        })
}

#[async_trait]
impl ChatCompletion for GroqClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        debug!(model = %request.model, "[LLM] Sending completion request");

        let options = ChatOptions::default()
            .with_temperature(request.temperature)
            .with_max_tokens(request.max_tokens)
            .with_top_p(request.top_p);

        let response = self
            .client
            .exec_chat_stream(request.model.as_str(), chat_request(request), Some(&options))
            .await
            .map_err(|e| LlmError::Provider(e.to_string()))?;

        let mut stream = response.stream;
        let mut text = String::new();
        let mut finished = false;

        while let Some(event) = stream.next().await {
            match event.map_err(|e| LlmError::Stream(e.to_string()))? {
                ChatStreamEvent::Chunk(chunk) => text.push_str(&chunk.content),
                ChatStreamEvent::End(_) => {
                    finished = true;
                    break;
                }
                _ => {}
            }
        }

        if !finished {
            warn!("[LLM] Stream closed without an end event");
        }

        debug!(chars = text.len(), "[LLM] Completion received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::State,
        http::{header, HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorded {
        body: Arc<Mutex<Option<Value>>>,
        auth: Arc<Mutex<Option<String>>>,
    }

    /// Serve `router` on an ephemeral port and return the completions URL.
    async fn spawn_provider(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("test provider");
        });
        format!("http://{addr}/openai/v1/chat/completions")
    }

    fn client(api_url: String) -> GroqClient {
        GroqClient::new(LlmConfig {
            api_url,
            api_key: "gsk_test".to_string(),
            model: "llama3-8b-8192".to_string(),
        })
    }

    fn request() -> CompletionRequest {
        CompletionRequest::single_turn("llama3-8b-8192", "You are a helpful assistant.", "Hi")
    }

    const STREAM: &str = concat!(
        "data: {\"id\":\"c1\",\"object\":\"chat.completion.chunk\",\"model\":\"llama3-8b-8192\",",
        "\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"},\"finish_reason\":null}]}\n\n",
        "data: {\"id\":\"c1\",\"object\":\"chat.completion.chunk\",\"model\":\"llama3-8b-8192\",",
        "\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hello\"},\"finish_reason\":null}]}\n\n",
        "data: {\"id\":\"c1\",\"object\":\"chat.completion.chunk\",\"model\":\"llama3-8b-8192\",",
        "\"choices\":[{\"index\":0,\"delta\":{\"content\":\"!\\nHow can I help?\"},\"finish_reason\":null}]}\n\n",
        "data: {\"id\":\"c1\",\"object\":\"chat.completion.chunk\",\"model\":\"llama3-8b-8192\",",
        "\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
        "data: [DONE]\n\n",
    );

    async fn streaming_provider(
        State(recorded): State<Recorded>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> impl IntoResponse {
        *recorded.auth.lock().expect("lock") = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *recorded.body.lock().expect("lock") = Some(body);

        ([(header::CONTENT_TYPE, "text/event-stream")], STREAM)
    }

    #[test]
    fn test_endpoint_base_strips_completions_path() {
        assert_eq!(
            endpoint_base("https://api.groq.com/openai/v1/chat/completions"),
            "https://api.groq.com/openai/v1/"
        );
        assert_eq!(
            endpoint_base("https://api.groq.com/openai/v1/chat/completions/"),
            "https://api.groq.com/openai/v1/"
        );
        assert_eq!(endpoint_base("http://localhost:8080/v1"), "http://localhost:8080/v1/");
    }

    #[test]
    fn test_chat_request_keeps_system_prompt_and_user_message() {
        let chat_req = chat_request(&request());
        assert_eq!(chat_req.system.as_deref(), Some("You are a helpful assistant."));
        assert_eq!(chat_req.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_streamed_completion_is_concatenated() {
        let recorded = Recorded::default();
        let url = spawn_provider(
            Router::new()
                .route("/openai/v1/chat/completions", post(streaming_provider))
                .with_state(recorded.clone()),
        )
        .await;

        let text = client(url).complete(&request()).await.expect("completion");
        assert_eq!(text, "Hello!\nHow can I help?");

        assert_eq!(
            recorded.auth.lock().expect("lock").as_deref(),
            Some("Bearer gsk_test")
        );
        let body = recorded.body.lock().expect("lock").clone().expect("body recorded");
        assert_eq!(body["model"], "llama3-8b-8192");
        assert_eq!(body["stream"], true);
        assert_eq!(body["top_p"], 1.0);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Hi");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let url = spawn_provider(Router::new().route(
            "/openai/v1/chat/completions",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    r#"{"error":{"message":"Invalid API Key"}}"#,
                )
            }),
        ))
        .await;

        let result = client(url).complete(&request()).await;
        assert!(result.is_err(), "401 must fail, got {result:?}");
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_an_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let result = client(format!("http://{addr}/openai/v1/chat/completions"))
            .complete(&request())
            .await;
        assert!(result.is_err(), "connection must fail, got {result:?}");
    }
}
