//! `POST /assistant`: relay a chat message to the completion provider.

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
    routing::post,
};
use serde::Deserialize;
use serde_json::json;
use services::services::assistant::{ConversationTurn, GatewayError, SystemDataSnapshot};
use tracing::warn;
use ts_rs::TS;

use crate::AppState;

#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AssistantRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub system_data: Option<SystemDataSnapshot>,
    #[serde(default)]
    pub conversation_history: Option<Vec<ConversationTurn>>,
}

pub async fn relay_message(
    State(state): State<AppState>,
    payload: Result<axum::Json<AssistantRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(axum::Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected assistant request body");
            return (
                StatusCode::BAD_REQUEST,
                ResponseJson(json!({
                    "error": "Invalid request body",
                    "message": rejection.body_text(),
                })),
            )
                .into_response();
        }
    };

    let message = request.message.unwrap_or_default();
    let context = request.system_data.unwrap_or_default();
    let history = request.conversation_history.unwrap_or_default();

    match state.assistant().relay(&message, &context, &history).await {
        Ok(reply) => (StatusCode::OK, ResponseJson(reply)).into_response(),
        Err(GatewayError::InvalidRequest(error)) => {
            (StatusCode::BAD_REQUEST, ResponseJson(json!({ "error": error }))).into_response()
        }
        Err(GatewayError::UpstreamFailure(message)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ResponseJson(json!({
                "error": "Failed to get assistant reply",
                "message": message,
            })),
        )
            .into_response(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/assistant", post(relay_message))
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use db::collection::memory::InMemoryCollectionClient;
    use serde_json::{Value, json};
    use services::services::{
        assistant::AssistantGateway,
        claude_api::{
            ClaudeApiError, ClaudeResponse, CompletionProvider, ContentBlock, Message, Usage,
        },
    };

    use crate::routes::test_support::{app, send};

    struct ScriptedProvider {
        fail: bool,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(
            &self,
            messages: Vec<Message>,
            _system: Option<String>,
            _max_tokens: u32,
        ) -> Result<ClaudeResponse, ClaudeApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ClaudeApiError::InvalidApiKey);
            }
            Ok(ClaudeResponse {
                id: "msg_1".to_string(),
                content: vec![ContentBlock::Text {
                    text: format!("{} message(s) received", messages.len()),
                }],
                model: "scripted".to_string(),
                stop_reason: Some("end_turn".to_string()),
                usage: Usage {
                    input_tokens: 5,
                    output_tokens: 4,
                },
            })
        }
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::post("/assistant")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn gateway(provider: &Arc<ScriptedProvider>) -> AssistantGateway {
        let provider: Arc<dyn CompletionProvider> = provider.clone();
        AssistantGateway::new(provider)
    }

    #[tokio::test]
    async fn test_reply_is_returned() {
        let provider = ScriptedProvider::new(false);
        let app = app(Arc::new(InMemoryCollectionClient::new()), gateway(&provider));

        let (status, body) = send(
            app,
            post_json(json!({
                "message": "How much cash do I have?",
                "systemData": { "accounts": [] },
                "conversationHistory": [
                    { "role": "user", "text": "hi" },
                    { "role": "assistant", "text": "hello" }
                ]
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "3 message(s) received");
        assert_eq!(body["model"], "scripted");
        assert_eq!(body["usage"]["output_tokens"], 4);
    }

    #[tokio::test]
    async fn test_missing_message_is_400_without_upstream_call() {
        let provider = ScriptedProvider::new(false);
        let app = app(Arc::new(InMemoryCollectionClient::new()), gateway(&provider));

        let (status, body) = send(app, post_json(json!({ "systemData": {} }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Message is required" }));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let provider = ScriptedProvider::new(false);
        let app = app(Arc::new(InMemoryCollectionClient::new()), gateway(&provider));

        let request = Request::post("/assistant")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn test_non_post_is_405() {
        let provider = ScriptedProvider::new(false);
        let app = app(Arc::new(InMemoryCollectionClient::new()), gateway(&provider));

        let request = Request::get("/assistant").body(Body::empty()).unwrap();
        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_500() {
        let provider = ScriptedProvider::new(true);
        let app = app(Arc::new(InMemoryCollectionClient::new()), gateway(&provider));

        let (status, body) = send(app, post_json(json!({ "message": "hello" }))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to get assistant reply");
        assert_eq!(body["message"], "invalid api key");
        assert!(body.get("reply").is_none());
    }
}
