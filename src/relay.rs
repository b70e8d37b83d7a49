use std::net::SocketAddr;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::gemini::GeminiClient;

/// Instruction wrapped around the question on the hint route. The model is
/// told to guide, never to answer.
pub const HINT_PROMPT_TEMPLATE: &str = "You are a helpful assistant. When given a question, you must never provide the direct answer. Instead, give only hints, clues, or guiding questions that help the user figure out the answer themselves. Do not reveal the answer directly.";

/// Which relay variant is serving a request. The variants share all
/// request/response plumbing and differ only in prompt construction and
/// their fixed strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayKind {
    Direct,
    Hint,
}

impl RelayKind {
    pub fn build_prompt(self, text: &str) -> String {
        match self {
            RelayKind::Direct => text.to_string(),
            RelayKind::Hint => format!("{}\n\nQuestion: {}", HINT_PROMPT_TEMPLATE, text),
        }
    }

    fn missing_input_message(self) -> &'static str {
        match self {
            RelayKind::Direct => "Query is required",
            RelayKind::Hint => "No question provided.",
        }
    }

    fn upstream_error_message(self) -> &'static str {
        match self {
            RelayKind::Direct => "Failed to generate AI response",
            RelayKind::Hint => "Failed to get response from Gemini API.",
        }
    }

    fn fallback_text(self) -> &'static str {
        match self {
            RelayKind::Direct => "Sorry, I couldn't generate a response.",
            RelayKind::Hint => "(No hint received)",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            RelayKind::Direct => "chat",
            RelayKind::Hint => "hint",
        }
    }
}

/// Error envelope returned to the client: `{"error": ..., "details"?: ...}`.
pub struct RelayError {
    status: StatusCode,
    error: String,
    details: Option<String>,
}

impl RelayError {
    fn missing_input(kind: RelayKind) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: kind.missing_input_message().to_string(),
            details: None,
        }
    }

    fn missing_key() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "Missing Gemini API key".to_string(),
            details: None,
        }
    }

    fn upstream(kind: RelayKind, err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: kind.upstream_error_message().to_string(),
            details: Some(err.to_string()),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let mut body = json!({ "error": self.error });
        if let Some(details) = self.details {
            body["details"] = json!(details);
        }
        (self.status, Json(body)).into_response()
    }
}

#[derive(Clone)]
pub struct RelayState {
    gemini: Option<GeminiClient>,
}

impl RelayState {
    pub fn new(gemini: Option<GeminiClient>) -> Self {
        Self { gemini }
    }

    /// Build the state from configuration. A missing API key still yields
    /// a serving relay; each request then fails with the configuration
    /// error.
    pub fn from_config(config: &Config) -> Self {
        let gemini = config
            .resolve_api_key()
            .map(|key| GeminiClient::new(&key, &config.resolve_model()));
        Self::new(gemini)
    }
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub query: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Deserialize)]
pub struct HintRequest {
    pub question: Option<String>,
}

#[derive(Serialize)]
pub struct HintResponse {
    pub hint: String,
}

async fn chat_handler(
    State(state): State<RelayState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, RelayError> {
    let response = relay(&state, RelayKind::Direct, req.query).await?;
    Ok(Json(ChatResponse { response }))
}

async fn hint_handler(
    State(state): State<RelayState>,
    Json(req): Json<HintRequest>,
) -> Result<Json<HintResponse>, RelayError> {
    let hint = relay(&state, RelayKind::Hint, req.question).await?;
    Ok(Json(HintResponse { hint }))
}

/// The shared relay path: validate the input, require an upstream client,
/// make the single outbound call, and substitute the variant's fallback
/// when the reply carries no text. Every failure becomes a `RelayError`;
/// nothing unwinds past the handler.
async fn relay(
    state: &RelayState,
    kind: RelayKind,
    text: Option<String>,
) -> Result<String, RelayError> {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return Err(RelayError::missing_input(kind));
    };

    let Some(gemini) = &state.gemini else {
        return Err(RelayError::missing_key());
    };

    let prompt = kind.build_prompt(&text);
    match gemini.generate(&prompt).await {
        Ok(Some(reply)) => {
            info!(kind = kind.as_str(), reply_bytes = reply.len(), "relay ok");
            Ok(reply)
        }
        Ok(None) => {
            info!(kind = kind.as_str(), "relay ok (no text, using fallback)");
            Ok(kind.fallback_text().to_string())
        }
        Err(err) => {
            error!(kind = kind.as_str(), "upstream call failed: {err}");
            Err(RelayError::upstream(kind, err))
        }
    }
}

pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/hint", post(hint_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the relay on `addr` until the process exits.
pub async fn run(addr: SocketAddr, state: RelayState) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("relay listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Bind an ephemeral localhost port, serve the relay in the background, and
/// return the base URL a view-side client should talk to.
pub async fn spawn_local(state: RelayState) -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router(state)).await {
            error!("local relay exited: {err}");
        }
    });
    Ok(format!("http://{}", addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_prompt_is_the_query_itself() {
        let prompt = RelayKind::Direct.build_prompt("What is the capital of France?");
        assert_eq!(prompt, "What is the capital of France?");
    }

    #[test]
    fn hint_prompt_wraps_the_question_in_the_template() {
        let prompt = RelayKind::Hint.build_prompt("What is the capital of France?");
        assert!(prompt.starts_with(HINT_PROMPT_TEMPLATE));
        assert!(prompt.ends_with("Question: What is the capital of France?"));
    }

    #[test]
    fn variants_keep_their_fixed_strings() {
        assert_eq!(RelayKind::Direct.missing_input_message(), "Query is required");
        assert_eq!(RelayKind::Hint.missing_input_message(), "No question provided.");
        assert_eq!(
            RelayKind::Direct.fallback_text(),
            "Sorry, I couldn't generate a response."
        );
        assert_eq!(RelayKind::Hint.fallback_text(), "(No hint received)");
    }
}
