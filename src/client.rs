use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use anyhow::Result;

use crate::relay::RelayKind;

/// Shown when the relay answered with an envelope carrying none of the
/// known fields.
pub const NO_REPLY_TEXT: &str = "No response from Gemini.";

/// Reply envelope from the relay. A well-formed success carries exactly one
/// of `response`/`hint`; error envelopes carry `error` (and sometimes
/// `details`, which the view does not surface).
#[derive(Deserialize)]
struct ReplyEnvelope {
    response: Option<String>,
    hint: Option<String>,
    error: Option<String>,
}

#[derive(Clone)]
pub struct RelayClient {
    client: Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Send one message through the relay. Any decodable envelope becomes
    /// displayable text, relay errors included; only transport-level
    /// failures surface as `Err`.
    pub async fn send(&self, mode: RelayKind, text: &str) -> Result<String> {
        let (path, body) = match mode {
            RelayKind::Direct => ("/api/chat", json!({ "query": text })),
            RelayKind::Hint => ("/api/hint", json!({ "question": text })),
        };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await?;

        let envelope: ReplyEnvelope = response.json().await?;
        Ok(envelope
            .response
            .or(envelope.hint)
            .or(envelope.error)
            .unwrap_or_else(|| NO_REPLY_TEXT.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(value: serde_json::Value) -> String {
        let envelope: ReplyEnvelope = serde_json::from_value(value).unwrap();
        envelope
            .response
            .or(envelope.hint)
            .or(envelope.error)
            .unwrap_or_else(|| NO_REPLY_TEXT.to_string())
    }

    #[test]
    fn success_fields_win_over_error() {
        assert_eq!(decode(json!({"response": "Paris"})), "Paris");
        assert_eq!(decode(json!({"hint": "Think rivers."})), "Think rivers.");
    }

    #[test]
    fn error_envelope_becomes_displayable_text() {
        assert_eq!(
            decode(json!({"error": "Missing Gemini API key", "details": "x"})),
            "Missing Gemini API key"
        );
    }

    #[test]
    fn empty_envelope_falls_back_to_fixed_text() {
        assert_eq!(decode(json!({})), NO_REPLY_TEXT);
    }
}
