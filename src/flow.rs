use crate::config::FlowSettings;
use crate::error::FlowError;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Per-component configuration overrides, forwarded to the flow untouched.
pub type Tweaks = serde_json::Map<String, Value>;

/// Answer used when the response is JSON but carries no message text.
pub const NO_VALID_OUTPUTS: &str = "No valid outputs received";

/// Body of a run request
#[derive(Debug, Clone, Serialize)]
pub struct FlowRequest<'a> {
    pub input_value: &'a str,
    pub output_type: &'static str,
    pub input_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tweaks: Option<&'a Tweaks>,
}

impl<'a> FlowRequest<'a> {
    pub fn chat(message: &'a str, tweaks: Option<&'a Tweaks>) -> Self {
        Self {
            input_value: message,
            output_type: "chat",
            input_type: "chat",
            tweaks,
        }
    }
}

/// What a successful round trip produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowReply {
    /// `outputs[0].outputs[0].results.message.text`
    Text(String),
    /// Valid JSON without the message path.
    NoValidOutputs,
}

impl FlowReply {
    pub fn from_body(body: &Value) -> Self {
        match extract_message_text(body) {
            Some(text) => FlowReply::Text(text.to_string()),
            None => FlowReply::NoValidOutputs,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, FlowReply::NoValidOutputs)
    }

    pub fn as_text(&self) -> &str {
        match self {
            FlowReply::Text(text) => text,
            FlowReply::NoValidOutputs => NO_VALID_OUTPUTS,
        }
    }

    pub fn into_answer(self) -> String {
        match self {
            FlowReply::Text(text) => text,
            FlowReply::NoValidOutputs => NO_VALID_OUTPUTS.to_string(),
        }
    }
}

/// Walk `outputs[0].outputs[0].results.message.text`.
pub fn extract_message_text(body: &Value) -> Option<&str> {
    body.get("outputs")?
        .get(0)?
        .get("outputs")?
        .get(0)?
        .get("results")?
        .get("message")?
        .get("text")?
        .as_str()
}

/// Join the run endpoint for a flow.
pub fn run_url(base_url: &str, langflow_id: &str, endpoint: &str) -> String {
    format!(
        "{}/lf/{}/api/v1/run/{}",
        base_url.trim_end_matches('/'),
        langflow_id,
        endpoint
    )
}

/// Client for one hosted flow endpoint
#[derive(Clone)]
pub struct FlowClient {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl std::fmt::Debug for FlowClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowClient")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl FlowClient {
    /// Build a client. `timeout` of `None` keeps reqwest's default.
    pub fn new(settings: &FlowSettings, timeout: Option<Duration>) -> Result<Self, FlowError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            url: run_url(&settings.base_url, &settings.langflow_id, &settings.endpoint),
            token: settings.token.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one message to the flow and normalize the answer.
    pub async fn run(&self, message: &str, tweaks: Option<&Tweaks>) -> Result<FlowReply, FlowError> {
        let payload = FlowRequest::chat(message, tweaks);
        tracing::debug!(url = %self.url, tweaks = tweaks.is_some(), "sending flow request");

        let started = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        tracing::info!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "flow responded"
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FlowError::Status { status, body });
        }

        let body = response.text().await?;
        let json: Value = serde_json::from_str(&body)?;
        let reply = FlowReply::from_body(&json);
        if reply.is_degraded() {
            tracing::warn!("flow response has no message text; using fallback answer");
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_nested_message_text() {
        let body = json!({
            "session_id": "abc",
            "outputs": [{
                "inputs": {"input_value": "hi"},
                "outputs": [{
                    "results": {"message": {"text": "Post more reels.", "sender": "Machine"}}
                }]
            }]
        });
        assert_eq!(extract_message_text(&body), Some("Post more reels."));
        assert_eq!(FlowReply::from_body(&body), FlowReply::Text("Post more reels.".into()));
    }

    #[test]
    fn empty_outputs_degrade_to_fallback() {
        let reply = FlowReply::from_body(&json!({"outputs": []}));
        assert!(reply.is_degraded());
        assert_eq!(reply.into_answer(), "No valid outputs received");
    }

    #[test]
    fn missing_outputs_key_degrades_to_fallback() {
        let reply = FlowReply::from_body(&json!({"detail": "flow finished"}));
        assert_eq!(reply, FlowReply::NoValidOutputs);
        assert_eq!(reply.as_text(), NO_VALID_OUTPUTS);
    }

    #[test]
    fn partial_paths_degrade_to_fallback() {
        for body in [
            json!({"outputs": [{}]}),
            json!({"outputs": [{"outputs": []}]}),
            json!({"outputs": [{"outputs": [{"results": {}}]}]}),
            json!({"outputs": [{"outputs": [{"results": {"message": {}}}]}]}),
            json!({"outputs": [{"outputs": [{"results": {"message": {"text": 42}}}]}]}),
            json!({"outputs": "nope"}),
            json!([1, 2, 3]),
        ] {
            assert_eq!(FlowReply::from_body(&body), FlowReply::NoValidOutputs, "{body}");
        }
    }

    #[test]
    fn request_omits_tweaks_when_absent() {
        let value = serde_json::to_value(FlowRequest::chat("hello", None)).unwrap();
        assert_eq!(
            value,
            json!({"input_value": "hello", "output_type": "chat", "input_type": "chat"})
        );
        assert!(value.get("tweaks").is_none());
    }

    #[test]
    fn request_carries_tweaks_verbatim() {
        let tweaks = json!({
            "ChatInput-x1": {"should_store_message": false},
            "Prompt-9": {"template": "{question}", "nested": [1, {"a": null}]}
        });
        let tweaks = tweaks.as_object().unwrap().clone();
        let value = serde_json::to_value(FlowRequest::chat("hello", Some(&tweaks))).unwrap();
        assert_eq!(value["tweaks"], Value::Object(tweaks));
    }

    #[test]
    fn run_url_joins_segments() {
        assert_eq!(
            run_url("https://api.langflow.astra.datastax.com", "lf-123", "socialmedia"),
            "https://api.langflow.astra.datastax.com/lf/lf-123/api/v1/run/socialmedia"
        );
        assert_eq!(
            run_url("http://127.0.0.1:7860/", "id", "flow"),
            "http://127.0.0.1:7860/lf/id/api/v1/run/flow"
        );
    }
}
