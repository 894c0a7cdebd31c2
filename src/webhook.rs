use serde_json::Value;

/// No timeout is set on the client.
pub struct WebhookClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug)]
pub enum WebhookError {
    Transport(String),
    Status(u16),
}

impl WebhookError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WebhookError::Transport(_) => "Network error. Please check your connection.",
            WebhookError::Status(_) => "Failed to submit form. Please try again.",
        }
    }
}

impl std::fmt::Display for WebhookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebhookError::Transport(msg) => write!(f, "Webhook request failed: {msg}"),
            WebhookError::Status(code) => write!(f, "Webhook returned status {code}"),
        }
    }
}

impl std::error::Error for WebhookError {}

impl WebhookClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn post(&self, body: &Value) -> Result<(), WebhookError> {
        let resp = self
            .client
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| WebhookError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(WebhookError::Status(status.as_u16()))
        }
    }
}
