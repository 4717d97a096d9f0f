//! Chat backend client.
//!
//! The backend is a black box that answers each user message with a reply
//! and, optionally, a sentiment rating. Only the score is consumed here.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::TransportError;
use crate::reminder::SentimentScore;
use crate::storage::BackendConfig;

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_message: String,
}

/// Sentiment block of a chat reply.
///
/// The server sends `{}` when it has no rating, so the score itself is
/// optional too.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sentiment {
    #[serde(default)]
    pub sentiment_score: Option<serde_json::Value>,
}

/// Response of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default = "default_bot_reply")]
    pub bot_reply: String,
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub context: Option<serde_json::Value>,
}

fn default_bot_reply() -> String {
    "How are you feeling now?".into()
}

impl ChatReply {
    /// Score of this reply, if the backend supplied a usable number.
    ///
    /// A missing block, a missing field, a non-numeric value and a
    /// non-finite number all mean "unknown".
    pub fn sentiment_score(&self) -> Option<SentimentScore> {
        let value = self.sentiment.as_ref()?.sentiment_score.as_ref()?;
        let score = match value {
            serde_json::Value::Number(n) => n.as_f64()?,
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        SentimentScore::new(score)
    }
}

#[derive(Debug, Deserialize)]
struct CheckupResponse {
    checkup_message: String,
}

/// Request/response access to the conversational backend.
#[allow(async_fn_in_trait)]
pub trait ChatBackend {
    /// Send one user message and wait for the reply.
    async fn send(&self, user_message: &str) -> Result<ChatReply, TransportError>;

    /// Fetch a standalone check-up prompt.
    async fn checkup(&self) -> Result<String, TransportError>;
}

/// Client for the HTTP chat backend.
pub struct HttpChatBackend {
    base_url: Url,
    http_client: Client,
}

impl HttpChatBackend {
    /// Create a client from backend configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, TransportError> {
        // Url::join replaces the last segment unless the base ends in '/'.
        let mut raw = config.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw).map_err(|e| TransportError::InvalidUrl {
            url: config.base_url.clone(),
            message: e.to_string(),
        })?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| TransportError::Request {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|e| TransportError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                message: e.to_string(),
            })
    }

    async fn read_body(url: &Url, resp: reqwest::Response) -> Result<String, TransportError> {
        let status = resp.status();
        let body = resp.text().await.map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

impl ChatBackend for HttpChatBackend {
    async fn send(&self, user_message: &str) -> Result<ChatReply, TransportError> {
        let url = self.endpoint("chat")?;
        let request = ChatRequest {
            user_message: user_message.to_string(),
        };

        let resp = self
            .http_client
            .post(url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;

        let body = Self::read_body(&url, resp).await?;
        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn checkup(&self) -> Result<String, TransportError> {
        let url = self.endpoint("checkup")?;
        let resp = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;

        let body = Self::read_body(&url, resp).await?;
        let parsed: CheckupResponse =
            serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(parsed.checkup_message)
    }
}
