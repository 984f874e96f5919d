//! Client side of `POST /api/chat`.

use async_trait::async_trait;

use crate::io_struct::{ChatReply, ChatRequest, ErrorBody};

/// What the relay answered, when it answered at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Reply(String),
    Rejected { status: u16, error: String },
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request to relay failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("relay unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<RelayOutcome, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpChatClient {
    client: reqwest::Client,
    chat_url: String,
}

impl HttpChatClient {
    pub fn new(server_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            chat_url: format!("{}/api/chat", server_url.trim_end_matches('/')),
        })
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn send(&self, request: &ChatRequest) -> Result<RelayOutcome, TransportError> {
        let resp = self.client.post(&self.chat_url).json(request).send().await?;
        let status = resp.status();
        // An unreadable body counts as a transport failure, same as no response.
        if status.is_success() {
            let reply: ChatReply = resp.json().await?;
            Ok(RelayOutcome::Reply(reply.response))
        } else {
            let body: ErrorBody = resp.json().await?;
            Ok(RelayOutcome::Rejected {
                status: status.as_u16(),
                error: body.error,
            })
        }
    }
}
