pub mod client;
pub mod outbound;
pub mod parser;
pub mod types;

pub use client::MailboxClient;
pub use outbound::{MimeBuildError, OutgoingMail, encode_raw};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::CredentialPair;

/// One listed message, flattened for the chat layer and the REST surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailSummary {
    pub id: String,
    pub subject: String,
    pub from: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailPage {
    pub emails: Vec<EmailSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("message not found")]
    NotFound,
    #[error("provider error {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("mime build error: {0}")]
    Mime(#[from] MimeBuildError),
}

/// The three remote operations the dispatcher needs. Every call takes a freshly
/// resolved credential pair; the gateway holds no per-user state and never
/// retries.
#[async_trait]
pub trait MailboxGateway: Send + Sync {
    async fn list(
        &self,
        creds: &CredentialPair,
        limit: u32,
        page_token: Option<&str>,
    ) -> Result<EmailPage, GatewayError>;

    async fn trash(&self, creds: &CredentialPair, message_id: &str) -> Result<(), GatewayError>;

    async fn send(
        &self,
        creds: &CredentialPair,
        outgoing: &OutgoingMail,
    ) -> Result<(), GatewayError>;
}
