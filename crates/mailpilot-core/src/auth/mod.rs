pub mod google;
pub mod repository;
pub mod service;

pub use google::{ExchangedTokens, GoogleOAuth, GoogleOAuthError, UserInfo};
pub use repository::{AuthRepository, Session, StoredCredentials, User};
pub use service::{CredentialSource, SessionService, UserProfile};

use thiserror::Error;

use crate::db::DbError;

/// Access/refresh token pair for the mailbox provider. Resolved fresh per
/// request; never persisted by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("session expired")]
    SessionExpired,
    #[error("authorization revoked")]
    AuthorizationRevoked,
    #[error("database error: {0}")]
    Database(#[from] DbError),
    #[error("sql error: {0}")]
    Sql(#[from] libsql::Error),
    #[error("datetime parse error: {0}")]
    DateTimeParse(#[from] chrono::ParseError),
    #[error("oauth error: {0}")]
    OAuth(#[from] GoogleOAuthError),
}
