use serde::Deserialize;
use thiserror::Error;

use crate::config::GoogleConfig;

pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v1/userinfo";

#[derive(Debug, Error)]
pub enum GoogleOAuthError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("token response decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("token endpoint error {status}: {body}")]
    TokenEndpoint { status: u16, body: String },
    #[error("invalid userinfo response: {0}")]
    InvalidUserinfo(String),
}

/// Tokens returned by the authorization-code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangedTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: i64,
    #[allow(dead_code)]
    token_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    id: Option<String>,
    email: Option<String>,
    name: Option<String>,
}

pub struct GoogleOAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_endpoint: String,
    userinfo_endpoint: String,
}

impl GoogleOAuth {
    pub fn new(http: reqwest::Client, config: &GoogleConfig) -> Self {
        Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
            userinfo_endpoint: USERINFO_ENDPOINT.to_string(),
        }
    }

    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    pub fn with_userinfo_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.userinfo_endpoint = endpoint.into();
        self
    }

    /// Exchange an authorization code for provider tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<ExchangedTokens, GoogleOAuthError> {
        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code", code),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GoogleOAuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let payload: TokenResponse = serde_json::from_str(&body)?;

        Ok(ExchangedTokens {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
            expires_in: payload.expires_in,
        })
    }

    /// Fetch the authenticated user's profile. A response without an `id`
    /// field means the token was not accepted for this purpose.
    pub async fn fetch_userinfo(&self, access_token: &str) -> Result<UserInfo, GoogleOAuthError> {
        let response = self
            .http
            .get(&self.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await?;

        let body = response.text().await?;
        let payload: UserInfoResponse = serde_json::from_str(&body)?;

        match payload.id {
            Some(id) => Ok(UserInfo {
                id,
                email: payload.email,
                name: payload.name,
            }),
            None => Err(GoogleOAuthError::InvalidUserinfo(body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_oauth(server: &MockServer) -> GoogleOAuth {
        let config = GoogleConfig {
            client_id: "client".into(),
            client_secret: "secret".into(),
            redirect_uri: "http://localhost/cb".into(),
        };
        GoogleOAuth::new(reqwest::Client::new(), &config)
            .with_token_endpoint(format!("{}/token", server.uri()))
            .with_userinfo_endpoint(format!("{}/userinfo", server.uri()))
    }

    #[tokio::test]
    async fn exchange_code_posts_form_and_parses_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "expires_in": 3600,
                "token_type": "Bearer",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = test_oauth(&server)
            .exchange_code("auth-code-1")
            .await
            .expect("exchange succeeds");

        assert_eq!(tokens.access_token, "access-1");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(tokens.expires_in, 3600);
    }

    #[tokio::test]
    async fn exchange_code_surfaces_error_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_oauth(&server)
            .exchange_code("bad-code")
            .await
            .expect_err("exchange fails");

        match err {
            GoogleOAuthError::TokenEndpoint { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("invalid_grant"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_userinfo_requires_id_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": "invalid_token",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_oauth(&server)
            .fetch_userinfo("token-1")
            .await
            .expect_err("userinfo without id fails");

        assert!(matches!(err, GoogleOAuthError::InvalidUserinfo(_)));
    }

    #[tokio::test]
    async fn fetch_userinfo_parses_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "google-123",
                "email": "alice@example.com",
                "name": "Alice",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let info = test_oauth(&server)
            .fetch_userinfo("token-1")
            .await
            .expect("userinfo loads");

        assert_eq!(info.id, "google-123");
        assert_eq!(info.email.as_deref(), Some("alice@example.com"));
        assert_eq!(info.name.as_deref(), Some("Alice"));
    }
}
