use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::google::GoogleOAuth;
use super::repository::AuthRepository;
use super::{AuthError, CredentialPair};
use crate::db::Database;

/// Sessions live for a week; the mailbox provider's access tokens for an hour.
pub const SESSION_TTL_DAYS: i64 = 7;
pub const CREDENTIAL_TTL_SECONDS: i64 = 3600;

/// Seam between the dispatcher and session storage: turns an opaque session id
/// into a live credential pair or a typed auth failure.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn resolve(&self, session_id: &str) -> Result<CredentialPair, AuthError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
}

#[derive(Clone)]
pub struct SessionService {
    repo: AuthRepository,
}

impl SessionService {
    pub fn new(db: Database) -> Self {
        Self {
            repo: AuthRepository::new(db),
        }
    }

    /// Full login flow: exchange the authorization code, look up the Google
    /// profile, persist user + credentials, and mint a fresh session.
    pub async fn login_with_code(
        &self,
        oauth: &GoogleOAuth,
        code: &str,
    ) -> Result<String, AuthError> {
        let tokens = oauth.exchange_code(code).await?;
        let info = oauth.fetch_userinfo(&tokens.access_token).await?;

        let email = info.email.unwrap_or_default();
        let name = info.name.unwrap_or_else(|| "Google User".to_string());
        let user = self.repo.upsert_user(&info.id, &email, &name).await?;

        let ttl = if tokens.expires_in > 0 {
            tokens.expires_in
        } else {
            CREDENTIAL_TTL_SECONDS
        };
        let expires_at = Utc::now() + Duration::seconds(ttl);
        let refresh_token = tokens.refresh_token.unwrap_or_default();
        self.repo
            .save_credentials(&user.id, &tokens.access_token, &refresh_token, expires_at)
            .await?;

        let session = self
            .repo
            .create_session(&user.id, Duration::days(SESSION_TTL_DAYS))
            .await?;
        Ok(session.id)
    }

    /// Session-validated profile lookup for `/auth/me`.
    pub async fn current_user(&self, session_id: &str) -> Result<UserProfile, AuthError> {
        let session = self
            .repo
            .get_session(session_id)
            .await?
            .filter(|s| !s.is_expired(Utc::now()))
            .ok_or(AuthError::SessionExpired)?;

        let user = self
            .repo
            .get_user(&session.user_id)
            .await?
            .ok_or(AuthError::SessionExpired)?;

        Ok(UserProfile {
            name: user.name,
            email: user.email,
        })
    }
}

#[async_trait]
impl CredentialSource for SessionService {
    async fn resolve(&self, session_id: &str) -> Result<CredentialPair, AuthError> {
        let session = self
            .repo
            .get_session(session_id)
            .await?
            .filter(|s| !s.is_expired(Utc::now()))
            .ok_or(AuthError::SessionExpired)?;

        let creds = self
            .repo
            .get_credentials(&session.user_id)
            .await?
            .ok_or(AuthError::AuthorizationRevoked)?;

        Ok(CredentialPair {
            access_token: creds.access_token,
            refresh_token: creds.refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoogleConfig;
    use crate::migrations::run_migrations;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn test_db() -> (TempDir, Database) {
        let dir = TempDir::new().expect("temp dir");
        let db = Database::open(&dir.path().join("db.sqlite"))
            .await
            .expect("create db");
        run_migrations(&db).await.expect("migrations");
        (dir, db)
    }

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
    async fn unknown_session_resolves_to_session_expired() {
        let (_dir, db) = test_db().await;
        let service = SessionService::new(db);

        let err = service.resolve("missing").await.expect_err("should fail");
        assert!(matches!(err, AuthError::SessionExpired));
    }

    #[tokio::test]
    async fn expired_session_resolves_to_session_expired() {
        let (_dir, db) = test_db().await;
        let repo = AuthRepository::new(db.clone());
        let user = repo
            .upsert_user("g-1", "a@example.com", "A")
            .await
            .expect("user");
        let session = repo
            .create_session(&user.id, Duration::seconds(-1))
            .await
            .expect("session");
        repo.save_credentials(&user.id, "access", "refresh", Utc::now())
            .await
            .expect("credentials");

        let service = SessionService::new(db);
        let err = service
            .resolve(&session.id)
            .await
            .expect_err("should fail");
        assert!(matches!(err, AuthError::SessionExpired));
    }

    #[tokio::test]
    async fn live_session_without_credentials_is_revoked() {
        let (_dir, db) = test_db().await;
        let repo = AuthRepository::new(db.clone());
        let user = repo
            .upsert_user("g-1", "a@example.com", "A")
            .await
            .expect("user");
        let session = repo
            .create_session(&user.id, Duration::days(7))
            .await
            .expect("session");

        let service = SessionService::new(db);
        let err = service
            .resolve(&session.id)
            .await
            .expect_err("should fail");
        assert!(matches!(err, AuthError::AuthorizationRevoked));
    }

    #[tokio::test]
    async fn live_session_resolves_credential_pair() {
        let (_dir, db) = test_db().await;
        let repo = AuthRepository::new(db.clone());
        let user = repo
            .upsert_user("g-1", "a@example.com", "A")
            .await
            .expect("user");
        let session = repo
            .create_session(&user.id, Duration::days(7))
            .await
            .expect("session");
        repo.save_credentials(&user.id, "access-x", "refresh-x", Utc::now())
            .await
            .expect("credentials");

        let service = SessionService::new(db);
        let creds = service.resolve(&session.id).await.expect("resolves");
        assert_eq!(
            creds,
            CredentialPair {
                access_token: "access-x".into(),
                refresh_token: "refresh-x".into(),
            }
        );
    }

    #[tokio::test]
    async fn login_with_code_persists_everything_and_session_resolves() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "google-1",
                "email": "alice@example.com",
                "name": "Alice",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, db) = test_db().await;
        let service = SessionService::new(db);
        let oauth = test_oauth(&server);

        let session_id = service
            .login_with_code(&oauth, "auth-code")
            .await
            .expect("login succeeds");

        let creds = service.resolve(&session_id).await.expect("resolves");
        assert_eq!(creds.access_token, "access-1");
        assert_eq!(creds.refresh_token, "refresh-1");

        let profile = service
            .current_user(&session_id)
            .await
            .expect("profile loads");
        assert_eq!(profile.name, "Alice");
        assert_eq!(profile.email, "alice@example.com");
    }

    #[tokio::test]
    async fn login_defaults_missing_profile_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-1",
                "expires_in": 3600,
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": "google-2" })),
            )
            .mount(&server)
            .await;

        let (_dir, db) = test_db().await;
        let service = SessionService::new(db);
        let oauth = test_oauth(&server);

        let session_id = service
            .login_with_code(&oauth, "auth-code")
            .await
            .expect("login succeeds");

        let profile = service
            .current_user(&session_id)
            .await
            .expect("profile loads");
        assert_eq!(profile.name, "Google User");
        assert_eq!(profile.email, "");
    }
}
