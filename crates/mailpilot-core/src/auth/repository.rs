use chrono::{DateTime, Duration, SecondsFormat, Utc};
use libsql::{Row, params};
use uuid::Uuid;

use super::AuthError;
use crate::db::Database;

const USER_COLUMNS: &str = "id, google_id, email, name, created_at, updated_at";
const SESSION_COLUMNS: &str = "id, user_id, created_at, expires_at";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub google_id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuthRepository {
    db: Database,
}

impl AuthRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns the existing user for this Google id, creating one on first login.
    pub async fn upsert_user(
        &self,
        google_id: &str,
        email: &str,
        name: &str,
    ) -> Result<User, AuthError> {
        let conn = self.db.connection().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE google_id = ?1"),
                params![google_id],
            )
            .await?;
        if let Some(row) = rows.next().await? {
            return row_to_user(row);
        }

        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let mut rows = conn
            .query(
                &format!(
                    "INSERT INTO users (id, google_id, email, name, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                     RETURNING {USER_COLUMNS}"
                ),
                params![id, google_id, email, name, now],
            )
            .await?;
        let row = rows.next().await?.ok_or(AuthError::AuthorizationRevoked)?;
        row_to_user(row)
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AuthError> {
        let conn = self.db.connection().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_user(row)?)),
            None => Ok(None),
        }
    }

    /// Replaces the user's credential record wholesale; one row per user.
    pub async fn save_credentials(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let conn = self.db.connection().await?;
        let now = now_rfc3339();
        conn.execute(
            "INSERT INTO oauth_credentials (user_id, access_token, refresh_token, expires_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET
                 access_token = excluded.access_token,
                 refresh_token = excluded.refresh_token,
                 expires_at = excluded.expires_at,
                 updated_at = excluded.updated_at",
            params![
                user_id,
                access_token,
                refresh_token,
                to_rfc3339(expires_at),
                now
            ],
        )
        .await?;
        Ok(())
    }

    pub async fn get_credentials(
        &self,
        user_id: &str,
    ) -> Result<Option<StoredCredentials>, AuthError> {
        let conn = self.db.connection().await?;
        let mut rows = conn
            .query(
                "SELECT user_id, access_token, refresh_token, expires_at
                 FROM oauth_credentials WHERE user_id = ?1",
                params![user_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => {
                let expires_at: String = row.get(3)?;
                Ok(Some(StoredCredentials {
                    user_id: row.get(0)?,
                    access_token: row.get(1)?,
                    refresh_token: row.get(2)?,
                    expires_at: parse_datetime(&expires_at)?,
                }))
            }
            None => Ok(None),
        }
    }

    pub async fn delete_credentials(&self, user_id: &str) -> Result<(), AuthError> {
        let conn = self.db.connection().await?;
        conn.execute(
            "DELETE FROM oauth_credentials WHERE user_id = ?1",
            params![user_id],
        )
        .await?;
        Ok(())
    }

    pub async fn create_session(&self, user_id: &str, ttl: Duration) -> Result<Session, AuthError> {
        let id = Uuid::new_v4().to_string();
        // Truncated to storage precision so the returned value round-trips.
        let created_at = truncate_to_millis(Utc::now());
        let expires_at = truncate_to_millis(created_at + ttl);

        let conn = self.db.connection().await?;
        conn.execute(
            "INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                id.clone(),
                user_id,
                to_rfc3339(created_at),
                to_rfc3339(expires_at)
            ],
        )
        .await?;

        Ok(Session {
            id,
            user_id: user_id.to_string(),
            created_at,
            expires_at,
        })
    }

    pub async fn get_session(&self, id: &str) -> Result<Option<Session>, AuthError> {
        let conn = self.db.connection().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                params![id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => {
                let created_at: String = row.get(2)?;
                let expires_at: String = row.get(3)?;
                Ok(Some(Session {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    created_at: parse_datetime(&created_at)?,
                    expires_at: parse_datetime(&expires_at)?,
                }))
            }
            None => Ok(None),
        }
    }
}

fn row_to_user(row: Row) -> Result<User, AuthError> {
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;
    Ok(User {
        id: row.get(0)?,
        google_id: row.get(1)?,
        email: row.get(2)?,
        name: row.get(3)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>, AuthError> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

fn now_rfc3339() -> String {
    to_rfc3339(Utc::now())
}

fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn truncate_to_millis(value: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or(value)
}
