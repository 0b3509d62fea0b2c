use std::{env, path::Path, sync::Arc};

use libsql::{Builder, Connection};
use thiserror::Error;

const AUTH_TOKEN_VAR: &str = "LIBSQL_AUTH_TOKEN";

/// Shared handle to the backing libsql database. Cloning is cheap and every
/// clone talks to the same store.
#[derive(Clone)]
pub struct Database {
    inner: Arc<libsql::Database>,
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("failed to open database: {0}")]
    Open(#[source] libsql::Error),
    #[error("failed to open connection: {0}")]
    Connection(#[source] libsql::Error),
    #[error("query failed: {0}")]
    Query(#[source] libsql::Error),
    #[error("remote database requires {AUTH_TOKEN_VAR}")]
    MissingAuthToken,
}

/// Where the configured database path points. URL schemes mean a hosted
/// libsql instance; anything else is treated as a local file.
enum Location {
    Local(String),
    Remote(String),
}

impl Location {
    fn classify(path: &Path) -> Self {
        let raw = path.to_string_lossy().into_owned();
        let is_remote = ["libsql://", "http://", "https://"]
            .iter()
            .any(|scheme| raw.starts_with(scheme));
        if is_remote {
            Self::Remote(raw)
        } else {
            Self::Local(raw)
        }
    }
}

impl Database {
    pub async fn open(database_path: &Path) -> Result<Self, DbError> {
        let inner = match Location::classify(database_path) {
            Location::Local(file) => Builder::new_local(file).build().await,
            Location::Remote(url) => {
                Builder::new_remote(url, remote_auth_token()?).build().await
            }
        }
        .map_err(DbError::Open)?;

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Opens a connection with referential integrity enforced. libsql leaves
    /// the foreign-key pragma off per connection, so it is set here rather
    /// than trusted to callers.
    pub async fn connection(&self) -> Result<Connection, DbError> {
        let conn = self.inner.connect().map_err(DbError::Connection)?;
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(DbError::Query)?;
        Ok(conn)
    }

    pub async fn health_check(&self) -> Result<(), DbError> {
        let conn = self.connection().await?;
        let mut rows = conn.query("SELECT 1", ()).await.map_err(DbError::Query)?;
        let _ = rows.next().await.map_err(DbError::Query)?;
        Ok(())
    }
}

fn remote_auth_token() -> Result<String, DbError> {
    env::var(AUTH_TOKEN_VAR)
        .ok()
        .filter(|token| !token.is_empty())
        .ok_or(DbError::MissingAuthToken)
}
