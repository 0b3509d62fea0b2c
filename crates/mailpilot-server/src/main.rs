mod api;

use std::{env, net::SocketAddr, sync::Arc};

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use mailpilot_core::{
    ChatDispatcher, Config, Database, GoogleOAuth, HttpCompletionClient, MailboxClient,
    SessionService, init_telemetry, migrations,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Clone)]
struct AppState {
    db: Database,
    auth: SessionService,
    oauth: Arc<GoogleOAuth>,
    gateway: Arc<MailboxClient>,
    completions: Arc<HttpCompletionClient>,
    dispatcher: Arc<ChatDispatcher<SessionService, MailboxClient, HttpCompletionClient>>,
    list_limit: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = Config::load(&config_path)?;

    init_telemetry(&config.app)?;

    let db = Database::open(&config.paths.database).await?;
    migrations::run_migrations(&db).await?;

    let http = reqwest::Client::new();
    let auth = SessionService::new(db.clone());
    let dispatcher = Arc::new(ChatDispatcher::new(
        auth.clone(),
        MailboxClient::new(http.clone()),
        HttpCompletionClient::new(http.clone(), &config.completion),
        config.mailbox.list_limit,
    ));

    let state = AppState {
        db: db.clone(),
        auth,
        oauth: Arc::new(GoogleOAuth::new(http.clone(), &config.google)),
        gateway: Arc::new(MailboxClient::new(http.clone())),
        completions: Arc::new(HttpCompletionClient::new(http, &config.completion)),
        dispatcher,
        list_limit: config.mailbox.list_limit,
    };
    let app = router(state);

    let shutdown = CancellationToken::new();
    let addr = SocketAddr::from(([0, 0, 0, 0], config.app.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Mailpilot listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .merge(api::router())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    database: String,
}

async fn healthz(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let db_status = match state.db.health_check().await {
        Ok(_) => "ok",
        Err(_) => "unhealthy",
    };

    let status = if db_status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if db_status == "ok" {
                "healthy".to_string()
            } else {
                "unhealthy".to_string()
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: db_status.to_string(),
        }),
    )
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("received ctrl+c, shutting down");
        }
        _ = terminate => {
            warn!("received terminate signal, shutting down");
        }
    }

    shutdown.cancel();
}
