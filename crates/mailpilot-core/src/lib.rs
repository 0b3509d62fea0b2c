pub mod auth;
pub mod chat;
pub mod completion;
pub mod config;
pub mod db;
pub mod mailbox;
pub mod migrations;
pub mod telemetry;

pub use auth::{AuthError, CredentialPair, CredentialSource, GoogleOAuth, SessionService};
pub use chat::{ChatDispatcher, ChatError, EmailCache};
pub use completion::{CompletionError, CompletionProvider, HttpCompletionClient};
pub use config::Config;
pub use db::Database;
pub use mailbox::{EmailPage, EmailSummary, GatewayError, MailboxClient, MailboxGateway};
pub use telemetry::{TelemetryError, init_telemetry};
