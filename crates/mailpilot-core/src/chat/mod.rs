pub mod cache;

pub use cache::{CachedEmail, EmailCache};

use thiserror::Error;

use crate::auth::{AuthError, CredentialPair, CredentialSource};
use crate::completion::CompletionProvider;
use crate::mailbox::{GatewayError, MailboxGateway, OutgoingMail};

const HELP_TEXT: &str = "I can help with your inbox. Try: 'show emails', \
    'reply to email 1', 'send reply 1', or 'delete email 1'.";

/// Errors that abort a chat command. Usage mistakes (bad index, sending before
/// drafting) are conversation replies, not errors, and completion failures
/// degrade to inline text.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Routes free-text commands to mailbox operations. Matching is an ordered
/// first-match substring scan over the lower-cased message; anything
/// unrecognized gets the help text.
pub struct ChatDispatcher<A, G, C> {
    credentials: A,
    gateway: G,
    completions: C,
    cache: EmailCache,
    list_limit: u32,
}

impl<A, G, C> ChatDispatcher<A, G, C>
where
    A: CredentialSource,
    G: MailboxGateway,
    C: CompletionProvider,
{
    pub fn new(credentials: A, gateway: G, completions: C, list_limit: u32) -> Self {
        Self {
            credentials,
            gateway,
            completions,
            cache: EmailCache::new(),
            list_limit,
        }
    }

    pub async fn dispatch(&self, session_id: &str, message: &str) -> Result<String, ChatError> {
        // Credentials are resolved before any intent logic so auth failures
        // short-circuit uniformly.
        let creds = self.credentials.resolve(session_id).await?;
        let lowered = message.to_lowercase();

        if lowered.contains("show") {
            self.list_emails(session_id, &creds).await
        } else if lowered.contains("reply to email") {
            self.prepare_reply(session_id, &lowered).await
        } else if lowered.contains("send reply") {
            self.send_reply(session_id, &creds, &lowered).await
        } else if lowered.contains("delete email") {
            self.delete_email(session_id, &creds, &lowered).await
        } else {
            Ok(HELP_TEXT.to_string())
        }
    }

    async fn list_emails(
        &self,
        session_id: &str,
        creds: &CredentialPair,
    ) -> Result<String, ChatError> {
        let page = self.gateway.list(creds, self.list_limit, None).await?;
        tracing::debug!(count = page.emails.len(), "listed emails for chat session");
        if page.emails.is_empty() {
            self.cache.replace(session_id, vec![]).await;
            return Ok("No emails found in your inbox.".to_string());
        }

        let window: Vec<CachedEmail> = page.emails.into_iter().map(CachedEmail::from).collect();
        self.cache.replace(session_id, window.clone()).await;

        let mut blocks = Vec::with_capacity(window.len());
        for (position, email) in window.iter().enumerate() {
            let summary = self
                .completions
                .summarize(&email.body)
                .await
                .unwrap_or_else(|err| format!("AI error: {err}"));
            blocks.push(format!(
                "{}. From: {}\nSubject: {}\nSummary: {}",
                position + 1,
                email.from,
                email.subject,
                summary
            ));
        }
        Ok(blocks.join("\n\n"))
    }

    async fn prepare_reply(&self, session_id: &str, message: &str) -> Result<String, ChatError> {
        let Some(number) = trailing_number(message) else {
            return Ok("Which email? Try 'reply to email 1'.".to_string());
        };
        let Some(email) = self.cache.get(session_id, number - 1).await else {
            return Ok(out_of_range(number));
        };

        match self.completions.draft_reply(&email.body).await {
            Ok(draft) => {
                self.cache
                    .set_draft(session_id, number - 1, draft.clone())
                    .await;
                Ok(format!(
                    "Here's a draft reply to email {number}:\n\n{draft}\n\n\
                     Say 'send reply {number}' to send it."
                ))
            }
            // Nothing is stored on failure, so a later send can't pick up
            // error text as a draft.
            Err(err) => Ok(format!("AI error: {err}")),
        }
    }

    async fn send_reply(
        &self,
        session_id: &str,
        creds: &CredentialPair,
        message: &str,
    ) -> Result<String, ChatError> {
        let Some(number) = trailing_number(message) else {
            return Ok("Which reply? Try 'send reply 1'.".to_string());
        };
        let Some(email) = self.cache.get(session_id, number - 1).await else {
            return Ok(out_of_range(number));
        };
        let Some(draft) = email.draft else {
            return Ok(format!(
                "There's no draft for email {number} yet. Say 'reply to email {number}' first."
            ));
        };

        let outgoing = OutgoingMail {
            to: email.from.clone(),
            subject: format!("Re: {}", email.subject),
            body: draft,
        };
        self.gateway.send(creds, &outgoing).await?;
        tracing::info!(to = %outgoing.to, "sent drafted reply");
        Ok(format!("Reply to email {number} sent to {}.", email.from))
    }

    async fn delete_email(
        &self,
        session_id: &str,
        creds: &CredentialPair,
        message: &str,
    ) -> Result<String, ChatError> {
        let Some(number) = trailing_number(message) else {
            return Ok("Which email? Try 'delete email 1'.".to_string());
        };
        let Some(email) = self.cache.get(session_id, number - 1).await else {
            return Ok(out_of_range(number));
        };

        // The window is left untouched, so positions keep referring to the
        // same entries until the next 'show emails'.
        self.gateway.trash(creds, &email.id).await?;
        Ok(format!("Email {number} moved to trash."))
    }
}

/// Last whitespace-separated token parsed as a 1-based position.
fn trailing_number(message: &str) -> Option<usize> {
    message
        .split_whitespace()
        .next_back()?
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1)
}

fn out_of_range(number: usize) -> String {
    format!("Email {number} isn't in the current list. Say 'show emails' to refresh.")
}
