use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{EmailPage, EmailSummary, GatewayError, MailboxGateway};
use crate::auth::CredentialPair;
use crate::mailbox::outbound::{OutgoingMail, encode_raw};
use crate::mailbox::parser::{header_value, plain_text_body};
use crate::mailbox::types::{ListMessagesResponse, Message};

const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Stateless Gmail REST client. Credentials are supplied per call and the
/// client never refreshes or retries; failures surface to the caller as-is.
pub struct MailboxClient {
    http: Client,
    api_base: String,
}

impl MailboxClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn get_message(
        &self,
        creds: &CredentialPair,
        message_id: &str,
    ) -> Result<Message, GatewayError> {
        let url = format!("{}/messages/{}", self.api_base, message_id);
        self.get_json(creds, &url, &[("format", "full".to_string())])
            .await
    }

    async fn get_json<T>(
        &self,
        creds: &CredentialPair,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&creds.access_token)
            .send()
            .await?;
        let response = check_status(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(GatewayError::Decode)
    }
}

#[async_trait]
impl MailboxGateway for MailboxClient {
    async fn list(
        &self,
        creds: &CredentialPair,
        limit: u32,
        page_token: Option<&str>,
    ) -> Result<EmailPage, GatewayError> {
        let url = format!("{}/messages", self.api_base);
        let mut query = vec![("maxResults", limit.to_string())];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }
        let listing: ListMessagesResponse = self.get_json(creds, &url, &query).await?;

        let mut emails = Vec::with_capacity(listing.messages.len());
        for stub in &listing.messages {
            let message = self.get_message(creds, &stub.id).await?;
            emails.push(flatten_message(message));
        }

        Ok(EmailPage {
            emails,
            next_page_token: listing.next_page_token,
        })
    }

    async fn trash(&self, creds: &CredentialPair, message_id: &str) -> Result<(), GatewayError> {
        let url = format!("{}/messages/{}/trash", self.api_base, message_id);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&creds.access_token)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn send(
        &self,
        creds: &CredentialPair,
        outgoing: &OutgoingMail,
    ) -> Result<(), GatewayError> {
        let raw = encode_raw(outgoing)?;
        let url = format!("{}/messages/send", self.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&creds.access_token)
            .json(&json!({ "raw": raw }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(GatewayError::NotFound);
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(GatewayError::Provider {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

fn flatten_message(message: Message) -> EmailSummary {
    let (subject, from, body) = match message.payload.as_ref() {
        Some(payload) => (
            header_value(payload, "Subject").unwrap_or_default().to_string(),
            header_value(payload, "From").unwrap_or_default().to_string(),
            plain_text_body(payload).filter(|b| !b.is_empty()),
        ),
        None => (String::new(), String::new(), None),
    };

    let body = body
        .or(message.snippet.filter(|s| !s.is_empty()))
        .unwrap_or_default();

    EmailSummary {
        id: message.id,
        subject,
        from,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds() -> CredentialPair {
        CredentialPair {
            access_token: "access-token".into(),
            refresh_token: "refresh-token".into(),
        }
    }

    fn make_client(server: &MockServer) -> MailboxClient {
        MailboxClient::new(Client::new()).with_api_base(format!("{}/gmail/v1/users/me", server.uri()))
    }

    fn encoded(text: &str) -> String {
        URL_SAFE_NO_PAD.encode(text.as_bytes())
    }

    #[tokio::test]
    async fn list_fetches_each_message_and_flattens() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/messages"))
            .and(query_param("maxResults", "2"))
            .and(header("authorization", "Bearer access-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [
                    { "id": "m1", "threadId": "t1" },
                    { "id": "m2", "threadId": "t2" }
                ],
                "resultSizeEstimate": 2
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/messages/m1"))
            .and(query_param("format", "full"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "m1",
                "snippet": "snippet one",
                "payload": {
                    "mimeType": "multipart/alternative",
                    "headers": [
                        { "name": "Subject", "value": "Hello" },
                        { "name": "From", "value": "alice@example.com" }
                    ],
                    "parts": [
                        {
                            "mimeType": "text/plain",
                            "body": { "size": 9, "data": encoded("Plain one") }
                        }
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        // No plain-text part; body falls back to the snippet.
        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/messages/m2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "m2",
                "snippet": "snippet two",
                "payload": {
                    "mimeType": "text/html",
                    "headers": [
                        { "name": "From", "value": "bob@example.com" }
                    ],
                    "body": {}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = make_client(&server)
            .list(&creds(), 2, None)
            .await
            .expect("list succeeds");

        assert_eq!(page.emails.len(), 2);
        assert_eq!(page.emails[0].id, "m1");
        assert_eq!(page.emails[0].subject, "Hello");
        assert_eq!(page.emails[0].from, "alice@example.com");
        assert_eq!(page.emails[0].body, "Plain one");
        assert_eq!(page.emails[1].id, "m2");
        assert_eq!(page.emails[1].subject, "", "missing subject defaults to empty");
        assert_eq!(page.emails[1].body, "snippet two");
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn list_passes_page_token_and_returns_next() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/messages"))
            .and(query_param("maxResults", "5"))
            .and(query_param("pageToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [],
                "nextPageToken": "page-3",
                "resultSizeEstimate": 0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = make_client(&server)
            .list(&creds(), 5, Some("page-2"))
            .await
            .expect("list succeeds");

        assert!(page.emails.is_empty());
        assert_eq!(page.next_page_token.as_deref(), Some("page-3"));
    }

    #[tokio::test]
    async fn trash_posts_to_the_trash_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/m9/trash"))
            .and(header("authorization", "Bearer access-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m9" })))
            .expect(1)
            .mount(&server)
            .await;

        make_client(&server)
            .trash(&creds(), "m9")
            .await
            .expect("trash succeeds");
    }

    #[tokio::test]
    async fn trash_maps_missing_message_to_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/gone/trash"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = make_client(&server)
            .trash(&creds(), "gone")
            .await
            .expect_err("should surface 404");
        assert!(matches!(err, GatewayError::NotFound));
    }

    #[tokio::test]
    async fn provider_failures_carry_status_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/messages"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limit exceeded"))
            .expect(1)
            .mount(&server)
            .await;

        let err = make_client(&server)
            .list(&creds(), 5, None)
            .await
            .expect_err("should surface provider error");

        match err {
            GatewayError::Provider { status, message } => {
                assert_eq!(status, 429);
                assert!(message.contains("rate limit exceeded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_posts_base64url_raw_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/send"))
            .and(header("authorization", "Bearer access-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "sent-1" })))
            .expect(1)
            .mount(&server)
            .await;

        let outgoing = OutgoingMail {
            to: "bob@example.com".into(),
            subject: "Re: Hello".into(),
            body: "On my way.".into(),
        };
        make_client(&server)
            .send(&creds(), &outgoing)
            .await
            .expect("send succeeds");

        let requests = server.received_requests().await.expect("requests recorded");
        let send_request = requests
            .iter()
            .find(|r| r.url.path().ends_with("/messages/send"))
            .expect("send request present");
        let payload: serde_json::Value =
            serde_json::from_slice(&send_request.body).expect("json body");
        let raw = payload["raw"].as_str().expect("raw field");
        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(raw).expect("base64url"))
            .expect("utf8 message");
        assert!(decoded.contains("bob@example.com"));
        assert!(decoded.contains("Subject: Re: Hello"));
        assert!(decoded.contains("On my way."));
    }

    #[tokio::test]
    async fn returns_decode_error_on_invalid_json() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&server)
            .await;

        let err = make_client(&server)
            .list(&creds(), 5, None)
            .await
            .expect_err("should surface decode error");
        assert!(matches!(err, GatewayError::Decode(_)));
    }
}
