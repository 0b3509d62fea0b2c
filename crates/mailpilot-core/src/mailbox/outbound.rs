use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use mail_builder::MessageBuilder;
use mail_builder::headers::address::Address;
use thiserror::Error;

/// A reply to be submitted to the provider. The provider assigns the
/// Message-ID and fills in the sender from the authenticated account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum MimeBuildError {
    #[error("missing recipient")]
    MissingRecipient,
    #[error("failed to build message: {0}")]
    Build(#[from] std::io::Error),
}

/// Build the minimal RFC 5322 message and base64url-encode it for the
/// provider's `raw` field.
pub fn encode_raw(mail: &OutgoingMail) -> Result<String, MimeBuildError> {
    if mail.to.trim().is_empty() {
        return Err(MimeBuildError::MissingRecipient);
    }

    let message = MessageBuilder::new()
        .to(Address::new_address(None::<&str>, mail.to.as_str()))
        .subject(mail.subject.as_str())
        .text_body(mail.body.as_str())
        .write_to_string()?;

    Ok(URL_SAFE_NO_PAD.encode(message.as_bytes()))
}
