// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Mail transport for relayed contact messages.
//!
//! The handler only sees the [`MailSender`] capability. [`SmtpMailer`] is the
//! production implementation over an authenticated SMTP relay.

use crate::config::MailConfig;
use async_trait::async_trait;
use lettre::{
    address::AddressError,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tracing::debug;

/// A fully composed email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Mail delivery errors.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid mailbox address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Message rejected: {0}")]
    Rejected(String),
}

/// Capability to deliver one composed email.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// SMTP mailer over an implicit-TLS relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build a pooled transport for the configured relay and account.
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self { transport })
    }
}

/// Convert an [`OutgoingEmail`] into a multipart/alternative message.
pub fn build_message(email: &OutgoingEmail) -> Result<Message, MailError> {
    let from: Mailbox = email.from.parse()?;
    let to: Mailbox = email.to.parse()?;
    let reply_to: Mailbox = email.reply_to.parse()?;

    let message = Message::builder()
        .from(from)
        .reply_to(reply_to)
        .to(to)
        .subject(email.subject.as_str())
        .multipart(MultiPart::alternative_plain_html(
            email.text_body.clone(),
            email.html_body.clone(),
        ))?;
    Ok(message)
}

#[async_trait]
impl MailSender for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let message = build_message(email)?;
        let response = self.transport.send(message).await?;
        if !response.is_positive() {
            return Err(MailError::Rejected(response.code().to_string()));
        }
        debug!(code = %response.code(), "SMTP relay accepted message");
        Ok(())
    }
}
