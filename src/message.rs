// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact submissions and the email composed from them.

use crate::mailer::OutgoingEmail;
use crate::sanitizer::sanitize_opt;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Prefix added to every relayed subject line.
pub const SUBJECT_PREFIX: &str = "[Contact Form]";

/// Raw request body for `POST /api/contact`. Missing fields are tolerated
/// here and reported by the validator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub tel: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Sanitized form fields. An empty `tel` means none was given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub tel: String,
    pub subject: String,
    pub message: String,
}

impl ContactSubmission {
    /// Sanitize every field of a raw request.
    pub fn from_request(req: &ContactRequest) -> Self {
        Self {
            name: sanitize_opt(req.name.as_deref()),
            email: sanitize_opt(req.email.as_deref()),
            tel: sanitize_opt(req.tel.as_deref()),
            subject: sanitize_opt(req.subject.as_deref()),
            message: sanitize_opt(req.message.as_deref()),
        }
    }
}

/// A validated submission stamped with server-side context.
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub submission: ContactSubmission,
    pub received_at: DateTime<Utc>,
    pub client: String,
}

impl ContactMessage {
    pub fn new(
        submission: ContactSubmission,
        client: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            submission,
            received_at,
            client: client.into(),
        }
    }

    fn tel(&self) -> Option<&str> {
        Some(self.submission.tel.as_str()).filter(|t| !t.is_empty())
    }

    fn timestamp(&self) -> String {
        self.received_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }

    /// Subject line as delivered to the inbox.
    pub fn subject_line(&self) -> String {
        format!("{} {}", SUBJECT_PREFIX, self.submission.subject)
    }

    /// HTML rendering of the message.
    pub fn render_html(&self) -> String {
        let s = &self.submission;
        let mut html = String::new();
        html.push_str("<div style=\"font-family: sans-serif; max-width: 600px;\">\n");
        html.push_str("<h2>New contact form submission</h2>\n");
        html.push_str(&format!("<p><strong>Name:</strong> {}</p>\n", escape_html(&s.name)));
        html.push_str(&format!(
            "<p><strong>Email:</strong> <a href=\"mailto:{0}\">{0}</a></p>\n",
            escape_html(&s.email)
        ));
        if let Some(tel) = self.tel() {
            html.push_str(&format!("<p><strong>Phone:</strong> {}</p>\n", escape_html(tel)));
        }
        html.push_str(&format!(
            "<p><strong>Subject:</strong> {}</p>\n",
            escape_html(&s.subject)
        ));
        html.push_str("<p><strong>Message:</strong></p>\n");
        html.push_str(&format!(
            "<div style=\"white-space: pre-wrap;\">{}</div>\n",
            escape_html(&s.message)
        ));
        html.push_str("<hr>\n");
        html.push_str(&format!(
            "<p style=\"color: #666; font-size: 12px;\">Sent from {} at {}</p>\n",
            escape_html(&self.client),
            self.timestamp()
        ));
        html.push_str("</div>\n");
        html
    }

    /// Plain-text rendering of the message.
    pub fn render_text(&self) -> String {
        let s = &self.submission;
        let mut text = String::new();
        text.push_str("New contact form submission\n\n");
        text.push_str(&format!("Name: {}\n", s.name));
        text.push_str(&format!("Email: {}\n", s.email));
        if let Some(tel) = self.tel() {
            text.push_str(&format!("Phone: {}\n", tel));
        }
        text.push_str(&format!("Subject: {}\n\n", s.subject));
        text.push_str(&format!("Message:\n{}\n\n", s.message));
        text.push_str("---\n");
        text.push_str(&format!("Sent from {} at {}\n", self.client, self.timestamp()));
        text
    }

    /// Build the outgoing email, delivered to and from `account`.
    pub fn to_email(&self, account: &str) -> OutgoingEmail {
        OutgoingEmail {
            from: account.to_string(),
            to: account.to_string(),
            reply_to: self.submission.email.clone(),
            subject: self.subject_line(),
            html_body: self.render_html(),
            text_body: self.render_text(),
        }
    }
}

/// Escape the characters that survive sanitization but still matter in HTML.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
