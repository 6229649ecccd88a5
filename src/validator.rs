// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Contact form validator.
//!
//! Checks each field independently and reports at most one error per field,
//! in field order: name, email, tel, subject, message.

use crate::config::ValidationConfig;
use crate::message::ContactSubmission;
use lettre::Address;
use thiserror::Error;
use tracing::debug;

/// Validation error types. `Display` is the message shown to the client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Please provide a valid email address")]
    InvalidEmail,

    #[error("Phone number must contain between {min} and {max} digits")]
    InvalidPhone { min: usize, max: usize },
}

/// Contact form validator.
pub struct ContactValidator {
    config: ValidationConfig,
}

impl Default for ContactValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

impl ContactValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a (sanitized) submission.
    ///
    /// Returns every field's first failing check, in field order. An empty
    /// list means the submission is acceptable.
    pub fn validate(&self, submission: &ContactSubmission) -> Vec<ValidationError> {
        let errors: Vec<ValidationError> = [
            self.validate_name(&submission.name),
            self.validate_email(&submission.email),
            self.validate_tel(&submission.tel),
            self.validate_subject(&submission.subject),
            self.validate_message(&submission.message),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !errors.is_empty() {
            debug!(count = errors.len(), first = %errors[0], "Submission failed validation");
        }
        errors
    }

    pub fn validate_name(&self, name: &str) -> Option<ValidationError> {
        check_length("Name", name, self.config.name_len)
    }

    pub fn validate_email(&self, email: &str) -> Option<ValidationError> {
        if email.is_empty() {
            return Some(ValidationError::Required { field: "Email" });
        }
        if !is_email_shaped(email) {
            return Some(ValidationError::InvalidEmail);
        }
        let max = self.config.email_max_len;
        if email.trim().chars().count() > max {
            return Some(ValidationError::TooLong { field: "Email", max });
        }
        // The address becomes the relayed Reply-To, so it must also parse as a mailbox.
        if let Err(err) = email.parse::<Address>() {
            debug!(error = %err, "Email rejected by address parser");
            return Some(ValidationError::InvalidEmail);
        }
        None
    }

    /// Phone is optional; when present only its digits are counted.
    pub fn validate_tel(&self, tel: &str) -> Option<ValidationError> {
        if tel.is_empty() {
            return None;
        }
        let (min, max) = self.config.tel_digits;
        let digits = tel.chars().filter(char::is_ascii_digit).count();
        if digits < min || digits > max {
            return Some(ValidationError::InvalidPhone { min, max });
        }
        None
    }

    pub fn validate_subject(&self, subject: &str) -> Option<ValidationError> {
        check_length("Subject", subject, self.config.subject_len)
    }

    pub fn validate_message(&self, message: &str) -> Option<ValidationError> {
        check_length("Message", message, self.config.message_len)
    }
}

fn check_length(
    field: &'static str,
    value: &str,
    (min, max): (usize, usize),
) -> Option<ValidationError> {
    if value.is_empty() {
        return Some(ValidationError::Required { field });
    }
    let len = value.trim().chars().count();
    if len < min {
        return Some(ValidationError::TooShort { field, min });
    }
    if len > max {
        return Some(ValidationError::TooLong { field, max });
    }
    None
}

/// `local@domain.tld` where no part holds whitespace or a second `@`.
fn is_email_shaped(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Some dot in the domain must have at least one character on each side.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}
