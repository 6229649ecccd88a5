// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Markup stripping for submitted form fields.

/// Trim surrounding whitespace, then remove every `<` and `>`.
pub fn sanitize(input: &str) -> String {
    input.trim().chars().filter(|c| !matches!(c, '<' | '>')).collect()
}

/// Sanitize an optional field, treating absence as the empty string.
pub fn sanitize_opt(input: Option<&str>) -> String {
    sanitize(input.unwrap_or_default())
}
