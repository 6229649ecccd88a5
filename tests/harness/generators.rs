// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators.

use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Generate a pool of peer addresses for testing.
pub fn generate_peers(count: usize) -> Vec<SocketAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, a, b, c)), 40000)
        })
        .collect()
}

/// A submission that passes validation.
pub fn valid_submission() -> Value {
    json!({
        "name": "Jane Doe",
        "email": "jane@example.com",
        "tel": "+1 555 010 0199",
        "subject": "Website enquiry",
        "message": "Hello, I would like to discuss a new website.",
    })
}

/// A valid submission with one field replaced.
pub fn submission_with(field: &str, value: Value) -> Value {
    let mut body = valid_submission();
    body[field] = value;
    body
}

/// Markup injection payloads and what sanitization leaves of them.
pub fn markup_payloads() -> Vec<(&'static str, &'static str)> {
    vec![
        ("<script>alert(1)</script> hello world", "scriptalert(1)/script hello world"),
        ("<img src=x onerror=alert(1)> message", "img src=x onerror=alert(1) message"),
        ("  <<b>>bold words<</b>>  ", "bbold words/b"),
        ("plain text message here", "plain text message here"),
    ]
}
