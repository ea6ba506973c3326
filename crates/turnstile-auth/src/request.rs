//! Transport-neutral view of an inbound request

use std::collections::HashMap;

pub const AUTHORIZATION_HEADER: &str = "authorization";

/// The parts of a request the authentication layer reads
///
/// Built by the HTTP adapter. Header names are matched case-insensitively,
/// cookie names exactly.
#[derive(Debug, Clone, Default)]
pub struct RequestView {
    path: String,
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
}

impl RequestView {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Add a header. A repeated name replaces the earlier value.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Add every cookie found in a raw `Cookie` header value
    pub fn with_cookie_header(mut self, cookie_header: &str) -> Self {
        for (name, value) in parse_cookie_header(cookie_header) {
            self.cookies.entry(name).or_insert(value);
        }
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn authorization_header(&self) -> Option<&str> {
        self.header(AUTHORIZATION_HEADER)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// Split a `Cookie` header into name/value pairs, skipping malformed pieces
pub fn parse_cookie_header(cookie_header: &str) -> Vec<(String, String)> {
    cookie_header
        .split(';')
        .filter_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().trim_matches('"').to_string()))
        })
        .collect()
}
