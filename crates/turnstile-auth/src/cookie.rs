//! Session cookie rendering for the HTTP adapter

use crate::config::SessionConfig;

/// Attributes of the session cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub path: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: String,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_config(&SessionConfig {
            cookie_name: name.into(),
            ..SessionConfig::default()
        })
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            path: config.cookie_path.clone(),
            http_only: config.cookie_http_only,
            secure: config.cookie_secure,
            same_site: config.cookie_same_site.clone(),
        }
    }

    /// `Set-Cookie` value carrying a session token
    pub fn header_value(&self, token: &str, max_age: Option<u64>) -> String {
        let mut cookie = format!("{}={}; Path={}", self.name, token, self.path);

        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site));

        if let Some(max_age) = max_age {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }
        cookie
    }

    /// `Set-Cookie` value that makes the client drop the session cookie
    pub fn clear_header_value(&self) -> String {
        self.header_value("", Some(0))
    }
}
