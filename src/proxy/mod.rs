//! Authenticated portal requests through the remote proxy
//!
//! The portal is never contacted directly. Each logical request is
//! wrapped in a JSON envelope carrying the target URL, the stored session
//! cookie and, when available, credentials for the proxy's NTLM fallback.
//! The proxy answers with `{status, body, headers}` describing the
//! portal's response.
//!
//! | Portal status | Outcome |
//! |---------------|---------|
//! | 2xx | [`ProxyResult`] |
//! | 302 / 303 | [`ProxyResult`] only with [`RequestOptions::allow_redirects`] |
//! | 401 | session cleared, then [`PortalError::SessionExpired`] |
//! | other | [`PortalError::RequestFailed`] |
//!
//! [`PortalError::SessionExpired`]: crate::error::PortalError::SessionExpired
//! [`PortalError::RequestFailed`]: crate::error::PortalError::RequestFailed

pub mod client;
pub mod retry;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::ProxyClient;
pub use retry::RetryPolicy;
pub use transport::{ProxyTransport, UreqTransport};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// HTTP method forwarded to the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

/// Request envelope sent to the proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEnvelope {
    pub url: String,
    pub method: Method,
    pub cookies: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_ntlm: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

/// A header value as reported by the proxy: single string or list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    One(String),
    Many(Vec<String>),
}

/// Raw response envelope returned by the proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyReply {
    pub status: u16,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub headers: HashMap<String, HeaderValue>,
}

impl ProxyReply {
    /// Reply with a status and body and no headers
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: HashMap::new(),
        }
    }

    /// Add a header (builder style)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_string(), HeaderValue::One(value.to_string()));
        self
    }
}

/// Normalized portal response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResult {
    pub status_code: u16,
    pub body: String,
    headers: HashMap<String, Vec<String>>,
}

impl ProxyResult {
    /// First value of a header (case-insensitive name)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Redirect target of a 302/303 response
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// Whether the portal answered with a redirect
    pub fn is_redirect(&self) -> bool {
        matches!(self.status_code, 302 | 303)
    }

    /// All `Set-Cookie` values
    pub fn set_cookies(&self) -> &[String] {
        self.headers
            .get("set-cookie")
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl From<ProxyReply> for ProxyResult {
    fn from(reply: ProxyReply) -> Self {
        let mut headers: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in reply.headers {
            let entry = headers.entry(name.to_ascii_lowercase()).or_default();
            match value {
                HeaderValue::One(v) => entry.push(v),
                HeaderValue::Many(vs) => entry.extend(vs),
            }
        }
        Self {
            status_code: reply.status,
            body: reply.body,
            headers,
        }
    }
}

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Treat 302/303 as success so the caller can inspect the redirect
    pub allow_redirects: bool,

    /// Extra headers forwarded to the portal
    pub headers: BTreeMap<String, String>,
}

impl RequestOptions {
    /// Accept 302/303 responses
    pub fn allow_redirects(mut self) -> Self {
        self.allow_redirects = true;
        self
    }

    /// Add a forwarded header
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }
}

/// Encode form fields as `application/x-www-form-urlencoded`
pub fn encode_form<K: AsRef<str>, V: AsRef<str>>(fields: &[(K, V)]) -> String {
    fields
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k.as_ref()),
                urlencoding::encode(v.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
