//! Session record

use serde::{Deserialize, Serialize};

/// Credentials and portal session cookie for the signed-in user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque cookie header value (`name=value; name2=value2`)
    pub session_cookie: Option<String>,

    /// Portal username
    pub username: Option<String>,

    /// Portal password, kept for the proxy's NTLM fallback
    pub password: Option<String>,

    /// Portal user id, discovered on login
    pub user_id: Option<String>,
}

impl Session {
    /// Credentials for NTLM fallback, when both parts are stored
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    /// Whether nothing at all is stored
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Cookie header value, empty when no cookie is stored
    pub fn cookie_header(&self) -> &str {
        self.session_cookie.as_deref().unwrap_or("")
    }

    /// Merge `Set-Cookie` values into the cookie, later values winning
    ///
    /// Returns whether the cookie changed.
    pub fn merge_set_cookies(&mut self, set_cookies: &[String]) -> bool {
        let merged = merge_cookies(self.cookie_header(), set_cookies);
        if merged == self.cookie_header() {
            return false;
        }
        self.session_cookie = Some(merged).filter(|c| !c.is_empty());
        true
    }
}

fn merge_cookies(existing: &str, set_cookies: &[String]) -> String {
    let mut pairs: Vec<(String, String)> = existing
        .split(';')
        .filter_map(split_pair)
        .collect();

    for header in set_cookies {
        let Some((name, value)) = header.split(';').next().and_then(split_pair) else {
            continue;
        };
        match pairs.iter_mut().find(|(n, _)| *n == name) {
            Some(pair) => pair.1 = value,
            None => pairs.push((name, value)),
        }
    }

    pairs
        .into_iter()
        .map(|(n, v)| format!("{}={}", n, v))
        .collect::<Vec<_>>()
        .join("; ")
}

fn split_pair(raw: &str) -> Option<(String, String)> {
    let (name, value) = raw.trim().split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}
