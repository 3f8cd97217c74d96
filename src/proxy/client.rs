//! Proxy request client

use crate::error::{PortalError, PortalResult};
use crate::proxy::{
    encode_form, Method, ProxyEnvelope, ProxyResult, ProxyTransport, RequestOptions,
};
use crate::session::SessionManager;
use std::sync::Arc;
use tracing::{debug, warn};

/// Issues portal requests as the stored user
///
/// The client never retries on its own: login and password changes must
/// not be replayed silently. See [`crate::proxy::retry`] for the caller
/// side policy.
#[derive(Clone)]
pub struct ProxyClient {
    transport: Arc<dyn ProxyTransport>,
    session: Arc<SessionManager>,
}

impl ProxyClient {
    /// Create a client over a transport and the session store
    pub fn new(transport: Arc<dyn ProxyTransport>, session: Arc<SessionManager>) -> Self {
        Self { transport, session }
    }

    /// Perform one request against the portal
    pub async fn request(
        &self,
        url: &str,
        method: Method,
        body: Option<String>,
        options: &RequestOptions,
    ) -> PortalResult<ProxyResult> {
        let (session, generation) = self.session.checkout().await;
        let credentials = session.credentials();

        let envelope = ProxyEnvelope {
            url: url.to_string(),
            method,
            cookies: session.cookie_header().to_string(),
            body,
            use_ntlm: credentials.map(|_| true),
            username: credentials.map(|(user, _)| user.to_string()),
            password: credentials.map(|(_, pass)| pass.to_string()),
            headers: options.headers.clone(),
        };

        let result = ProxyResult::from(self.transport.send(&envelope).await?);
        debug!("{:?} {} -> {}", method, url, result.status_code);

        if result.status_code == 401 {
            if let Err(e) = self.session.clear().await {
                warn!("Failed to clear expired session: {}", e);
            }
            return Err(PortalError::SessionExpired);
        }

        if !result.set_cookies().is_empty() {
            self.session
                .merge_set_cookies(generation, result.set_cookies())
                .await?;
        }

        let accepted = (200..300).contains(&result.status_code)
            || (options.allow_redirects && result.is_redirect());
        if !accepted {
            return Err(PortalError::RequestFailed {
                status: result.status_code,
            });
        }

        Ok(result)
    }

    /// GET a portal page
    pub async fn get(&self, url: &str) -> PortalResult<ProxyResult> {
        self.request(url, Method::Get, None, &RequestOptions::default())
            .await
    }

    /// POST form fields to a portal page (ASP.NET postback)
    pub async fn post_form(
        &self,
        url: &str,
        fields: &[(String, String)],
        options: RequestOptions,
    ) -> PortalResult<ProxyResult> {
        let options = options.header("Content-Type", "application/x-www-form-urlencoded");
        self.request(url, Method::Post, Some(encode_form(fields)), &options)
            .await
    }
}
