//! Proxy transport abstraction
//!
//! Provides a trait for delivering an envelope to the proxy so the
//! request client can be driven by a scripted transport in tests.

use crate::config::schema::ProxyConfig;
use crate::error::{PortalError, PortalResult};
use crate::proxy::{ProxyEnvelope, ProxyReply};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Delivers request envelopes to the proxy
#[async_trait]
pub trait ProxyTransport: Send + Sync {
    /// Send one envelope and return the proxy's reply
    async fn send(&self, envelope: &ProxyEnvelope) -> PortalResult<ProxyReply>;
}

/// HTTP transport backed by `ureq`
///
/// `ureq` is blocking, so each request runs on tokio's blocking pool.
pub struct UreqTransport {
    agent: ureq::Agent,
    endpoint: String,
}

impl UreqTransport {
    /// Create a transport from proxy configuration
    pub fn new(config: &ProxyConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            endpoint: config.url.clone(),
        }
    }
}

#[async_trait]
impl ProxyTransport for UreqTransport {
    async fn send(&self, envelope: &ProxyEnvelope) -> PortalResult<ProxyReply> {
        let payload = serde_json::to_string(envelope)?;
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();

        debug!("{:?} {} via {}", envelope.method, envelope.url, endpoint);

        let (status, text) = tokio::task::spawn_blocking(move || {
            let mut response = agent
                .post(&endpoint)
                .header("Content-Type", "application/json")
                .send(payload)
                .map_err(|e| PortalError::Transport(e.to_string()))?;
            let status = response.status().as_u16();
            let text = response
                .body_mut()
                .read_to_string()
                .map_err(|e| PortalError::Transport(e.to_string()))?;
            Ok::<_, PortalError>((status, text))
        })
        .await
        .map_err(|e| PortalError::Internal(format!("Proxy request task failed: {}", e)))??;

        if !(200..300).contains(&status) {
            return Err(PortalError::Transport(format!(
                "proxy answered with status {}",
                status
            )));
        }

        serde_json::from_str(&text).map_err(|e| PortalError::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::Method;

    #[tokio::test]
    async fn unreachable_proxy_is_transport_error() {
        let config = ProxyConfig {
            url: "http://127.0.0.1:9/proxy".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        let transport = UreqTransport::new(&config);
        let envelope = ProxyEnvelope {
            url: "https://portal.test/".to_string(),
            method: Method::Get,
            cookies: String::new(),
            body: None,
            use_ntlm: None,
            username: None,
            password: None,
            headers: Default::default(),
        };

        let err = transport.send(&envelope).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
