//! Scripted transport for unit tests

use crate::error::{PortalError, PortalResult};
use crate::proxy::{ProxyEnvelope, ProxyReply, ProxyTransport};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays canned replies in order and records every envelope sent
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<PortalResult<ProxyReply>>>,
    sent: Mutex<Vec<ProxyEnvelope>>,
    delay: Mutex<Option<std::time::Duration>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<ProxyReply>) -> Arc<Self> {
        let transport = Self::default();
        transport
            .replies
            .lock()
            .unwrap()
            .extend(replies.into_iter().map(Ok));
        Arc::new(transport)
    }

    pub fn push(&self, reply: ProxyReply) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    pub fn push_error(&self, error: PortalError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Hold every reply back, so callers observe an in-flight request
    pub fn set_delay(&self, delay: std::time::Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn sent(&self) -> Vec<ProxyEnvelope> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProxyTransport for ScriptedTransport {
    async fn send(&self, envelope: &ProxyEnvelope) -> PortalResult<ProxyReply> {
        self.sent.lock().unwrap().push(envelope.clone());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortalError::Transport("no scripted reply".to_string())))
    }
}
