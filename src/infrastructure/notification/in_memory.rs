use super::{NotificationDispatcher, NotificationOutcome, SettlementNotice};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};

/// Records every notice and answers with a scripted outcome.
#[derive(Clone, Default)]
pub struct InMemoryDispatcher {
    sent: Arc<RwLock<Vec<SettlementNotice>>>,
    failure: Arc<RwLock<Option<String>>>,
    delay: Option<Duration>,
    gate: Option<Arc<Notify>>,
}

impl InMemoryDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Holds each notification until the returned handle is notified.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub async fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.write().await = Some(reason.into());
    }

    pub async fn succeed(&self) {
        *self.failure.write().await = None;
    }

    pub async fn sent(&self) -> Vec<SettlementNotice> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl NotificationDispatcher for InMemoryDispatcher {
    async fn notify(&self, notice: &SettlementNotice) -> NotificationOutcome {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.sent.write().await.push(notice.clone());
        match self.failure.read().await.clone() {
            Some(reason) => NotificationOutcome::Failed { reason },
            None => NotificationOutcome::Delivered,
        }
    }
}
