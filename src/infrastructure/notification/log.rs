use super::{NotificationDispatcher, NotificationOutcome, SettlementNotice};
use async_trait::async_trait;
use tracing::{info, warn};

/// Writes each notice to the trace log, one line per recipient.
///
/// A member without an e-mail address cannot be reached, which makes the
/// whole dispatch a failure.
#[derive(Clone, Default)]
pub struct LogDispatcher;

impl LogDispatcher {
    pub fn new() -> Self {
        LogDispatcher
    }
}

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn notify(&self, notice: &SettlementNotice) -> NotificationOutcome {
        let mut unreachable = Vec::new();

        for line in &notice.lines {
            match &line.member.email {
                Some(email) => info!(
                    settlement_id = %notice.settlement.id,
                    to = %email,
                    "{}",
                    line.message
                ),
                None => {
                    warn!(
                        settlement_id = %notice.settlement.id,
                        member_id = %line.member.id,
                        "no e-mail address on record"
                    );
                    unreachable.push(line.member.id.to_string());
                }
            }
        }

        if unreachable.is_empty() {
            NotificationOutcome::Delivered
        } else {
            NotificationOutcome::Failed {
                reason: format!("no e-mail address for: {}", unreachable.join(", ")),
            }
        }
    }
}
