//! Single-slot, latest-wins outcome channel.
//!
//! The loop never waits on the consumer: a send replaces whatever unread
//! outcome is still in the slot.

use as3_types::DeployOutcome;
use tokio::sync::watch;
use tracing::debug;

/// Create a connected sender/receiver pair.
pub fn channel() -> (OutcomeSender, OutcomeReceiver) {
    let (tx, rx) = watch::channel(None);
    (OutcomeSender { tx }, OutcomeReceiver { rx })
}

/// Producer half, owned by the loop
pub struct OutcomeSender {
    tx: watch::Sender<Option<DeployOutcome>>,
}

impl OutcomeSender {
    /// Publish `outcome`, evicting any unread one. Never blocks.
    pub fn notify(&self, outcome: DeployOutcome) {
        if self.tx.receiver_count() == 0 {
            debug!("No outcome consumer attached");
        }
        self.tx.send_replace(Some(outcome));
    }
}

/// Consumer half
pub struct OutcomeReceiver {
    rx: watch::Receiver<Option<DeployOutcome>>,
}

impl OutcomeReceiver {
    /// Take the latest unseen outcome without waiting.
    pub fn try_recv(&mut self) -> Option<DeployOutcome> {
        let current = self.rx.borrow_and_update();
        if current.has_changed() {
            current.clone()
        } else {
            None
        }
    }

    /// Wait for the next outcome. `None` once the sender is gone and nothing is unseen.
    pub async fn recv(&mut self) -> Option<DeployOutcome> {
        if let Some(outcome) = self.try_recv() {
            return Some(outcome);
        }
        self.rx.changed().await.ok()?;
        self.rx.borrow_and_update().clone()
    }
}
