//! NotificationBadge - unread count shown on the notifications tab.
//!
//! The count comes from polling `GET /api/notifications`; live outbid
//! effects bump it between polls so the badge reacts immediately.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::domain::auction::{badge_label, ScreenEffect};
use crate::ports::AuctionApi;

/// Default interval between notification polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

pub struct NotificationBadge {
    unread: Arc<watch::Sender<usize>>,
    poller: JoinHandle<()>,
}

impl NotificationBadge {
    /// Starts polling immediately and then every `poll_interval`.
    pub fn start(
        api: Arc<dyn AuctionApi>,
        effects: broadcast::Receiver<ScreenEffect>,
        poll_interval: Duration,
    ) -> Self {
        let (unread, _) = watch::channel(0);
        let unread = Arc::new(unread);
        let poller = tokio::spawn(poll(api, effects, Arc::clone(&unread), poll_interval));
        Self { unread, poller }
    }

    /// Unread notifications right now.
    pub fn unread(&self) -> usize {
        *self.unread.borrow()
    }

    /// Badge text, `None` when there is nothing unread.
    pub fn label(&self) -> Option<String> {
        badge_label(self.unread())
    }

    pub fn watch(&self) -> watch::Receiver<usize> {
        self.unread.subscribe()
    }

    /// Clears the badge locally, e.g. when the list is opened. The next
    /// poll brings back whatever the server still reports as unread.
    pub fn clear(&self) {
        self.unread.send_if_modified(|count| std::mem::take(count) != 0);
    }
}

impl Drop for NotificationBadge {
    fn drop(&mut self) {
        self.poller.abort();
    }
}

async fn poll(
    api: Arc<dyn AuctionApi>,
    mut effects: broadcast::Receiver<ScreenEffect>,
    unread: Arc<watch::Sender<usize>>,
    poll_interval: Duration,
) {
    let mut ticker = time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut effects_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => match api.notifications().await {
                Ok(list) => {
                    let count = list.iter().filter(|n| !n.is_read).count();
                    debug!(total = list.len(), unread = count, "notifications polled");
                    unread.send_if_modified(|current| {
                        let changed = *current != count;
                        *current = count;
                        changed
                    });
                }
                Err(e) => warn!(error = %e, "failed to poll notifications"),
            },
            effect = effects.recv(), if effects_open => match effect {
                Ok(ScreenEffect::Outbid { auction_id, .. }) => {
                    debug!(auction_id = %auction_id, "outbid, bumping badge");
                    unread.send_modify(|count| *count += 1);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "screen effects lagged");
                }
                Err(RecvError::Closed) => effects_open = false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::rest::MockAuctionApi;
    use crate::domain::auction::Notification;
    use crate::domain::foundation::{AuctionId, Timestamp};
    use crate::ports::ApiError;

    fn notification(id: &str, is_read: bool) -> Notification {
        Notification {
            id: id.to_string(),
            title: "Outbid".to_string(),
            message: "You've been outbid".to_string(),
            timestamp: Timestamp::from_epoch_millis(0).unwrap(),
            kind: "outbid".to_string(),
            is_read,
        }
    }

    fn outbid() -> ScreenEffect {
        ScreenEffect::Outbid {
            auction_id: AuctionId::new("42").unwrap(),
            title: "Vintage Watch".to_string(),
            current_price: 150.0,
        }
    }

    async fn changed(rx: &mut watch::Receiver<usize>) -> usize {
        time::timeout(Duration::from_secs(120), rx.changed())
            .await
            .expect("timed out waiting for badge")
            .expect("badge sender dropped");
        *rx.borrow_and_update()
    }

    #[tokio::test(start_paused = true)]
    async fn first_poll_counts_unread() {
        let api = MockAuctionApi::new();
        api.set_notifications(vec![
            notification("1", false),
            notification("2", true),
            notification("3", false),
        ]);
        let (_effects, rx) = broadcast::channel(8);

        let badge = NotificationBadge::start(Arc::new(api), rx, DEFAULT_POLL_INTERVAL);
        let mut watch = badge.watch();

        assert_eq!(changed(&mut watch).await, 2);
        assert_eq!(badge.label().as_deref(), Some("2"));
    }

    #[tokio::test(start_paused = true)]
    async fn polls_again_after_interval() {
        let api = MockAuctionApi::new();
        let (_effects, rx) = broadcast::channel(8);
        let badge = NotificationBadge::start(Arc::new(api.clone()), rx, DEFAULT_POLL_INTERVAL);
        let mut watch = badge.watch();

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(api.notification_calls(), 1);

        api.set_notifications(vec![notification("1", false)]);
        assert_eq!(changed(&mut watch).await, 1);
        assert_eq!(api.notification_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn outbid_effect_bumps_count_between_polls() {
        let api = MockAuctionApi::new();
        let (effects, rx) = broadcast::channel(8);
        let badge = NotificationBadge::start(Arc::new(api), rx, DEFAULT_POLL_INTERVAL);
        let mut watch = badge.watch();
        time::sleep(Duration::from_secs(1)).await;

        effects.send(outbid()).unwrap();
        assert_eq!(changed(&mut watch).await, 1);

        effects
            .send(ScreenEffect::EndingSoon {
                auction_id: AuctionId::new("42").unwrap(),
            })
            .unwrap();
        effects.send(outbid()).unwrap();
        assert_eq!(changed(&mut watch).await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_keeps_count() {
        let api = MockAuctionApi::new();
        api.fail_notifications(ApiError::Unauthorized);
        let (effects, rx) = broadcast::channel(8);
        let badge = NotificationBadge::start(Arc::new(api.clone()), rx, DEFAULT_POLL_INTERVAL);
        let mut watch = badge.watch();

        effects.send(outbid()).unwrap();
        assert_eq!(changed(&mut watch).await, 1);

        time::sleep(Duration::from_secs(31)).await;
        assert_eq!(api.notification_calls(), 2);
        assert_eq!(badge.unread(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn label_caps_at_ninety_nine() {
        let api = MockAuctionApi::new();
        api.set_notifications((0..150).map(|i| notification(&i.to_string(), false)).collect());
        let (_effects, rx) = broadcast::channel(8);
        let badge = NotificationBadge::start(Arc::new(api), rx, DEFAULT_POLL_INTERVAL);
        let mut watch = badge.watch();

        assert_eq!(changed(&mut watch).await, 150);
        assert_eq!(badge.label().as_deref(), Some("99+"));

        badge.clear();
        assert_eq!(badge.unread(), 0);
        assert_eq!(badge.label(), None);
    }
}
