use super::panels::PanelId;
use std::collections::VecDeque;

/// Notifications published by the panel store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelNotification {
    SelectionChanged {
        previous: Option<PanelId>,
        current: Option<PanelId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u32);

#[derive(Debug)]
struct Mailbox {
    subscriber: SubscriberId,
    pending: VecDeque<PanelNotification>,
}

/// Fan-out channel with one mailbox per subscriber. Subscribers drain
/// their own mailbox when they get control back.
#[derive(Debug, Default)]
pub struct NotificationChannel {
    next_subscriber: u32,
    mailboxes: Vec<Mailbox>,
    published: u64,
}

impl NotificationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> SubscriberId {
        let subscriber = SubscriberId(self.next_subscriber);
        self.next_subscriber = self.next_subscriber.wrapping_add(1);
        self.mailboxes.push(Mailbox {
            subscriber,
            pending: VecDeque::new(),
        });
        subscriber
    }

    /// Returns `false` if the subscriber was not registered.
    pub fn unsubscribe(&mut self, subscriber: SubscriberId) -> bool {
        let before = self.mailboxes.len();
        self.mailboxes.retain(|mailbox| mailbox.subscriber != subscriber);
        self.mailboxes.len() != before
    }

    pub fn publish(&mut self, notification: PanelNotification) {
        for mailbox in &mut self.mailboxes {
            mailbox.pending.push_back(notification);
        }
        self.published += 1;
    }

    pub fn drain(&mut self, subscriber: SubscriberId) -> Vec<PanelNotification> {
        self.mailboxes
            .iter_mut()
            .find(|mailbox| mailbox.subscriber == subscriber)
            .map(|mailbox| mailbox.pending.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.mailboxes.len()
    }

    pub fn total_published(&self) -> u64 {
        self.published
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(previous: Option<u64>, current: Option<u64>) -> PanelNotification {
        PanelNotification::SelectionChanged {
            previous: previous.map(PanelId::from_raw),
            current: current.map(PanelId::from_raw),
        }
    }

    #[test]
    fn every_subscriber_receives_each_notification() {
        let mut channel = NotificationChannel::new();
        let a = channel.subscribe();
        let b = channel.subscribe();

        channel.publish(changed(None, Some(1)));

        assert_eq!(channel.drain(a), vec![changed(None, Some(1))]);
        assert_eq!(channel.drain(b), vec![changed(None, Some(1))]);
        assert!(channel.drain(a).is_empty());
        assert_eq!(channel.total_published(), 1);
    }

    #[test]
    fn notifications_keep_publish_order() {
        let mut channel = NotificationChannel::new();
        let a = channel.subscribe();

        channel.publish(changed(None, Some(1)));
        channel.publish(changed(Some(1), Some(2)));

        assert_eq!(
            channel.drain(a),
            vec![changed(None, Some(1)), changed(Some(1), Some(2))]
        );
    }

    #[test]
    fn unsubscribed_mailbox_stops_receiving() {
        let mut channel = NotificationChannel::new();
        let a = channel.subscribe();

        assert!(channel.unsubscribe(a));
        assert!(!channel.unsubscribe(a));
        channel.publish(changed(None, Some(1)));

        assert!(channel.drain(a).is_empty());
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn subscriber_ids_are_not_reused() {
        let mut channel = NotificationChannel::new();
        let a = channel.subscribe();
        channel.unsubscribe(a);
        let b = channel.subscribe();
        assert_ne!(a, b);
    }
}
