//! In-process fan-out of realtime notifications to connected clients.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use resoluty_core::{AppError, AppResult};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

/// Notification published to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealtimeNotification {
    /// Event name delivered to clients.
    pub event: String,
    /// Arbitrary payload.
    pub data: Value,
    /// Restricts delivery to clients that joined this room.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl RealtimeNotification {
    /// Builds a notification, rejecting a blank event name.
    pub fn new(event: impl Into<String>, data: Value, room: Option<String>) -> AppResult<Self> {
        let event = event.into();
        if event.trim().is_empty() {
            return Err(AppError::Validation("event is required".to_owned()));
        }

        Ok(Self {
            event,
            data,
            room: room.filter(|room| !room.trim().is_empty()),
        })
    }
}

type RoomRegistry = Arc<Mutex<HashMap<String, usize>>>;

fn lock_rooms(registry: &RoomRegistry) -> MutexGuard<'_, HashMap<String, usize>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Broadcast hub shared by the HTTP emit endpoint and WebSocket sessions.
#[derive(Clone)]
pub struct RealtimeHub {
    sender: broadcast::Sender<RealtimeNotification>,
    room_members: RoomRegistry,
}

impl RealtimeHub {
    /// Creates a hub buffering at most `capacity` notifications per subscriber.
    pub fn new(capacity: usize) -> AppResult<Self> {
        if capacity == 0 {
            return Err(AppError::Validation(
                "realtime channel capacity must be greater than zero".to_owned(),
            ));
        }

        let (sender, _) = broadcast::channel(capacity);
        Ok(Self {
            sender,
            room_members: RoomRegistry::default(),
        })
    }

    /// Publishes `notification` and returns how many subscribers it reaches.
    ///
    /// A room-scoped notification reaches only the subscriptions that joined
    /// the room. Publishing with no subscribers is not an error.
    pub fn publish(&self, notification: RealtimeNotification) -> usize {
        let event = notification.event.clone();
        let room = notification.room.clone();
        let live = self.sender.send(notification).unwrap_or(0);
        let delivered = match room.as_deref() {
            Some(room) => self.room_member_count(room).min(live),
            None => live,
        };
        debug!(event = %event, room = ?room, delivered, "realtime notification published");
        delivered
    }

    /// Number of live subscriptions that joined `room`.
    #[must_use]
    pub fn room_member_count(&self, room: &str) -> usize {
        lock_rooms(&self.room_members)
            .get(room)
            .copied()
            .unwrap_or(0)
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Opens a subscription that has joined no rooms.
    #[must_use]
    pub fn subscribe(&self) -> RealtimeSubscription {
        RealtimeSubscription {
            receiver: self.sender.subscribe(),
            rooms: HashSet::new(),
            room_members: self.room_members.clone(),
        }
    }
}

/// One client's view of the hub.
///
/// Dropping the subscription leaves every room it joined.
pub struct RealtimeSubscription {
    receiver: broadcast::Receiver<RealtimeNotification>,
    rooms: HashSet<String>,
    room_members: RoomRegistry,
}

impl RealtimeSubscription {
    /// Starts receiving notifications scoped to `room`.
    pub fn join(&mut self, room: impl Into<String>) -> bool {
        let room = room.into();
        if self.rooms.contains(&room) {
            return false;
        }

        *lock_rooms(&self.room_members).entry(room.clone()).or_insert(0) += 1;
        self.rooms.insert(room)
    }

    /// Stops receiving notifications scoped to `room`.
    pub fn leave(&mut self, room: &str) -> bool {
        if !self.rooms.remove(room) {
            return false;
        }

        release_room(&mut lock_rooms(&self.room_members), room);
        true
    }

    /// Returns whether the subscription joined `room`.
    #[must_use]
    pub fn is_member(&self, room: &str) -> bool {
        self.rooms.contains(room)
    }

    /// Waits for the next notification addressed to this subscription.
    ///
    /// Returns `None` once the hub is dropped. Notifications missed while
    /// lagging are skipped.
    pub async fn next(&mut self) -> Option<RealtimeNotification> {
        loop {
            match self.receiver.recv().await {
                Ok(notification) => {
                    let addressed = notification
                        .room
                        .as_deref()
                        .is_none_or(|room| self.rooms.contains(room));
                    if addressed {
                        return Some(notification);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "realtime subscriber lagged, skipping notifications");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for RealtimeSubscription {
    fn drop(&mut self) {
        let mut members = lock_rooms(&self.room_members);
        for room in &self.rooms {
            release_room(&mut members, room);
        }
    }
}

fn release_room(members: &mut HashMap<String, usize>, room: &str) {
    if let Some(count) = members.get_mut(room) {
        *count = count.saturating_sub(1);
        if *count == 0 {
            members.remove(room);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{RealtimeHub, RealtimeNotification};

    fn hub() -> RealtimeHub {
        RealtimeHub::new(8).unwrap_or_else(|_| panic!("valid capacity"))
    }

    fn notification(event: &str, room: Option<&str>) -> RealtimeNotification {
        RealtimeNotification::new(event, json!({"value": 1}), room.map(str::to_owned))
            .unwrap_or_else(|_| panic!("valid notification"))
    }

    #[test]
    fn blank_event_is_rejected() {
        assert!(RealtimeNotification::new(" ", json!(null), None).is_err());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(RealtimeHub::new(0).is_err());
    }

    #[test]
    fn publishing_without_subscribers_reaches_nobody() {
        assert_eq!(hub().publish(notification("sales_updated", None)), 0);
    }

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber() {
        let hub = hub();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        let delivered = hub.publish(notification("sales_updated", None));

        assert_eq!(delivered, 2);
        assert_eq!(
            first.next().await.map(|received| received.event),
            Some("sales_updated".to_owned())
        );
        assert_eq!(
            second.next().await.map(|received| received.event),
            Some("sales_updated".to_owned())
        );
    }

    #[tokio::test]
    async fn room_notification_only_reaches_members() {
        let hub = hub();
        let mut member = hub.subscribe();
        let mut outsider = hub.subscribe();
        member.join("financeiro");

        assert_eq!(hub.publish(notification("invoice_paid", Some("financeiro"))), 1);
        assert_eq!(hub.publish(notification("heartbeat", None)), 2);

        assert_eq!(
            member.next().await.map(|received| received.event),
            Some("invoice_paid".to_owned())
        );
        assert_eq!(
            outsider.next().await.map(|received| received.event),
            Some("heartbeat".to_owned())
        );
    }

    #[tokio::test]
    async fn leaving_a_room_stops_delivery() {
        let hub = hub();
        let mut subscription = hub.subscribe();
        subscription.join("gestao");
        assert!(subscription.leave("gestao"));
        assert!(!subscription.is_member("gestao"));

        hub.publish(notification("report_ready", Some("gestao")));
        hub.publish(notification("heartbeat", None));

        assert_eq!(
            subscription.next().await.map(|received| received.event),
            Some("heartbeat".to_owned())
        );
    }

    #[test]
    fn room_scoped_publish_counts_only_members() {
        let hub = hub();
        let _first = hub.subscribe();
        let _second = hub.subscribe();

        assert_eq!(hub.subscriber_count(), 2);
        assert_eq!(hub.publish(notification("invoice_paid", Some("financeiro"))), 0);
    }

    #[test]
    fn membership_is_released_on_leave_and_drop() {
        let hub = hub();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();
        assert!(first.join("comercial"));
        assert!(!first.join("comercial"));
        assert!(second.join("comercial"));
        assert_eq!(hub.room_member_count("comercial"), 2);

        assert!(first.leave("comercial"));
        assert!(!first.leave("comercial"));
        assert_eq!(hub.room_member_count("comercial"), 1);

        drop(second);
        assert_eq!(hub.room_member_count("comercial"), 0);
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn closed_hub_ends_subscription() {
        let hub = hub();
        let mut subscription = hub.subscribe();
        drop(hub);

        assert!(subscription.next().await.is_none());
    }
}
