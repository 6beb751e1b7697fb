//! Room-scoped broadcast of [`RoomEvent`]s.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Every WebSocket
//! connection holds a [`RoomSubscriber`] that joins rooms and yields only
//! the events of those rooms. The bus keeps a per-room member count so a
//! publisher learns how many connections an event actually reaches.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use super::{RoomEvent, RoomId};

type Members = Arc<Mutex<HashMap<RoomId, usize>>>;

/// Broadcast bus for [`RoomEvent`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity
/// (default 10 000). When the ring buffer is full, the oldest events are
/// dropped for lagging receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<RoomEvent>,
    members: Members,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            members: Arc::default(),
        }
    }

    /// Publishes an event to the members of its room.
    ///
    /// Returns the number of subscribers that joined the event's room.
    pub fn publish(&self, event: RoomEvent) -> usize {
        let room = event.room_id();
        if self.sender.send(event).is_err() {
            return 0;
        }
        self.room_members(room)
    }

    /// Creates a subscriber that has not joined any room yet.
    ///
    /// Each WebSocket connection should call this once on connect.
    #[must_use]
    pub fn subscribe(&self) -> RoomSubscriber {
        RoomSubscriber {
            rx: self.sender.subscribe(),
            rooms: HashSet::new(),
            members: Arc::clone(&self.members),
        }
    }

    /// Returns the number of subscribers currently in `room`.
    #[must_use]
    pub fn room_members(&self, room: RoomId) -> usize {
        lock(&self.members).get(&room).copied().unwrap_or(0)
    }

    /// Returns the current number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// One connection's view of the bus: the rooms it joined and the events
/// for them.
///
/// Dropping the subscriber leaves every joined room.
#[derive(Debug)]
pub struct RoomSubscriber {
    rx: broadcast::Receiver<RoomEvent>,
    rooms: HashSet<RoomId>,
    members: Members,
}

impl RoomSubscriber {
    /// Joins a room. Returns `false` if it was already joined.
    pub fn join(&mut self, room: RoomId) -> bool {
        if !self.rooms.insert(room) {
            return false;
        }
        *lock(&self.members).entry(room).or_insert(0) += 1;
        true
    }

    /// Leaves a room. Returns `false` if it was not joined.
    pub fn leave(&mut self, room: RoomId) -> bool {
        if !self.rooms.remove(&room) {
            return false;
        }
        release(&mut lock(&self.members), room);
        true
    }

    /// Returns `true` if events for `room` are delivered.
    #[must_use]
    pub fn is_joined(&self, room: RoomId) -> bool {
        self.rooms.contains(&room)
    }

    /// Returns the number of joined rooms.
    #[must_use]
    pub fn joined_count(&self) -> usize {
        self.rooms.len()
    }

    /// Waits for the next event of a joined room.
    ///
    /// Cancel-safe: events are only consumed from the channel one at a
    /// time, and non-matching ones are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`broadcast::error::RecvError::Lagged`] when events were
    /// dropped for this subscriber, and `Closed` once the bus is gone.
    pub async fn recv(&mut self) -> Result<RoomEvent, broadcast::error::RecvError> {
        loop {
            let event = self.rx.recv().await?;
            if self.rooms.contains(&event.room_id()) {
                return Ok(event);
            }
        }
    }
}

impl Drop for RoomSubscriber {
    fn drop(&mut self) {
        let mut members = lock(&self.members);
        for room in self.rooms.drain() {
            release(&mut members, room);
        }
    }
}

fn lock(members: &Mutex<HashMap<RoomId, usize>>) -> MutexGuard<'_, HashMap<RoomId, usize>> {
    members.lock().unwrap_or_else(PoisonError::into_inner)
}

fn release(members: &mut HashMap<RoomId, usize>, room: RoomId) {
    if let Entry::Occupied(mut count) = members.entry(room) {
        if *count.get() <= 1 {
            count.remove();
        } else {
            *count.get_mut() -= 1;
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_event(room_id: RoomId) -> RoomEvent {
        RoomEvent::MoveRelayed {
            room_id,
            payload: serde_json::json!({"from": {"r": 2, "c": 1}, "to": {"r": 3, "c": 0}}),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(100);
        assert_eq!(bus.publish(make_event(RoomId::new())), 0);
    }

    #[tokio::test]
    async fn subscriber_receives_only_joined_rooms() {
        let bus = EventBus::new(100);
        let mut sub = bus.subscribe();
        let joined = RoomId::new();
        assert!(sub.join(joined));

        assert_eq!(bus.publish(make_event(RoomId::new())), 0);
        assert_eq!(bus.publish(make_event(joined)), 1);

        let Ok(event) = sub.recv().await else {
            panic!("expected to receive event");
        };
        assert_eq!(event.room_id(), joined);
    }

    #[tokio::test]
    async fn delivered_count_is_per_room() {
        let bus = EventBus::new(100);
        let room = RoomId::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        let _bystander = bus.subscribe();
        a.join(room);
        b.join(room);

        assert_eq!(bus.receiver_count(), 3);
        assert_eq!(bus.publish(make_event(room)), 2);

        let Ok(e1) = a.recv().await else {
            panic!("a failed");
        };
        let Ok(e2) = b.recv().await else {
            panic!("b failed");
        };
        assert_eq!(e1.room_id(), e2.room_id());
    }

    #[test]
    fn join_and_leave_track_membership() {
        let bus = EventBus::new(100);
        let room = RoomId::new();
        let mut sub = bus.subscribe();

        assert!(sub.join(room));
        assert!(!sub.join(room));
        assert!(sub.is_joined(room));
        assert_eq!(bus.room_members(room), 1);

        assert!(sub.leave(room));
        assert!(!sub.leave(room));
        assert!(!sub.is_joined(room));
        assert_eq!(bus.room_members(room), 0);
    }

    #[test]
    fn dropping_subscriber_leaves_its_rooms() {
        let bus = EventBus::new(100);
        let (r1, r2) = (RoomId::new(), RoomId::new());
        let mut keep = bus.subscribe();
        keep.join(r1);
        let mut gone = bus.subscribe();
        gone.join(r1);
        gone.join(r2);
        assert_eq!(gone.joined_count(), 2);
        assert_eq!(bus.room_members(r1), 2);

        drop(gone);
        assert_eq!(bus.room_members(r1), 1);
        assert_eq!(bus.room_members(r2), 0);
        assert_eq!(bus.receiver_count(), 1);
    }
}
