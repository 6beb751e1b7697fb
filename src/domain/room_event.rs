//! Domain events relayed to room subscribers.
//!
//! Room transitions and player moves are published as a [`RoomEvent`]
//! through the [`super::EventBus`] and forwarded to every WebSocket
//! connection that joined the room's channel.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Room, RoomId};

/// Event broadcast to the subscribers of one room.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoomEvent {
    /// A guest reserved their stake; the match may begin.
    RoomStarted {
        /// Room snapshot after the transition.
        room: Room,
        /// Transition timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A participant reported the result and funds were disbursed.
    RoomFinished {
        /// Room snapshot after the transition.
        room: Room,
        /// Transition timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A player move, relayed verbatim.
    #[serde(rename = "move")]
    MoveRelayed {
        /// Room the move belongs to.
        room_id: RoomId,
        /// Opaque client payload (e.g. `{"from": …, "to": …}`).
        #[serde(rename = "move")]
        payload: serde_json::Value,
        /// Relay timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl RoomEvent {
    /// Returns the room this event belongs to.
    #[must_use]
    pub fn room_id(&self) -> RoomId {
        match self {
            Self::RoomStarted { room, .. } | Self::RoomFinished { room, .. } => room.id,
            Self::MoveRelayed { room_id, .. } => *room_id,
        }
    }

    /// Returns the event name as sent to clients.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::RoomStarted { .. } => "room_started",
            Self::RoomFinished { .. } => "room_finished",
            Self::MoveRelayed { .. } => "move",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Money, RoomStatus, UserId};

    fn room() -> Room {
        let now = Utc::now();
        Room {
            id: RoomId::new(),
            host_id: UserId::new(),
            guest_id: Some(UserId::new()),
            stake: Money::from_cents(1_000),
            status: RoomStatus::Playing,
            winner_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn room_started_serializes_with_tag() {
        let room = room();
        let event = RoomEvent::RoomStarted {
            room: room.clone(),
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_type_str(), "room_started");
        assert_eq!(event.room_id(), room.id);

        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(json["event"], "room_started");
        assert_eq!(json["room"]["stake"], "10.00");
        assert_eq!(json["room"]["status"], "playing");
    }

    #[test]
    fn move_carries_payload_verbatim() {
        let room_id = RoomId::new();
        let event = RoomEvent::MoveRelayed {
            room_id,
            payload: serde_json::json!({"from": {"r": 5, "c": 0}, "to": {"r": 4, "c": 1}}),
            timestamp: Utc::now(),
        };
        assert_eq!(event.room_id(), room_id);

        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(json["event"], "move");
        assert_eq!(json["move"]["to"]["c"], 1);
    }
}
