//! Room service: stake reservation, matchmaking, settlement, and move relay.

use chrono::Utc;

use super::Page;
use crate::domain::{
    EntryKind, EventBus, LedgerOwner, Money, NewEntry, Room, RoomEvent, RoomId, RoomRules,
    RoomStatus, Settlement, UserId,
};
use crate::error::GatewayError;
use crate::persistence::{Database, ledger, rooms, users};

/// Orchestration layer for room operations.
///
/// Every mutation follows the same pattern: check the guard on a snapshot
/// → open a transaction → conditional debit / status update → append
/// ledger entries → commit → emit events. The conditional statements
/// re-check what the snapshot guard saw, so a concurrent request that wins
/// the race leaves this one with a clean rollback.
#[derive(Debug, Clone)]
pub struct RoomService {
    db: Database,
    event_bus: EventBus,
    rules: RoomRules,
}

impl RoomService {
    /// Creates a new `RoomService`.
    #[must_use]
    pub fn new(db: Database, event_bus: EventBus, rules: RoomRules) -> Self {
        Self {
            db,
            event_bus,
            rules,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Opens a room and reserves the host's stake.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] / [`GatewayError::StakeBelowMinimum`]
    ///   if the stake is rejected by [`RoomRules::validate_stake`].
    /// - [`GatewayError::InsufficientBalance`] if the host cannot cover it.
    pub async fn create_room(&self, host: UserId, stake: Money) -> Result<Room, GatewayError> {
        self.rules.validate_stake(stake)?;

        let now = Utc::now();
        let room = Room {
            id: RoomId::new(),
            host_id: host,
            guest_id: None,
            stake,
            status: RoomStatus::Waiting,
            winner_id: None,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db.begin().await?;
        if !users::debit_if_sufficient(&mut tx, host, stake).await? {
            return Err(GatewayError::InsufficientBalance(
                "insufficient balance, deposit first".to_string(),
            ));
        }
        rooms::insert(&mut tx, &room).await?;
        let entry = NewEntry::new(
            LedgerOwner::User(host),
            EntryKind::Stake,
            stake.checked_neg()?,
            format!("room_reserve_host stake {stake}"),
        )
        .with_reference(room.id.to_string());
        ledger::append(&mut tx, &entry, now).await?;
        tx.commit().await?;

        tracing::info!(room_id = %room.id, %host, %stake, "room created");
        Ok(room)
    }

    /// Reserves the guest's stake and starts the match.
    ///
    /// Publishes [`RoomEvent::RoomStarted`] after the commit.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::RoomNotFound`] if the room does not exist.
    /// - [`GatewayError::RoomUnavailable`] if it is not waiting, or another
    ///   guest joined first.
    /// - [`GatewayError::CannotJoinOwnRoom`] if `guest` is the host.
    /// - [`GatewayError::InsufficientBalance`] if the guest cannot cover the
    ///   stake.
    pub async fn join_room(&self, id: RoomId, guest: UserId) -> Result<Room, GatewayError> {
        let room = self.get_room(id).await?;
        room.ensure_joinable(guest)?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        if !users::debit_if_sufficient(&mut tx, guest, room.stake).await? {
            return Err(GatewayError::InsufficientBalance(
                "insufficient balance, deposit first".to_string(),
            ));
        }
        if !rooms::claim_for_guest(&mut tx, id, guest, now).await? {
            return Err(GatewayError::RoomUnavailable(id));
        }
        let entry = NewEntry::new(
            LedgerOwner::User(guest),
            EntryKind::Stake,
            room.stake.checked_neg()?,
            format!("room_reserve_guest room:{id} stake {}", room.stake),
        )
        .with_reference(id.to_string());
        ledger::append(&mut tx, &entry, now).await?;
        tx.commit().await?;

        let room = Room {
            guest_id: Some(guest),
            status: RoomStatus::Playing,
            updated_at: now,
            ..room
        };

        tracing::info!(room_id = %id, %guest, "room started");
        let _ = self.event_bus.publish(RoomEvent::RoomStarted {
            room: room.clone(),
            timestamp: now,
        });
        Ok(room)
    }

    /// Records the winner and disburses the pot.
    ///
    /// The winner is credited `stake × 2 − platform_fee` (floored at zero)
    /// and the platform account receives the rest. Publishes
    /// [`RoomEvent::RoomFinished`] after the commit.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::RoomNotFound`] if the room does not exist.
    /// - [`GatewayError::RoomNotPlaying`] if it is not playing, or another
    ///   report settled it first.
    /// - [`GatewayError::Forbidden`] if `reporter` is not a participant.
    /// - [`GatewayError::InvalidWinner`] if `winner` is not a participant.
    pub async fn report_result(
        &self,
        id: RoomId,
        reporter: UserId,
        winner: UserId,
    ) -> Result<Room, GatewayError> {
        let room = self.get_room(id).await?;
        room.ensure_reportable(reporter, winner)?;
        let settlement = Settlement::compute(room.stake, self.rules.platform_fee)?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        if !rooms::finish(&mut tx, id, winner, now).await? {
            return Err(GatewayError::RoomNotPlaying(id));
        }
        users::credit(&mut tx, winner, settlement.payout).await?;
        let payout = NewEntry::new(
            LedgerOwner::User(winner),
            EntryKind::Payout,
            settlement.payout,
            format!("room_payout room:{id} winner:{winner}"),
        )
        .with_reference(id.to_string());
        ledger::append(&mut tx, &payout, now).await?;
        let fee = NewEntry::new(
            LedgerOwner::Platform,
            EntryKind::PlatformFee,
            settlement.platform_fee,
            format!("room_fee room:{id}"),
        )
        .with_reference(id.to_string());
        ledger::append(&mut tx, &fee, now).await?;
        tx.commit().await?;

        let room = Room {
            status: RoomStatus::Finished,
            winner_id: Some(winner),
            updated_at: now,
            ..room
        };

        tracing::info!(
            room_id = %id,
            %winner,
            payout = %settlement.payout,
            fee = %settlement.platform_fee,
            "room finished"
        );
        let _ = self.event_bus.publish(RoomEvent::RoomFinished {
            room: room.clone(),
            timestamp: now,
        });
        Ok(room)
    }

    /// Loads a room.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RoomNotFound`] if it does not exist.
    pub async fn get_room(&self, id: RoomId) -> Result<Room, GatewayError> {
        let mut conn = self.db.acquire().await?;
        rooms::find(&mut conn, id)
            .await?
            .ok_or(GatewayError::RoomNotFound(id))
    }

    /// Lists rooms newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn list_rooms(
        &self,
        status: Option<RoomStatus>,
        limit: u32,
        offset: u32,
    ) -> Result<Page<Room>, GatewayError> {
        let mut conn = self.db.acquire().await?;
        let items = rooms::list(&mut conn, status, limit, offset).await?;
        let total = rooms::count(&mut conn, status).await?;
        Ok(Page { items, total })
    }

    /// Relays an opaque move to the room's subscribers and returns how
    /// many connections in the room received it.
    ///
    /// Moves are not checked for legality.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::RoomNotFound`] if the room does not exist.
    /// - [`GatewayError::RoomNotPlaying`] unless the room is playing.
    pub async fn relay_move(
        &self,
        id: RoomId,
        payload: serde_json::Value,
    ) -> Result<usize, GatewayError> {
        let room = self.get_room(id).await?;
        if room.status != RoomStatus::Playing {
            return Err(GatewayError::RoomNotPlaying(id));
        }
        let delivered = self.event_bus.publish(RoomEvent::MoveRelayed {
            room_id: id,
            payload,
            timestamp: Utc::now(),
        });
        tracing::debug!(room_id = %id, delivered, "move relayed");
        Ok(delivered)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::User;

    struct Fixture {
        db: Database,
        rooms: RoomService,
    }

    async fn fixture() -> Fixture {
        let Ok(db) = Database::in_memory().await else {
            panic!("db");
        };
        let rooms = RoomService::new(db.clone(), EventBus::new(16), RoomRules::default());
        Fixture { db, rooms }
    }

    impl Fixture {
        async fn user(&self, name: &str, cents: i64) -> UserId {
            let Ok(mut conn) = self.db.acquire().await else {
                panic!("conn");
            };
            let user = User {
                id: UserId::new(),
                username: name.to_string(),
                balance: Money::from_cents(cents),
                created_at: Utc::now(),
            };
            if users::insert(&mut conn, &user).await.is_err() {
                panic!("seed user failed");
            }
            user.id
        }

        async fn balance(&self, id: UserId) -> Money {
            let Ok(mut conn) = self.db.acquire().await else {
                panic!("conn");
            };
            let Ok(Some(user)) = users::find_by_id(&mut conn, id).await else {
                panic!("user missing");
            };
            user.balance
        }

        async fn platform_total(&self) -> Money {
            let Ok(mut conn) = self.db.acquire().await else {
                panic!("conn");
            };
            let Ok(total) = ledger::platform_total(&mut conn).await else {
                panic!("platform total failed");
            };
            total
        }
    }

    #[tokio::test]
    async fn create_room_reserves_host_stake() {
        let f = fixture().await;
        let host = f.user("host", 5_000).await;

        let Ok(room) = f.rooms.create_room(host, Money::from_cents(1_500)).await else {
            panic!("create failed");
        };
        assert_eq!(room.status, RoomStatus::Waiting);
        assert_eq!(f.balance(host).await, Money::from_cents(3_500));
    }

    #[tokio::test]
    async fn create_room_rejects_small_stake_and_poor_host() {
        let f = fixture().await;
        let host = f.user("host", 500).await;

        assert!(matches!(
            f.rooms.create_room(host, Money::from_cents(999)).await,
            Err(GatewayError::StakeBelowMinimum { .. })
        ));
        assert!(matches!(
            f.rooms.create_room(host, Money::from_cents(1_000)).await,
            Err(GatewayError::InsufficientBalance(_))
        ));
        // Nothing was debited.
        assert_eq!(f.balance(host).await, Money::from_cents(500));
    }

    #[tokio::test]
    async fn full_match_settles_pot() {
        let f = fixture().await;
        let host = f.user("host", 2_000).await;
        let guest = f.user("guest", 2_000).await;
        let mut events = f.rooms.event_bus().subscribe();

        let Ok(room) = f.rooms.create_room(host, Money::from_cents(1_000)).await else {
            panic!("create failed");
        };
        events.join(room.id);
        let Ok(joined) = f.rooms.join_room(room.id, guest).await else {
            panic!("join failed");
        };
        assert_eq!(joined.status, RoomStatus::Playing);
        assert_eq!(f.balance(guest).await, Money::from_cents(1_000));

        let Ok(RoomEvent::RoomStarted { room: started, .. }) = events.recv().await else {
            panic!("expected room_started");
        };
        assert_eq!(started.id, room.id);

        let Ok(finished) = f.rooms.report_result(room.id, guest, host).await else {
            panic!("report failed");
        };
        assert_eq!(finished.winner_id, Some(host));
        assert_eq!(f.balance(host).await, Money::from_cents(2_900));
        assert_eq!(f.platform_total().await, Money::from_cents(100));

        let Ok(RoomEvent::RoomFinished { room: done, .. }) = events.recv().await else {
            panic!("expected room_finished");
        };
        assert_eq!(done.status, RoomStatus::Finished);
    }

    #[tokio::test]
    async fn join_guards() {
        let f = fixture().await;
        let host = f.user("host", 2_000).await;
        let guest = f.user("guest", 2_000).await;
        let late = f.user("late", 2_000).await;
        let Ok(room) = f.rooms.create_room(host, Money::from_cents(1_000)).await else {
            panic!("create failed");
        };

        assert!(matches!(
            f.rooms.join_room(room.id, host).await,
            Err(GatewayError::CannotJoinOwnRoom)
        ));
        assert!(f.rooms.join_room(room.id, guest).await.is_ok());
        assert!(matches!(
            f.rooms.join_room(room.id, late).await,
            Err(GatewayError::RoomUnavailable(_))
        ));
        assert_eq!(f.balance(late).await, Money::from_cents(2_000));
        assert!(matches!(
            f.rooms.join_room(RoomId::new(), late).await,
            Err(GatewayError::RoomNotFound(_))
        ));
    }

    #[tokio::test]
    async fn poor_guest_is_told_to_deposit() {
        let f = fixture().await;
        let host = f.user("host", 2_000).await;
        let guest = f.user("guest", 999).await;
        let Ok(room) = f.rooms.create_room(host, Money::from_cents(1_000)).await else {
            panic!("create failed");
        };

        let Err(err) = f.rooms.join_room(room.id, guest).await else {
            panic!("join should fail");
        };
        assert_eq!(err.to_string(), "insufficient balance, deposit first");
        assert_eq!(f.balance(guest).await, Money::from_cents(999));
        let Ok(still_waiting) = f.rooms.get_room(room.id).await else {
            panic!("room missing");
        };
        assert_eq!(still_waiting.status, RoomStatus::Waiting);
    }

    #[tokio::test]
    async fn outsider_cannot_report() {
        let f = fixture().await;
        let host = f.user("host", 2_000).await;
        let guest = f.user("guest", 2_000).await;
        let outsider = f.user("outsider", 0).await;
        let Ok(room) = f.rooms.create_room(host, Money::from_cents(1_000)).await else {
            panic!("create failed");
        };
        assert!(f.rooms.join_room(room.id, guest).await.is_ok());

        assert!(matches!(
            f.rooms.report_result(room.id, outsider, outsider).await,
            Err(GatewayError::Forbidden(_))
        ));
        assert!(matches!(
            f.rooms.report_result(room.id, host, outsider).await,
            Err(GatewayError::InvalidWinner(_))
        ));
        assert!(f.rooms.report_result(room.id, host, guest).await.is_ok());
        assert!(matches!(
            f.rooms.report_result(room.id, host, guest).await,
            Err(GatewayError::RoomNotPlaying(_))
        ));
        // Paid exactly once.
        assert_eq!(f.balance(guest).await, Money::from_cents(2_900));
    }

    #[tokio::test]
    async fn moves_relay_only_while_playing() {
        let f = fixture().await;
        let host = f.user("host", 2_000).await;
        let guest = f.user("guest", 2_000).await;
        let Ok(room) = f.rooms.create_room(host, Money::from_cents(1_000)).await else {
            panic!("create failed");
        };
        let payload = serde_json::json!({"from": [2, 1], "to": [3, 2]});

        assert!(matches!(
            f.rooms.relay_move(room.id, payload.clone()).await,
            Err(GatewayError::RoomNotPlaying(_))
        ));
        assert!(f.rooms.join_room(room.id, guest).await.is_ok());

        let mut events = f.rooms.event_bus().subscribe();
        let _elsewhere = f.rooms.event_bus().subscribe();
        assert_eq!(f.rooms.relay_move(room.id, payload.clone()).await.ok(), Some(0));
        events.join(room.id);
        assert_eq!(f.rooms.relay_move(room.id, payload.clone()).await.ok(), Some(1));
        let Ok(RoomEvent::MoveRelayed { payload: relayed, .. }) = events.recv().await else {
            panic!("expected move");
        };
        assert_eq!(relayed, payload);
    }

    #[tokio::test]
    async fn list_rooms_paginates() {
        let f = fixture().await;
        let host = f.user("host", 10_000).await;
        for _ in 0..3 {
            assert!(f.rooms.create_room(host, Money::from_cents(1_000)).await.is_ok());
        }
        let Ok(page) = f.rooms.list_rooms(Some(RoomStatus::Waiting), 2, 0).await else {
            panic!("list failed");
        };
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 3);
    }
}
