//! Staked two-player rooms and their settlement arithmetic.
//!
//! A room moves strictly forward through three states:
//!
//! ```text
//! waiting ──(guest stakes)──▶ playing ──(participant reports)──▶ finished
//! ```
//!
//! There is no cancellation path: a room that never fills keeps the host's
//! stake reserved.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Money, MoneyError, RoomId, UserId};
use crate::error::GatewayError;

/// Lifecycle state of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Host stake reserved, waiting for a guest.
    Waiting,
    /// Both stakes reserved; moves are relayed.
    Playing,
    /// Result recorded and funds disbursed.
    Finished,
}

impl RoomStatus {
    /// Returns the storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "playing" => Ok(Self::Playing),
            "finished" => Ok(Self::Finished),
            other => Err(GatewayError::InvalidRequest(format!(
                "unknown room status: {other}"
            ))),
        }
    }
}

/// A staked room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    /// Room identifier.
    pub id: RoomId,
    /// Player who created the room and reserved the first stake.
    pub host_id: UserId,
    /// Player who joined, once the room is `playing`.
    pub guest_id: Option<UserId>,
    /// Stake each player reserves. Fixed at creation.
    pub stake: Money,
    /// Lifecycle state.
    pub status: RoomStatus,
    /// Declared winner, once `finished`.
    pub winner_id: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last state transition.
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Returns `true` if `user` is the host or the guest.
    #[must_use]
    pub fn is_participant(&self, user: UserId) -> bool {
        self.host_id == user || self.guest_id == Some(user)
    }

    /// Checks that `guest` may join this room.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::RoomUnavailable`] unless the room is `waiting`.
    /// - [`GatewayError::CannotJoinOwnRoom`] if `guest` is the host.
    pub fn ensure_joinable(&self, guest: UserId) -> Result<(), GatewayError> {
        if self.status != RoomStatus::Waiting || self.guest_id.is_some() {
            return Err(GatewayError::RoomUnavailable(self.id));
        }
        if self.host_id == guest {
            return Err(GatewayError::CannotJoinOwnRoom);
        }
        Ok(())
    }

    /// Checks that `reporter` may record `winner` as the result.
    ///
    /// The server does not verify the match outcome itself; it only
    /// constrains who may report and who may be paid.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::RoomNotPlaying`] unless the room is `playing`.
    /// - [`GatewayError::Forbidden`] if `reporter` is not a participant.
    /// - [`GatewayError::InvalidWinner`] if `winner` is not a participant.
    pub fn ensure_reportable(&self, reporter: UserId, winner: UserId) -> Result<(), GatewayError> {
        if self.status != RoomStatus::Playing {
            return Err(GatewayError::RoomNotPlaying(self.id));
        }
        if !self.is_participant(reporter) {
            return Err(GatewayError::Forbidden("not a participant".to_string()));
        }
        if !self.is_participant(winner) {
            return Err(GatewayError::InvalidWinner(winner));
        }
        Ok(())
    }
}

/// Economic parameters applied to every room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomRules {
    /// Smallest stake a host may open a room with.
    pub min_stake: Money,
    /// Flat fee the platform keeps from each finished match.
    pub platform_fee: Money,
}

impl Default for RoomRules {
    fn default() -> Self {
        Self {
            min_stake: Money::from_cents(1_000),
            platform_fee: Money::from_cents(100),
        }
    }
}

impl RoomRules {
    /// Validates a proposed stake.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] if the stake is not positive.
    /// - [`GatewayError::StakeBelowMinimum`] if below [`Self::min_stake`].
    pub fn validate_stake(&self, stake: Money) -> Result<(), GatewayError> {
        if !stake.is_positive() {
            return Err(GatewayError::InvalidRequest("stake invalid".to_string()));
        }
        if stake < self.min_stake {
            return Err(GatewayError::StakeBelowMinimum {
                minimum: self.min_stake,
            });
        }
        Ok(())
    }
}

/// How the pot of a finished room is split.
///
/// `payout + platform_fee == pot` always holds: when the configured fee
/// exceeds the pot, the payout floors at zero and the platform keeps only
/// the pot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settlement {
    /// Both stakes combined.
    pub pot: Money,
    /// Amount credited to the winner.
    pub payout: Money,
    /// Amount retained by the platform.
    pub platform_fee: Money,
}

impl Settlement {
    /// Splits `stake × 2` between the winner and the platform.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] on arithmetic overflow.
    pub fn compute(stake: Money, platform_fee: Money) -> Result<Self, MoneyError> {
        let pot = stake.checked_mul(2)?;
        let payout = pot.floored_sub(platform_fee)?;
        let platform_fee = pot.checked_sub(payout)?;
        Ok(Self {
            pot,
            payout,
            platform_fee,
        })
    }
}
