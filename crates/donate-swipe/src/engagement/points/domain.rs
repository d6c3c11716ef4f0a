use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engagement::domain::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Earned,
    Spent,
}

/// Why points moved. One-time codes can be awarded at most once per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    ProfileComplete,
    AddAvatar,
    FirstDonation,
    DonationMade,
    RequestShared,
    RewardRedeemed,
}

impl ReasonCode {
    pub const ALL: [ReasonCode; 6] = [
        ReasonCode::ProfileComplete,
        ReasonCode::AddAvatar,
        ReasonCode::FirstDonation,
        ReasonCode::DonationMade,
        ReasonCode::RequestShared,
        ReasonCode::RewardRedeemed,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ReasonCode::ProfileComplete => "PROFILE_COMPLETE",
            ReasonCode::AddAvatar => "ADD_AVATAR",
            ReasonCode::FirstDonation => "FIRST_DONATION",
            ReasonCode::DonationMade => "DONATION_MADE",
            ReasonCode::RequestShared => "REQUEST_SHARED",
            ReasonCode::RewardRedeemed => "REWARD_REDEEMED",
        }
    }

    pub const fn is_one_time(self) -> bool {
        matches!(
            self,
            ReasonCode::ProfileComplete | ReasonCode::AddAvatar | ReasonCode::FirstDonation
        )
    }

    /// Codes that debit the balance rather than credit it.
    pub const fn is_spend(self) -> bool {
        matches!(self, ReasonCode::RewardRedeemed)
    }

    /// Amount the client awards when it has no reason to deviate.
    pub const fn suggested_amount(self) -> u32 {
        match self {
            ReasonCode::ProfileComplete => 50,
            ReasonCode::AddAvatar => 20,
            ReasonCode::FirstDonation => 100,
            ReasonCode::DonationMade => 25,
            ReasonCode::RequestShared => 5,
            ReasonCode::RewardRedeemed => 0,
        }
    }
}

/// Immutable ledger line. `amount` is always positive; direction comes from `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsTransaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub amount: u32,
    pub reason_code: ReasonCode,
    pub description: String,
    pub date: DateTime<Utc>,
}

impl PointsTransaction {
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            TransactionKind::Earned => i64::from(self.amount),
            TransactionKind::Spent => -i64::from(self.amount),
        }
    }

    /// Running total after this transaction, or `None` if it would go negative or overflow.
    pub fn apply_to(&self, total_points: u64) -> Option<u64> {
        match self.kind {
            TransactionKind::Earned => total_points.checked_add(u64::from(self.amount)),
            TransactionKind::Spent => total_points.checked_sub(u64::from(self.amount)),
        }
    }
}

/// Sum of earned minus spent over a full history.
pub fn ledger_sum(history: &[PointsTransaction]) -> i64 {
    history.iter().map(PointsTransaction::signed_amount).sum()
}

/// Precondition checked by the ledger inside the same critical section as the append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendGuard {
    Always,
    OncePerReason,
    SufficientBalance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub transaction: PointsTransaction,
    pub guard: AppendGuard,
}

impl LedgerEntry {
    /// Outcome to report without appending, or `None` when the entry may be written.
    pub fn check(&self, history: &[PointsTransaction], total_points: u64) -> Option<LedgerAppend> {
        match self.guard {
            AppendGuard::Always => None,
            AppendGuard::OncePerReason => history
                .iter()
                .find(|existing| {
                    existing.kind == TransactionKind::Earned
                        && existing.reason_code == self.transaction.reason_code
                })
                .cloned()
                .map(LedgerAppend::Duplicate),
            AppendGuard::SufficientBalance => {
                if total_points < u64::from(self.transaction.amount) {
                    Some(LedgerAppend::InsufficientBalance {
                        available: total_points,
                    })
                } else {
                    None
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerAppend {
    Appended(PointsTransaction),
    /// A one-time code was already awarded; carries the original transaction.
    Duplicate(PointsTransaction),
    InsufficientBalance {
        available: u64,
    },
}

/// Stored state for one user: the log plus its materialized total.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub total_points: u64,
    pub history: Vec<PointsTransaction>,
}

/// Caller-facing points summary with the derived level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPoints {
    pub user_id: UserId,
    pub total_points: u64,
    pub available_points: u64,
    pub level: u8,
    pub level_name: &'static str,
    pub level_color: &'static str,
    pub next_level_points: Option<u64>,
    pub progress_percent: u8,
    pub points_history: Vec<PointsTransaction>,
}
