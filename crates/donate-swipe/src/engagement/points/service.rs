use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::domain::{
    ledger_sum, AppendGuard, LedgerAppend, LedgerEntry, PointsTransaction, ReasonCode,
    TransactionId, TransactionKind, UserPoints,
};
use super::levels::progress_for;
use crate::engagement::domain::UserId;
use crate::engagement::error::ErrorKind;
use crate::engagement::repository::{PointsLedger, ProfileDirectory, RepositoryError};
use crate::session::Session;

/// Inbound award or redemption. `amount` stays signed so non-positive values surface as
/// validation failures rather than decode errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsRequest {
    pub reason_code: ReasonCode,
    pub amount: i64,
    #[serde(default)]
    pub description: String,
}

static TRANSACTION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_transaction_id() -> TransactionId {
    let id = TRANSACTION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TransactionId(format!("txn-{id:08}"))
}

/// Points and level engine over a [`PointsLedger`].
pub struct PointsEngine<P, G> {
    profiles: Arc<P>,
    ledger: Arc<G>,
}

impl<P, G> PointsEngine<P, G>
where
    P: ProfileDirectory + 'static,
    G: PointsLedger + 'static,
{
    pub fn new(profiles: Arc<P>, ledger: Arc<G>) -> Self {
        Self { profiles, ledger }
    }

    /// Credit points. One-time reason codes return the original transaction on repeat calls.
    pub fn add_points(
        &self,
        session: &Session,
        request: PointsRequest,
        at: DateTime<Utc>,
    ) -> Result<PointsTransaction, PointsError> {
        if request.reason_code.is_spend() {
            return Err(PointsError::WrongDirection(request.reason_code));
        }
        let guard = if request.reason_code.is_one_time() {
            AppendGuard::OncePerReason
        } else {
            AppendGuard::Always
        };
        self.append(session, request, TransactionKind::Earned, guard, at)
    }

    /// Debit points as a `spent` transaction. Never drives the balance below zero.
    pub fn spend_points(
        &self,
        session: &Session,
        request: PointsRequest,
        at: DateTime<Utc>,
    ) -> Result<PointsTransaction, PointsError> {
        if !request.reason_code.is_spend() {
            return Err(PointsError::WrongDirection(request.reason_code));
        }
        self.append(
            session,
            request,
            TransactionKind::Spent,
            AppendGuard::SufficientBalance,
            at,
        )
    }

    /// Current balance, derived level, and full history.
    ///
    /// The cached total is checked against the transaction sum on every read; a mismatch is
    /// reported, not repaired.
    pub fn user_points(&self, session: &Session) -> Result<UserPoints, PointsError> {
        self.ensure_user(&session.user_id)?;
        let snapshot = self.ledger.load(&session.user_id)?;

        let recomputed = ledger_sum(&snapshot.history);
        if recomputed != snapshot.total_points as i64 {
            error!(
                user = %session.user_id,
                cached = snapshot.total_points,
                recomputed,
                "points total diverges from transaction log"
            );
            return Err(PointsError::Consistency {
                user_id: session.user_id.clone(),
                cached: snapshot.total_points,
                recomputed,
            });
        }

        let progress = progress_for(snapshot.total_points);
        Ok(UserPoints {
            user_id: session.user_id.clone(),
            total_points: snapshot.total_points,
            available_points: snapshot.total_points,
            level: progress.current.level,
            level_name: progress.current.name,
            level_color: progress.current.color,
            next_level_points: progress.next_level_points,
            progress_percent: progress.progress_percent,
            points_history: snapshot.history,
        })
    }

    fn append(
        &self,
        session: &Session,
        request: PointsRequest,
        kind: TransactionKind,
        guard: AppendGuard,
        at: DateTime<Utc>,
    ) -> Result<PointsTransaction, PointsError> {
        if request.amount <= 0 {
            return Err(PointsError::InvalidAmount(request.amount));
        }
        let amount = u32::try_from(request.amount)
            .map_err(|_| PointsError::AmountTooLarge(request.amount))?;
        self.ensure_user(&session.user_id)?;

        let description = if request.description.trim().is_empty() {
            request.reason_code.label().to_string()
        } else {
            request.description
        };

        let entry = LedgerEntry {
            transaction: PointsTransaction {
                id: next_transaction_id(),
                kind,
                amount,
                reason_code: request.reason_code,
                description,
                date: at,
            },
            guard,
        };

        match self.ledger.append(&session.user_id, entry)? {
            LedgerAppend::Appended(transaction) => {
                info!(
                    user = %session.user_id,
                    reason = transaction.reason_code.label(),
                    amount = transaction.amount,
                    kind = ?transaction.kind,
                    "points transaction recorded"
                );
                Ok(transaction)
            }
            LedgerAppend::Duplicate(original) => {
                info!(
                    user = %session.user_id,
                    reason = original.reason_code.label(),
                    "one-time bonus already awarded"
                );
                Ok(original)
            }
            LedgerAppend::InsufficientBalance { available } => {
                Err(PointsError::InsufficientPoints {
                    requested: amount,
                    available,
                })
            }
        }
    }

    fn ensure_user(&self, user_id: &UserId) -> Result<(), PointsError> {
        match self.profiles.fetch_profile(user_id)? {
            Some(_) => Ok(()),
            None => Err(PointsError::UnknownUser(user_id.clone())),
        }
    }
}

/// Error raised by the points engine.
#[derive(Debug, thiserror::Error)]
pub enum PointsError {
    #[error("points amount must be a positive integer (found {0})")]
    InvalidAmount(i64),
    #[error("points amount {0} exceeds the per-transaction maximum of {max}", max = u32::MAX)]
    AmountTooLarge(i64),
    #[error("reason code {} cannot be used for this operation", .0.label())]
    WrongDirection(ReasonCode),
    #[error("insufficient points: requested {requested}, available {available}")]
    InsufficientPoints { requested: u32, available: u64 },
    #[error("user {0} does not exist")]
    UnknownUser(UserId),
    #[error("points total for {user_id} is {cached} but transactions sum to {recomputed}")]
    Consistency {
        user_id: UserId,
        cached: u64,
        recomputed: i64,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl PointsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PointsError::InvalidAmount(_)
            | PointsError::AmountTooLarge(_)
            | PointsError::WrongDirection(_)
            | PointsError::InsufficientPoints { .. } => ErrorKind::Validation,
            PointsError::UnknownUser(_) => ErrorKind::NotFound,
            PointsError::Consistency { .. } => ErrorKind::Consistency,
            PointsError::Repository(error) => error.kind(),
        }
    }
}
