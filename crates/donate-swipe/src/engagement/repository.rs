use chrono::{DateTime, Utc};

use super::domain::{
    normalize_category, DonationRequest, DonationRequestId, InteractionEvent, UserId,
    UserProfile,
};
use super::error::ErrorKind;
use super::points::{LedgerAppend, LedgerEntry, LedgerSnapshot};

/// Narrows the candidate pool handed to the scorer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFilter {
    pub category: Option<String>,
    /// When set, requests that expired before this instant are left out of the pool.
    pub expires_after: Option<DateTime<Utc>>,
}

impl CandidateFilter {
    /// Catalog-side eligibility: approved requests only, optionally one category.
    pub fn admits(&self, request: &DonationRequest) -> bool {
        if !request.status.is_listable() {
            return false;
        }
        if let (Some(cutoff), Some(expires_at)) = (self.expires_after, request.expires_at) {
            if expires_at < cutoff {
                return false;
            }
        }
        match &self.category {
            Some(category) => normalize_category(category) == request.category_key(),
            None => true,
        }
    }
}

/// Source of donation requests, owned by the host application.
pub trait DonationRequestCatalog: Send + Sync {
    fn candidates(&self, filter: &CandidateFilter)
        -> Result<Vec<DonationRequest>, RepositoryError>;
    fn fetch_request(
        &self,
        id: &DonationRequestId,
    ) -> Result<Option<DonationRequest>, RepositoryError>;
}

/// Declared-interest lookup. A missing profile means the user does not exist.
pub trait ProfileDirectory: Send + Sync {
    fn fetch_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, RepositoryError>;
}

/// Append-only interaction storage. `for_user` must return events in append order.
pub trait InteractionLog: Send + Sync {
    fn append(&self, event: InteractionEvent) -> Result<InteractionEvent, RepositoryError>;
    fn for_user(&self, user_id: &UserId) -> Result<Vec<InteractionEvent>, RepositoryError>;
}

/// Points transaction log with a materialized running total.
///
/// Implementations must evaluate the entry's guard, append the transaction, and bump the cached
/// total inside one critical section so a failed write never leaves a partial update behind.
pub trait PointsLedger: Send + Sync {
    fn append(&self, user_id: &UserId, entry: LedgerEntry)
        -> Result<LedgerAppend, RepositoryError>;
    fn load(&self, user_id: &UserId) -> Result<LedgerSnapshot, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepositoryError::Conflict => ErrorKind::Consistency,
            RepositoryError::NotFound => ErrorKind::NotFound,
            RepositoryError::Unavailable(_) => ErrorKind::Unavailable,
        }
    }
}
