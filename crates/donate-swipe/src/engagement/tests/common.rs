use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::config::FeedConfig;
use crate::engagement::domain::{
    DonationRequest, DonationRequestId, InteractionEvent, RequestDetails, RequestStatus, Urgency,
    UserId, UserProfile,
};
use crate::engagement::points::{LedgerAppend, LedgerEntry, LedgerSnapshot};
use crate::engagement::recommendations::ScoringWeights;
use crate::engagement::repository::{
    CandidateFilter, DonationRequestCatalog, InteractionLog, PointsLedger, ProfileDirectory,
    RepositoryError,
};
use crate::engagement::Engagement;
use crate::session::Session;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub(super) fn session(user: &str) -> Session {
    Session::new(user, format!("token-{user}"))
}

pub(super) fn request(
    id: &str,
    category: &str,
    urgency: Urgency,
    current_amount: f64,
    target_amount: f64,
) -> DonationRequest {
    DonationRequest {
        id: DonationRequestId(id.to_string()),
        title: format!("{category} request {id}"),
        category: category.to_string(),
        current_amount,
        target_amount,
        urgency,
        created_at: now() - Duration::days(2),
        expires_at: None,
        supporters: 0,
        status: RequestStatus::Approved,
        details: RequestDetails::Money {
            currency: "USD".to_string(),
        },
    }
}

pub(super) fn profile(user: &str) -> UserProfile {
    UserProfile::new(UserId(user.to_string()))
}

pub(super) fn feed_config() -> FeedConfig {
    FeedConfig {
        weights: ScoringWeights::default(),
        default_limit: 20,
    }
}

pub(super) type MemoryEngagement = Engagement<MemoryCatalog, MemoryProfiles, MemoryLog, MemoryLedger>;

pub(super) struct Fixture {
    pub(super) engagement: MemoryEngagement,
    pub(super) catalog: Arc<MemoryCatalog>,
    pub(super) log: Arc<MemoryLog>,
    pub(super) ledger: Arc<MemoryLedger>,
}

pub(super) fn fixture(requests: Vec<DonationRequest>, profiles: Vec<UserProfile>) -> Fixture {
    let catalog = Arc::new(MemoryCatalog::with(requests));
    let profiles = Arc::new(MemoryProfiles::with(profiles));
    let log = Arc::new(MemoryLog::default());
    let ledger = Arc::new(MemoryLedger::default());
    let engagement = Engagement::new(
        catalog.clone(),
        profiles,
        log.clone(),
        ledger.clone(),
        &feed_config(),
    );

    Fixture {
        engagement,
        catalog,
        log,
        ledger,
    }
}

#[derive(Default)]
pub(super) struct MemoryCatalog {
    requests: Mutex<Vec<DonationRequest>>,
}

impl MemoryCatalog {
    pub(super) fn with(requests: Vec<DonationRequest>) -> Self {
        Self {
            requests: Mutex::new(requests),
        }
    }

    pub(super) fn set_status(&self, id: &str, status: RequestStatus) {
        let mut guard = self.requests.lock().expect("catalog mutex poisoned");
        for request in guard.iter_mut().filter(|request| request.id.0 == id) {
            request.status = status;
        }
    }
}

impl DonationRequestCatalog for MemoryCatalog {
    fn candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<DonationRequest>, RepositoryError> {
        let guard = self.requests.lock().expect("catalog mutex poisoned");
        Ok(guard
            .iter()
            .filter(|request| filter.admits(request))
            .cloned()
            .collect())
    }

    fn fetch_request(
        &self,
        id: &DonationRequestId,
    ) -> Result<Option<DonationRequest>, RepositoryError> {
        let guard = self.requests.lock().expect("catalog mutex poisoned");
        Ok(guard.iter().find(|request| &request.id == id).cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryProfiles {
    profiles: HashMap<UserId, UserProfile>,
}

impl MemoryProfiles {
    pub(super) fn with(profiles: Vec<UserProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|profile| (profile.user_id.clone(), profile))
                .collect(),
        }
    }
}

impl ProfileDirectory for MemoryProfiles {
    fn fetch_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self.profiles.get(user_id).cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryLog {
    events: Mutex<Vec<InteractionEvent>>,
}

impl MemoryLog {
    pub(super) fn len(&self) -> usize {
        self.events.lock().expect("log mutex poisoned").len()
    }

    pub(super) fn seed(&self, event: InteractionEvent) {
        self.events.lock().expect("log mutex poisoned").push(event);
    }
}

impl InteractionLog for MemoryLog {
    fn append(&self, event: InteractionEvent) -> Result<InteractionEvent, RepositoryError> {
        self.events
            .lock()
            .expect("log mutex poisoned")
            .push(event.clone());
        Ok(event)
    }

    fn for_user(&self, user_id: &UserId) -> Result<Vec<InteractionEvent>, RepositoryError> {
        let guard = self.events.lock().expect("log mutex poisoned");
        Ok(guard
            .iter()
            .filter(|event| &event.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// Log whose reads and writes always fail.
pub(super) struct UnavailableLog;

impl InteractionLog for UnavailableLog {
    fn append(&self, _event: InteractionEvent) -> Result<InteractionEvent, RepositoryError> {
        Err(RepositoryError::Unavailable("log offline".to_string()))
    }

    fn for_user(&self, _user_id: &UserId) -> Result<Vec<InteractionEvent>, RepositoryError> {
        Err(RepositoryError::Unavailable("log offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryLedger {
    accounts: Mutex<HashMap<UserId, LedgerSnapshot>>,
}

impl MemoryLedger {
    /// Overwrite the cached total without touching the log.
    pub(super) fn corrupt_total(&self, user: &str, total_points: u64) {
        let mut guard = self.accounts.lock().expect("ledger mutex poisoned");
        guard
            .entry(UserId(user.to_string()))
            .or_default()
            .total_points = total_points;
    }
}

impl PointsLedger for MemoryLedger {
    fn append(
        &self,
        user_id: &UserId,
        entry: LedgerEntry,
    ) -> Result<LedgerAppend, RepositoryError> {
        let mut guard = self.accounts.lock().expect("ledger mutex poisoned");
        let account = guard.entry(user_id.clone()).or_default();
        if let Some(outcome) = entry.check(&account.history, account.total_points) {
            return Ok(outcome);
        }

        let total = entry
            .transaction
            .apply_to(account.total_points)
            .ok_or(RepositoryError::Conflict)?;
        account.history.push(entry.transaction.clone());
        account.total_points = total;
        Ok(LedgerAppend::Appended(entry.transaction))
    }

    fn load(&self, user_id: &UserId) -> Result<LedgerSnapshot, RepositoryError> {
        let guard = self.accounts.lock().expect("ledger mutex poisoned");
        Ok(guard.get(user_id).cloned().unwrap_or_default())
    }
}

/// Ledger that rejects every write.
pub(super) struct ReadOnlyLedger;

impl PointsLedger for ReadOnlyLedger {
    fn append(
        &self,
        _user_id: &UserId,
        _entry: LedgerEntry,
    ) -> Result<LedgerAppend, RepositoryError> {
        Err(RepositoryError::Unavailable("ledger is read only".to_string()))
    }

    fn load(&self, _user_id: &UserId) -> Result<LedgerSnapshot, RepositoryError> {
        Ok(LedgerSnapshot::default())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
