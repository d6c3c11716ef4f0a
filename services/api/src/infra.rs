use chrono::{DateTime, Duration, Utc};
use donate_swipe::catalog::CatalogImporter;
use donate_swipe::error::AppError;
use donate_swipe::engagement::points::{LedgerAppend, LedgerEntry, LedgerSnapshot};
use donate_swipe::engagement::{
    CandidateFilter, DonationRequest, DonationRequestCatalog, DonationRequestId, InteractionEvent,
    InteractionLog, ItemNeed, PointsLedger, ProfileDirectory, RepositoryError, RequestDetails,
    RequestStatus, Urgency, UserId, UserProfile,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, RwLock};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryCatalog {
    requests: Arc<RwLock<Vec<DonationRequest>>>,
}

impl InMemoryCatalog {
    pub(crate) fn new(requests: Vec<DonationRequest>) -> Self {
        Self {
            requests: Arc::new(RwLock::new(requests)),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.requests.read().map(|guard| guard.len()).unwrap_or(0)
    }
}

impl DonationRequestCatalog for InMemoryCatalog {
    fn candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<DonationRequest>, RepositoryError> {
        let guard = self
            .requests
            .read()
            .map_err(|_| RepositoryError::Unavailable("catalog lock poisoned".to_string()))?;
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
        let guard = self
            .requests
            .read()
            .map_err(|_| RepositoryError::Unavailable("catalog lock poisoned".to_string()))?;
        Ok(guard.iter().find(|request| &request.id == id).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProfiles {
    profiles: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl InMemoryProfiles {
    pub(crate) fn new(profiles: Vec<UserProfile>) -> Self {
        Self {
            profiles: Arc::new(RwLock::new(
                profiles
                    .into_iter()
                    .map(|profile| (profile.user_id.clone(), profile))
                    .collect(),
            )),
        }
    }
}

impl ProfileDirectory for InMemoryProfiles {
    fn fetch_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let guard = self
            .profiles
            .read()
            .map_err(|_| RepositoryError::Unavailable("profile lock poisoned".to_string()))?;
        Ok(guard.get(user_id).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryInteractionLog {
    events: Arc<Mutex<Vec<InteractionEvent>>>,
}

impl InteractionLog for InMemoryInteractionLog {
    fn append(&self, event: InteractionEvent) -> Result<InteractionEvent, RepositoryError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| RepositoryError::Unavailable("interaction log poisoned".to_string()))?;
        guard.push(event.clone());
        Ok(event)
    }

    fn for_user(&self, user_id: &UserId) -> Result<Vec<InteractionEvent>, RepositoryError> {
        let guard = self
            .events
            .lock()
            .map_err(|_| RepositoryError::Unavailable("interaction log poisoned".to_string()))?;
        Ok(guard
            .iter()
            .filter(|event| &event.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// Ledger keeping each user's log and cached total behind one mutex.
#[derive(Default, Clone)]
pub(crate) struct InMemoryPointsLedger {
    accounts: Arc<Mutex<HashMap<UserId, LedgerSnapshot>>>,
}

impl PointsLedger for InMemoryPointsLedger {
    fn append(
        &self,
        user_id: &UserId,
        entry: LedgerEntry,
    ) -> Result<LedgerAppend, RepositoryError> {
        let mut guard = self
            .accounts
            .lock()
            .map_err(|_| RepositoryError::Unavailable("points ledger poisoned".to_string()))?;
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
        let guard = self
            .accounts
            .lock()
            .map_err(|_| RepositoryError::Unavailable("points ledger poisoned".to_string()))?;
        Ok(guard.get(user_id).cloned().unwrap_or_default())
    }
}

/// Catalog from a CSV export when one is given, otherwise the built-in seed set.
pub(crate) fn load_catalog(
    csv_path: Option<&Path>,
    now: DateTime<Utc>,
) -> Result<InMemoryCatalog, AppError> {
    let requests = match csv_path {
        Some(path) => CatalogImporter::from_path(path)?,
        None => seed_catalog(now),
    };
    Ok(InMemoryCatalog::new(requests))
}

/// Users known to the demo deployment.
pub(crate) fn seed_profiles() -> Vec<UserProfile> {
    let mut returning = UserProfile::new(UserId("donor-1".to_string()));
    returning.preferred_categories = vec!["Medical".to_string()];
    returning.interests = vec!["Animals".to_string()];

    vec![
        returning,
        UserProfile::new(UserId("newcomer".to_string())),
    ]
}

/// Small mixed catalog used when no CSV export is supplied.
pub(crate) fn seed_catalog(now: DateTime<Utc>) -> Vec<DonationRequest> {
    vec![
        seed_request(
            "req-001",
            "Emergency surgery for Lina",
            "Medical",
            (1_200.0, 5_000.0),
            Urgency::High,
            now - Duration::days(3),
            Some(now + Duration::days(5)),
            RequestDetails::Money {
                currency: "USD".to_string(),
            },
        ),
        seed_request(
            "req-002",
            "Textbooks for rural school",
            "Education",
            (300.0, 600.0),
            Urgency::Medium,
            now - Duration::days(10),
            Some(now + Duration::days(40)),
            RequestDetails::Items {
                items: vec![ItemNeed {
                    name: "textbook".to_string(),
                    quantity_needed: 60,
                    quantity_pledged: 30,
                }],
            },
        ),
        seed_request(
            "req-003",
            "Shelter kennel repairs",
            "Animals",
            (950.0, 1_000.0),
            Urgency::Low,
            now - Duration::days(1),
            None,
            RequestDetails::Money {
                currency: "USD".to_string(),
            },
        ),
        seed_request(
            "req-004",
            "River cleanup volunteers",
            "Environment",
            (0.0, 1.0),
            Urgency::Medium,
            now - Duration::days(6),
            Some(now + Duration::days(12)),
            RequestDetails::Volunteer {
                hours_needed: 40,
                skills: vec!["lifting".to_string()],
                location: Some("Riverside park".to_string()),
            },
        ),
        seed_request(
            "req-005",
            "Winter coats drive",
            "Community",
            (2_000.0, 2_000.0),
            Urgency::High,
            now - Duration::days(20),
            Some(now + Duration::days(2)),
            RequestDetails::Money {
                currency: "USD".to_string(),
            },
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn seed_request(
    id: &str,
    title: &str,
    category: &str,
    (current_amount, target_amount): (f64, f64),
    urgency: Urgency,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    details: RequestDetails,
) -> DonationRequest {
    DonationRequest {
        id: DonationRequestId(id.to_string()),
        title: title.to_string(),
        category: category.to_string(),
        current_amount,
        target_amount,
        urgency,
        created_at,
        expires_at,
        supporters: 0,
        status: RequestStatus::Approved,
        details,
    }
}
