use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{
    DomainParseError, DonationRequestId, EntityType, EventId, InteractionEvent, InteractionType,
    UserId,
};
use super::error::ErrorKind;
use super::repository::{
    DonationRequestCatalog, InteractionLog, ProfileDirectory, RepositoryError,
};
use crate::session::Session;

/// Raw interaction payload as posted by the swipe client. Kinds stay textual until validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionSubmission {
    pub entity_type: String,
    pub entity_id: DonationRequestId,
    pub interaction_type: String,
}

impl InteractionSubmission {
    pub fn new(entity_id: &str, interaction_type: InteractionType) -> Self {
        Self {
            entity_type: EntityType::DonationRequest.label().to_string(),
            entity_id: DonationRequestId(entity_id.to_string()),
            interaction_type: interaction_type.label().to_string(),
        }
    }
}

static EVENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_event_id() -> EventId {
    let id = EVENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EventId(format!("evt-{id:08}"))
}

/// Validates interactions and appends them to the log.
pub struct InteractionRecorder<C, P, L> {
    catalog: Arc<C>,
    profiles: Arc<P>,
    log: Arc<L>,
}

impl<C, P, L> InteractionRecorder<C, P, L>
where
    C: DonationRequestCatalog + 'static,
    P: ProfileDirectory + 'static,
    L: InteractionLog + 'static,
{
    pub fn new(catalog: Arc<C>, profiles: Arc<P>, log: Arc<L>) -> Self {
        Self {
            catalog,
            profiles,
            log,
        }
    }

    /// Append one event for the session user. Every call appends; repeats are never merged.
    pub fn record(
        &self,
        session: &Session,
        submission: InteractionSubmission,
        at: DateTime<Utc>,
    ) -> Result<InteractionEvent, InteractionError> {
        let result = self.try_record(session, submission, at);
        if let Err(error) = &result {
            warn!(user = %session.user_id, %error, "interaction was not recorded");
        }
        result
    }

    fn try_record(
        &self,
        session: &Session,
        submission: InteractionSubmission,
        at: DateTime<Utc>,
    ) -> Result<InteractionEvent, InteractionError> {
        submission.entity_type.parse::<EntityType>()?;
        let interaction_type = submission.interaction_type.parse::<InteractionType>()?;

        if self.profiles.fetch_profile(&session.user_id)?.is_none() {
            return Err(InteractionError::UnknownUser(session.user_id.clone()));
        }

        match self.catalog.fetch_request(&submission.entity_id)? {
            Some(request) if !request.status.is_deleted() => {}
            _ => return Err(InteractionError::UnknownRequest(submission.entity_id)),
        }

        let event = InteractionEvent::new(
            next_event_id(),
            session.user_id.clone(),
            submission.entity_id,
            interaction_type,
            at,
        );
        let stored = self.log.append(event)?;

        debug!(
            user = %stored.user_id,
            request = %stored.entity_id,
            interaction = stored.interaction_type.label(),
            "interaction recorded"
        );
        Ok(stored)
    }

    /// The caller's own events in the order they were recorded.
    pub fn history(&self, session: &Session) -> Result<Vec<InteractionEvent>, InteractionError> {
        Ok(self.log.for_user(&session.user_id)?)
    }
}

/// Error raised by the interaction recorder.
#[derive(Debug, thiserror::Error)]
pub enum InteractionError {
    #[error(transparent)]
    Invalid(#[from] DomainParseError),
    #[error("user {0} does not exist")]
    UnknownUser(UserId),
    #[error("donation request {0} does not exist")]
    UnknownRequest(DonationRequestId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl InteractionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InteractionError::Invalid(_) => ErrorKind::Validation,
            InteractionError::UnknownUser(_) | InteractionError::UnknownRequest(_) => {
                ErrorKind::NotFound
            }
            InteractionError::Repository(error) => error.kind(),
        }
    }
}
