use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for authenticated users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for donation requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DonationRequestId(pub String);

/// Identifier assigned to every appended interaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DonationRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Entities that can receive interactions. Only donation requests are tracked today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    DonationRequest,
}

impl EntityType {
    pub const fn label(self) -> &'static str {
        match self {
            EntityType::DonationRequest => "DonationRequest",
        }
    }
}

impl FromStr for EntityType {
    type Err = DomainParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "DonationRequest" => Ok(EntityType::DonationRequest),
            other => Err(DomainParseError::EntityType(other.to_string())),
        }
    }
}

/// Swipe-card actions captured by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionType {
    View,
    Favorite,
    Skip,
    Share,
}

impl InteractionType {
    pub const ALL: [InteractionType; 4] = [
        InteractionType::View,
        InteractionType::Favorite,
        InteractionType::Skip,
        InteractionType::Share,
    ];

    /// Engagement weight recorded alongside every event of this type.
    pub const fn weight(self) -> u8 {
        match self {
            InteractionType::View => 1,
            InteractionType::Skip => 0,
            InteractionType::Favorite => 2,
            InteractionType::Share => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            InteractionType::View => "VIEW",
            InteractionType::Favorite => "FAVORITE",
            InteractionType::Skip => "SKIP",
            InteractionType::Share => "SHARE",
        }
    }
}

impl FromStr for InteractionType {
    type Err = DomainParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        InteractionType::ALL
            .into_iter()
            .find(|kind| kind.label() == normalized)
            .ok_or_else(|| DomainParseError::InteractionType(value.trim().to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainParseError {
    #[error("unsupported entity type '{0}'")]
    EntityType(String),
    #[error("unknown interaction type '{0}'")]
    InteractionType(String),
    #[error("unknown urgency '{0}'")]
    Urgency(String),
}

/// Immutable log entry. The weight is derived from the interaction type at construction and
/// cannot be supplied separately.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionEvent {
    pub event_id: EventId,
    pub user_id: UserId,
    pub entity_type: EntityType,
    pub entity_id: DonationRequestId,
    pub interaction_type: InteractionType,
    interaction_value: u8,
    pub recorded_at: DateTime<Utc>,
}

impl InteractionEvent {
    pub fn new(
        event_id: EventId,
        user_id: UserId,
        entity_id: DonationRequestId,
        interaction_type: InteractionType,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id,
            user_id,
            entity_type: EntityType::DonationRequest,
            entity_id,
            interaction_type,
            interaction_value: interaction_type.weight(),
            recorded_at,
        }
    }

    pub fn interaction_value(&self) -> u8 {
        self.interaction_value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub const fn label(self) -> &'static str {
        match self {
            Urgency::Low => "LOW",
            Urgency::Medium => "MEDIUM",
            Urgency::High => "HIGH",
        }
    }
}

impl FromStr for Urgency {
    type Err = DomainParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Urgency::Low),
            "MEDIUM" => Ok(Urgency::Medium),
            "HIGH" => Ok(Urgency::High),
            _ => Err(DomainParseError::Urgency(value.trim().to_string())),
        }
    }
}

/// Moderation lifecycle of a donation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Completed,
    Rejected,
    Deleted,
}

impl RequestStatus {
    /// Whether the request may appear in a donor's feed.
    pub const fn is_listable(self) -> bool {
        matches!(self, RequestStatus::Approved)
    }

    pub const fn is_deleted(self) -> bool {
        matches!(self, RequestStatus::Deleted)
    }
}

/// A single physical item an organizer is collecting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemNeed {
    pub name: String,
    pub quantity_needed: u32,
    #[serde(default)]
    pub quantity_pledged: u32,
}

/// Type-specific payload of a donation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestDetails {
    Money {
        currency: String,
    },
    Items {
        items: Vec<ItemNeed>,
    },
    Volunteer {
        hours_needed: u32,
        #[serde(default)]
        skills: Vec<String>,
        #[serde(default)]
        location: Option<String>,
    },
}

impl RequestDetails {
    pub const fn kind_label(&self) -> &'static str {
        match self {
            RequestDetails::Money { .. } => "money",
            RequestDetails::Items { .. } => "items",
            RequestDetails::Volunteer { .. } => "volunteer",
        }
    }
}

/// Scoring view of a donation request as supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationRequest {
    pub id: DonationRequestId,
    pub title: String,
    pub category: String,
    pub current_amount: f64,
    pub target_amount: f64,
    pub urgency: Urgency,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub supporters: u32,
    pub status: RequestStatus,
    pub details: RequestDetails,
}

impl DonationRequest {
    pub fn category_key(&self) -> String {
        normalize_category(&self.category)
    }
}

/// Declared interests collected during onboarding and profile edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    #[serde(default)]
    pub preferred_categories: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl UserProfile {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            preferred_categories: Vec::new(),
            interests: Vec::new(),
        }
    }

    pub fn declares(&self, category_key: &str) -> bool {
        self.preferred_categories
            .iter()
            .chain(self.interests.iter())
            .any(|declared| normalize_category(declared) == category_key)
    }

    pub fn has_declared_interests(&self) -> bool {
        !(self.preferred_categories.is_empty() && self.interests.is_empty())
    }
}

/// Categories are compared case-insensitively and ignore surrounding whitespace.
pub fn normalize_category(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn weights_match_interaction_contract() {
        let weights: Vec<(InteractionType, u8)> = InteractionType::ALL
            .into_iter()
            .map(|kind| (kind, kind.weight()))
            .collect();

        assert_eq!(
            weights,
            vec![
                (InteractionType::View, 1),
                (InteractionType::Favorite, 2),
                (InteractionType::Skip, 0),
                (InteractionType::Share, 3),
            ]
        );
    }

    #[test]
    fn events_derive_value_from_type() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        for kind in InteractionType::ALL {
            let event = InteractionEvent::new(
                EventId("evt-1".to_string()),
                UserId("donor-1".to_string()),
                DonationRequestId("req-1".to_string()),
                kind,
                at,
            );
            assert_eq!(event.interaction_value(), kind.weight());
            assert_eq!(event.entity_type, EntityType::DonationRequest);
        }
    }

    #[test]
    fn interaction_type_parses_case_insensitively() {
        assert_eq!(
            " favorite ".parse::<InteractionType>(),
            Ok(InteractionType::Favorite)
        );
        assert_eq!(
            "LIKE".parse::<InteractionType>(),
            Err(DomainParseError::InteractionType("LIKE".to_string()))
        );
    }

    #[test]
    fn entity_type_rejects_other_entities() {
        assert!("Campaign".parse::<EntityType>().is_err());
        assert_eq!(
            "DonationRequest".parse::<EntityType>(),
            Ok(EntityType::DonationRequest)
        );
    }

    #[test]
    fn profile_matches_categories_loosely() {
        let profile = UserProfile {
            user_id: UserId("donor-1".to_string()),
            preferred_categories: vec!["Medical".to_string()],
            interests: vec![" animals ".to_string()],
        };

        assert!(profile.declares("medical"));
        assert!(profile.declares("animals"));
        assert!(!profile.declares("education"));
    }

    #[test]
    fn details_serialize_with_kind_tag() {
        let details = RequestDetails::Volunteer {
            hours_needed: 12,
            skills: vec!["driving".to_string()],
            location: None,
        };
        let value = serde_json::to_value(&details).expect("serializes");
        assert_eq!(value["kind"], "volunteer");
        assert_eq!(value["hours_needed"], 12);
    }
}
