use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Lifecycle state of an advertisement.
///
/// Any state may move to any other; only entering `Open` is gated by the
/// per-user quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdStatus {
    #[default]
    Open,
    Closed,
    Draft,
}

impl AdStatus {
    pub const ALL: [AdStatus; 3] = [AdStatus::Open, AdStatus::Closed, AdStatus::Draft];

    pub const fn as_str(self) -> &'static str {
        match self {
            AdStatus::Open => "OPEN",
            AdStatus::Closed => "CLOSED",
            AdStatus::Draft => "DRAFT",
        }
    }

    pub fn is_open(self) -> bool {
        self == AdStatus::Open
    }
}

impl fmt::Display for AdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status string is not one of the known choices.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid status, expected one of OPEN, CLOSED, DRAFT")]
pub struct ParseStatusError(pub String);

impl FromStr for AdStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// Advertisement entity - a listing owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertisement {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: AdStatus,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Advertisement {
    /// Create a new advertisement owned by `creator_id`.
    pub fn new(creator_id: Uuid, draft: NewAdvertisement) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: draft.target_status(),
            title: draft.title,
            description: draft.description,
            creator_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.creator_id == user_id
    }

    /// Apply submitted changes. The creator and `created_at` never change.
    pub fn apply(&mut self, changes: AdvertisementChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
    }
}

/// Fields submitted when creating an advertisement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewAdvertisement {
    pub title: String,
    pub description: String,
    pub status: Option<AdStatus>,
}

impl NewAdvertisement {
    /// Status the record will have once stored; `Open` unless requested otherwise.
    pub fn target_status(&self) -> AdStatus {
        self.status.unwrap_or_default()
    }

    pub fn validate(mut self) -> Result<Self, DomainError> {
        self.title = normalize_title(self.title)?;
        Ok(self)
    }
}

/// Fields submitted when updating an advertisement. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvertisementChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<AdStatus>,
}

impl AdvertisementChanges {
    pub fn validate(mut self) -> Result<Self, DomainError> {
        self.title = self.title.map(normalize_title).transpose()?;
        Ok(self)
    }
}

fn normalize_title(title: String) -> Result<String, DomainError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(
            "title: this field may not be blank".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parses_upper_case_names_only() {
        assert_eq!("OPEN".parse::<AdStatus>(), Ok(AdStatus::Open));
        assert_eq!("DRAFT".parse::<AdStatus>(), Ok(AdStatus::Draft));
        assert_eq!("CLOSED".parse::<AdStatus>(), Ok(AdStatus::Closed));
        assert!("open".parse::<AdStatus>().is_err());
        assert!("ARCHIVED".parse::<AdStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_as_upper_case() {
        let json = serde_json::to_string(&AdStatus::Draft).unwrap();
        assert_eq!(json, "\"DRAFT\"");
    }

    #[test]
    fn test_new_advertisement_defaults_to_open() {
        let ad = Advertisement::new(
            Uuid::new_v4(),
            NewAdvertisement {
                title: "Bike".to_string(),
                ..Default::default()
            },
        );

        assert_eq!(ad.status, AdStatus::Open);
        assert_eq!(ad.description, "");
        assert_eq!(ad.created_at, ad.updated_at);
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let draft = NewAdvertisement {
            title: "   ".to_string(),
            ..Default::default()
        };

        assert!(matches!(draft.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_title_is_trimmed() {
        let changes = AdvertisementChanges {
            title: Some("  Sofa  ".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert_eq!(changes.title.as_deref(), Some("Sofa"));
    }

    #[test]
    fn test_apply_keeps_creator_and_untouched_fields() {
        let creator = Uuid::new_v4();
        let mut ad = Advertisement::new(
            creator,
            NewAdvertisement {
                title: "Lamp".to_string(),
                description: "Brass".to_string(),
                status: Some(AdStatus::Draft),
            },
        );
        let created_at = ad.created_at;

        ad.apply(AdvertisementChanges {
            status: Some(AdStatus::Closed),
            ..Default::default()
        });

        assert_eq!(ad.creator_id, creator);
        assert_eq!(ad.title, "Lamp");
        assert_eq!(ad.description, "Brass");
        assert_eq!(ad.status, AdStatus::Closed);
        assert_eq!(ad.created_at, created_at);
        assert!(ad.updated_at >= created_at);
    }
}
