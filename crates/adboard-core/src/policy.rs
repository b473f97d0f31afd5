//! Quota and visibility rules for advertisements.

use uuid::Uuid;

use crate::domain::{AdStatus, Advertisement, Requester};
use crate::error::DomainError;

/// Which advertisements a requester may read.
///
/// Applied before, and combined with AND, any explicit list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// `status = OPEN`
    OpenOnly,
    /// `status = OPEN OR creator = user`
    OpenOrOwnedBy(Uuid),
}

impl Visibility {
    pub fn for_requester(requester: Requester) -> Self {
        match requester {
            Requester::Anonymous => Visibility::OpenOnly,
            Requester::User(id) => Visibility::OpenOrOwnedBy(id),
        }
    }

    pub fn admits(&self, ad: &Advertisement) -> bool {
        match self {
            Visibility::OpenOnly => ad.status.is_open(),
            Visibility::OpenOrOwnedBy(user_id) => ad.status.is_open() || ad.is_owned_by(*user_id),
        }
    }
}

/// Upper bound on how many advertisements one user may keep open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenQuota {
    limit: u64,
}

impl OpenQuota {
    pub const fn new(limit: u64) -> Self {
        Self { limit }
    }

    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Only a write whose target status is `Open` is counted. An update that
    /// does not submit a status passes `None` and is never counted.
    pub fn applies_to(target: Option<AdStatus>) -> bool {
        target.is_some_and(AdStatus::is_open)
    }

    /// Decide given how many advertisements the requester already has open.
    pub fn check(&self, open_count: u64) -> Result<(), DomainError> {
        if open_count >= self.limit {
            return Err(DomainError::OpenQuotaExceeded { limit: self.limit });
        }
        Ok(())
    }
}
