//! Listing inputs: who is asking, which records they narrowed to, and which page.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{AdStatus, Advertisement};

/// Identity behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    Anonymous,
    User(Uuid),
}

impl From<Option<Uuid>> for Requester {
    fn from(user_id: Option<Uuid>) -> Self {
        user_id.map_or(Requester::Anonymous, Requester::User)
    }
}

/// Explicit list filters. Every populated field must match; bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvertisementFilter {
    pub status: Option<AdStatus>,
    pub creator: Option<Uuid>,
    pub created_at_after: Option<DateTime<Utc>>,
    pub created_at_before: Option<DateTime<Utc>>,
}

impl AdvertisementFilter {
    pub fn matches(&self, ad: &Advertisement) -> bool {
        self.status.is_none_or(|status| ad.status == status)
            && self.creator.is_none_or(|creator| ad.creator_id == creator)
            && self.created_at_after.is_none_or(|after| ad.created_at >= after)
            && self.created_at_before.is_none_or(|before| ad.created_at <= before)
    }
}

/// Limit/offset window over a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Page {
    pub const DEFAULT_LIMIT: u64 = 100;
    pub const MAX_LIMIT: u64 = 1000;

    /// Build a page, clamping the limit into `1..=MAX_LIMIT`.
    pub fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self {
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}
