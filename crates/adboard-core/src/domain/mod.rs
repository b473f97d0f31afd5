//! Domain entities - the core business objects.

mod advertisement;
mod filter;
mod user;

pub use advertisement::{
    AdStatus, Advertisement, AdvertisementChanges, NewAdvertisement, ParseStatusError,
};
pub use filter::{AdvertisementFilter, Page, Requester};
pub use user::User;
