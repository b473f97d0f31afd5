//! # Adboard Core
//!
//! The domain layer of the Adboard backend.
//! This crate contains the advertisement model, the quota and visibility
//! rules, and the ports infrastructure must implement. It has zero
//! infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod policy;
pub mod ports;
pub mod service;

pub use error::DomainError;
pub use service::AdvertisementService;
