//! Middleware and extractors.

pub mod auth;
pub mod error;
pub mod throttle;
