//! SeaORM entities.

pub mod advertisement;
pub mod user;
