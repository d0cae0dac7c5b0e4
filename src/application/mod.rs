//! Application services orchestrating domain logic and persistence.

pub mod error;
pub mod pagination;
pub mod repos;
pub mod stories;
pub mod topics;
