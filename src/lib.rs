//! Chronicle: paginated stories and topics over HTTP, backed by Postgres with a
//! Redis response cache.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
