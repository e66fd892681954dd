//! Blog content service for a personal portfolio.
//!
//! Layers follow the usual split: `domain` holds pure rules, `application`
//! the services and repository contracts, `infra` the adapters (Postgres,
//! in-memory, filesystem uploads, HTTP).

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
