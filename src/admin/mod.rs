//! Privileged ingestion entry points
//!
//! `AdminTrigger` is the only way to start a crawl or write media records
//! by hand. It is constructed with an explicit `AdminToken` capability;
//! `routes` exposes it over HTTP.

mod auth;
pub mod routes;
mod trigger;

pub use auth::{AdminToken, AuthError};
pub use routes::router;
pub use trigger::{AdminTrigger, ManualEntry};
