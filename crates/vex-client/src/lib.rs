//! vex-client — access to the Versa Analytics REST API.
//!
//! The collector only sees the [`AnalyticsClient`] trait. The
//! reqwest-backed [`HttpAnalyticsClient`] is the production
//! implementation; tests substitute in-memory clients.
//!
//! # Session model
//!
//! ```text
//! login()         POST /versa/login          → session cookie in the jar
//! list_tenants()  GET  .../features/SDWAN/tenants
//! fetch()         GET  .../tenants/{t}/features/{SDWAN/|SYSTEM}?{query}
//! ```

pub mod client;
pub mod http;

pub use client::AnalyticsClient;
pub use http::HttpAnalyticsClient;
