//! bw_routing — Burrow Console subdomain-aware routing
//!
//! Burrow services share one base domain and live on sibling subdomains
//! (`auth.example.com`, `admin.example.com`, ...). The router owns the current
//! page, query parameters and base domain for one browsing context, and knows
//! when a navigation stays inside the current service (history push, in-place
//! state update) versus when it crosses to a sibling service (full location
//! replace — the running app cannot render another service's views).
//!
//! # Modules
//! - `domain` — host → base domain / service label resolution, local-mode detection
//! - `page`   — closed set of routable pages + static (service, path) table
//! - `query`  — query string encode/decode
//! - `router` — the state machine itself + return-URI validation
//! - `error`  — unified error type

pub mod domain;
pub mod error;
pub mod page;
pub mod query;
pub mod router;

pub use error::RoutingError;
pub use page::Page;
pub use query::QueryParams;
pub use router::{HistorySink, Location, Router, RouterState};
