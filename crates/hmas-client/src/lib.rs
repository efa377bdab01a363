//! # HMAS Client
//!
//! Hypermedia client for simulated HMAS environments. Everything is found by
//! following links in the served Turtle documents; only the root URL is
//! known up front.
//!
//! - [`Transport`]: one HTTP exchange (reqwest-backed, or in-memory for tests)
//! - [`HypermediaClient`]: discovery, affordance listing, property reads and
//!   action calls with bounded retry
//! - [`HypermediaClient::crawl`]: cancellable, cycle-safe traversal

mod client;
mod crawl;
mod error;
mod transport;

pub use client::{action_url, property_url, Affordance, AffordanceKind, Children, HypermediaClient};
pub use crawl::{CrawlLimits, CrawlReport};
pub use error::ClientError;
pub use transport::{HttpResponse, HttpTransport, MemoryTransport, RetryPolicy, Transport};
