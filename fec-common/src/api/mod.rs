//! FEC REST API access
//!
//! - `client`: rate-limited HTTP client with 429/timeout backoff
//! - `pagination`: offset and keyset page walkers with per-entity caps
//! - `types`: response envelope shared by every endpoint

pub mod client;
pub mod pagination;
pub mod types;


pub use client::{EndpointCost, FecClient, FecError, RequestPolicy};
pub use pagination::{collect_keyset, collect_offset, PageLimits, PageSink, PageStats};
pub use types::{Envelope, KeysetCursor, PageInfo};

/// Production API base URL
pub const FEC_API_BASE: &str = "https://api.open.fec.gov/v1";
