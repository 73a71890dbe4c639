//! fec-warehouse: raw partition → normalized tables and committee metrics
//!
//! Reads the newest usable raw partition, de-duplicates records by natural
//! key, writes dimension/fact tables to `data/warehouse/`, and computes one
//! `CommitteeMetric` per committee and cycle. All sums are in dollars;
//! shares and badges are left to the bundle stage.

pub mod builder;
pub mod classify;
pub mod metrics;
pub mod partition;
pub mod records;
pub mod tables;

pub use builder::{BuildSummary, WarehouseBuilder};
pub use classify::{classify, IndustryTag};
pub use metrics::{CommitteeMetric, DonorTotal, MetricTotals};
pub use partition::select_partition;
pub use tables::WarehouseTables;
