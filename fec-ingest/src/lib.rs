//! fec-ingest: FEC API → dated raw NDJSON partitions
//!
//! For every configured cycle and target, walks the enabled sources and
//! appends each fetched page to `data/raw/<YYYY-MM-DD>/`. Per-entity failures
//! become skips; configuration and output I/O failures end the run.

pub mod ingester;
pub mod plan;
pub mod report;
pub mod sink;

pub use ingester::Ingester;
pub use plan::{IngestPlan, LinkMode};
pub use report::{EntitySkip, IngestReport, Truncation};
pub use sink::PartitionSink;
