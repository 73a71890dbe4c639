//! fec-resolve: candidate search → committee IDs
//!
//! Searches `/candidates/search/` by office, state, district or name for one
//! cycle, looks up each candidate's committees, and optionally merges the
//! result into the target config.

pub mod resolver;

pub use fec_common::designation::{classify_designation, CommitteeRole};
pub use resolver::{merge_into, resolve, CommitteeSummary, Office, ResolveQuery, ResolvedCandidate};
