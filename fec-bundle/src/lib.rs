//! fec-bundle: warehouse tables → site JSON bundles
//!
//! Derives shares, `pac_pct`, burn rate and badges from committee metrics,
//! rolls committees up per candidate (share-of-sum), and writes
//! `committees.json`, `candidates.json`, per-candidate detail files and a
//! manifest whose `build_id` identifies the content.

pub mod badges;
pub mod builder;
pub mod candidates;
pub mod committees;
pub mod details;
pub mod format;
pub mod shares;
pub mod summary;

pub use badges::{evaluate, Badge, BadgeInput};
pub use builder::{BundleBuilder, Manifest};
pub use candidates::{build_candidates, CandidateBundle, CandidateIndex, OutsideSpendTotals};
pub use committees::{build_committees, CommitteeBundle};
pub use details::CandidateDetails;
pub use shares::{pac_pct, share, BurnRate, Shares};
pub use summary::FinanceSummary;
