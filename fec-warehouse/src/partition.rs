//! Raw partition selection

use chrono::NaiveDate;
use tracing::{info, warn};

use fec_common::layout::{DataLayout, Partition};
use fec_common::Result;

/// Newest complete non-empty partition, else newest non-empty one, else a
/// freshly created empty partition for `today`
///
/// A cold start (no raw data at all) yields an empty partition rather than an
/// error so the downstream stages still produce empty tables.
pub fn select_partition(layout: &DataLayout, today: NaiveDate) -> Result<Partition> {
    let partitions = layout.partitions()?;

    let mut newest_non_empty: Option<&Partition> = None;
    for partition in partitions.iter().rev() {
        if partition.is_empty()? {
            continue;
        }
        if partition.is_complete() {
            info!(partition = %partition.path.display(), "Using newest complete partition");
            return Ok(partition.clone());
        }
        if newest_non_empty.is_none() {
            newest_non_empty = Some(partition);
        }
    }

    if let Some(partition) = newest_non_empty {
        warn!(
            partition = %partition.path.display(),
            "No complete partition; using newest non-empty one"
        );
        return Ok(partition.clone());
    }

    let empty = layout.partition(today);
    empty.ensure_exists()?;
    warn!(partition = %empty.path.display(), "No raw data found; building from an empty partition");
    Ok(empty)
}
