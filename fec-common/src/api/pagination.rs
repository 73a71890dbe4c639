//! Page walkers for the two FEC pagination styles
//!
//! Offset pagination (`page` + `per_page`) serves listings and aggregates.
//! Keyset pagination (`last_index` + `last_<field>`) serves itemized
//! schedules. Both stop at `max_pages` per call so one very large committee
//! cannot stall a run, and both hand each page to a sink as it arrives.

use serde_json::Value;

use super::client::{EndpointCost, FecClient};
use super::types::KeysetCursor;
use crate::Result;

/// Receives each fetched page
pub trait PageSink {
    fn accept(&mut self, rows: &[Value]) -> Result<()>;
}

impl PageSink for Vec<Value> {
    fn accept(&mut self, rows: &[Value]) -> Result<()> {
        self.extend_from_slice(rows);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub per_page: u32,
    pub max_pages: u32,
}

/// Outcome of one page walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageStats {
    pub pages: u32,
    pub records: usize,
    /// More pages existed but the cap stopped the walk
    pub truncated: bool,
}

fn with_param(params: &[(String, String)], key: &str, value: String) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = params
        .iter()
        .filter(|(k, _)| k != key)
        .cloned()
        .collect();
    out.push((key.to_string(), value));
    out
}

/// Walk `page=1..pages`
pub async fn collect_offset(
    client: &FecClient,
    path: &str,
    params: &[(String, String)],
    limits: PageLimits,
    sink: &mut dyn PageSink,
) -> Result<PageStats> {
    let base = with_param(params, "per_page", limits.per_page.to_string());
    let mut stats = PageStats::default();
    let mut page = 1u32;

    loop {
        let query = with_param(&base, "page", page.to_string());
        let envelope = client.get(path, &query, EndpointCost::Listing).await?;

        sink.accept(&envelope.results)?;
        stats.pages += 1;
        stats.records += envelope.results.len();

        let total_pages = envelope.total_pages();
        if page >= total_pages {
            break;
        }
        if stats.pages >= limits.max_pages {
            tracing::warn!(
                path = %path,
                fetched = stats.pages,
                available = total_pages,
                "Offset page cap reached"
            );
            stats.truncated = true;
            break;
        }
        page += 1;
    }

    Ok(stats)
}

/// Forward `last_indexes` until the API stops returning a cursor
pub async fn collect_keyset(
    client: &FecClient,
    path: &str,
    params: &[(String, String)],
    limits: PageLimits,
    sink: &mut dyn PageSink,
) -> Result<PageStats> {
    let base = with_param(params, "per_page", limits.per_page.to_string());
    let mut stats = PageStats::default();
    let mut cursor: Option<KeysetCursor> = None;

    loop {
        let mut query = base.clone();
        if let Some(c) = &cursor {
            for (k, v) in c.params() {
                query = with_param(&query, k, v.to_string());
            }
        }

        let envelope = client.get(path, &query, EndpointCost::Itemized).await?;

        sink.accept(&envelope.results)?;
        stats.pages += 1;
        stats.records += envelope.results.len();

        let next = match envelope.next_cursor() {
            Some(next) if !envelope.results.is_empty() => next,
            _ => break,
        };
        if cursor.as_ref() == Some(&next) {
            tracing::warn!(path = %path, "Keyset cursor did not advance, stopping");
            break;
        }
        if stats.pages >= limits.max_pages {
            tracing::warn!(path = %path, fetched = stats.pages, "Keyset page cap reached");
            stats.truncated = true;
            break;
        }
        cursor = Some(next);
    }

    Ok(stats)
}
