//! Ingest run driver
//!
//! Per cycle: candidates first (detail check, committee links, per-cycle
//! sources), then the union of configured and linked committees. Requests are
//! strictly sequential; the client spaces them out.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use fec_common::api::{
    collect_keyset, collect_offset, EndpointCost, FecClient, FecError, PageLimits, PageSink, PageStats,
};
use fec_common::layout::{DataLayout, Partition};
use fec_common::raw::{Paging, RawSource, RecordMeta, Subject};
use fec_common::{time, Error, Result};

use crate::plan::IngestPlan;
use crate::report::{IngestReport, Truncation};
use crate::sink::PartitionSink;

pub struct Ingester<'a> {
    client: &'a FecClient,
    plan: &'a IngestPlan,
    partition: Partition,
    offset_limits: PageLimits,
    keyset_limits: PageLimits,
    /// Detail lookups already answered this run: id → exists
    known: BTreeMap<String, bool>,
}

impl<'a> Ingester<'a> {
    pub fn new(
        client: &'a FecClient,
        plan: &'a IngestPlan,
        layout: &DataLayout,
        date: NaiveDate,
        offset_limits: PageLimits,
        keyset_limits: PageLimits,
    ) -> Self {
        Self {
            client,
            plan,
            partition: layout.partition(date),
            offset_limits,
            keyset_limits,
            known: BTreeMap::new(),
        }
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Fetch everything in the plan into the partition
    ///
    /// The completion marker is cleared first and written only after the last
    /// source, so an interrupted run leaves the partition marked incomplete.
    pub async fn run(&mut self) -> Result<IngestReport> {
        self.partition.ensure_exists()?;
        self.partition.clear_complete()?;

        let mut report = IngestReport::new(self.partition.path.clone());
        info!(
            partition = %self.partition.path.display(),
            cycles = ?self.plan.cycles,
            candidates = self.plan.candidate_ids.len(),
            committees = self.plan.committee_ids.len(),
            "Ingest starting"
        );

        let cycles: Vec<u16> = self.plan.cycles.iter().copied().collect();
        for cycle in cycles {
            let mut committees = self.plan.committee_ids.clone();

            let candidate_ids: Vec<String> = self.plan.candidate_ids.iter().cloned().collect();
            for candidate_id in &candidate_ids {
                if !self.exists(RawSource::Candidates, candidate_id, &mut report).await? {
                    continue;
                }
                info!(candidate_id = %candidate_id, cycle, "Ingesting candidate");
                let linked = self.ingest_candidate(candidate_id, cycle, &mut report).await?;
                committees.extend(linked);
            }

            for committee_id in &committees {
                if !self.exists(RawSource::Committees, committee_id, &mut report).await? {
                    continue;
                }
                info!(committee_id = %committee_id, cycle, "Ingesting committee");
                self.ingest_committee(committee_id, cycle, &mut report).await?;
            }
        }

        self.partition.mark_complete()?;
        Ok(report)
    }

    /// Detail lookup that doubles as an existence check
    ///
    /// Found details are appended to the dimension file once per run. Missing
    /// entities are remembered; transient failures are retried next cycle.
    async fn exists(&mut self, source: RawSource, id: &str, report: &mut IngestReport) -> Result<bool> {
        if let Some(found) = self.known.get(id) {
            return Ok(*found);
        }

        match self.client.get(&source.path(id), &[], EndpointCost::Listing).await {
            Ok(envelope) if envelope.results.is_empty() => {
                report.skip(id, None, source, "not found");
                self.known.insert(id.to_string(), false);
                Ok(false)
            }
            Ok(envelope) => {
                if self.plan.is_enabled(source) {
                    let file = source.file_name(id, 0);
                    let mut sink = PartitionSink::new(
                        self.partition.path.join(&file),
                        self.meta(source, id, None),
                    );
                    sink.accept(&envelope.results)?;
                    report.add_lines(&file, sink.written());
                }
                self.known.insert(id.to_string(), true);
                Ok(true)
            }
            Err(FecError::NotFound(_)) => {
                report.skip(id, None, source, "not found");
                self.known.insert(id.to_string(), false);
                Ok(false)
            }
            Err(e) => {
                report.skip(id, None, source, e.to_string());
                Ok(false)
            }
        }
    }

    /// Per-cycle candidate sources; returns linked campaign committees
    ///
    /// Links are settled before anything else, so a failed history or
    /// Schedule E walk costs only that source.
    async fn ingest_candidate(
        &self,
        candidate_id: &str,
        cycle: u16,
        report: &mut IngestReport,
    ) -> Result<BTreeSet<String>> {
        let linked = match self.plan.offline_committees(candidate_id, cycle) {
            Some(mapped) => mapped,
            None => self.candidate_links(candidate_id, cycle, report).await?,
        };

        for source in self.plan.cycle_sources(Subject::Candidate) {
            if source == RawSource::CandidateCommittees {
                continue;
            }
            let file = source.file_name(candidate_id, cycle);
            let mut sink = PartitionSink::new(
                self.partition.path.join(&file),
                self.meta(source, candidate_id, Some(cycle)),
            );

            let outcome = self.walk(source, candidate_id, cycle, &mut sink).await;
            report.add_lines(&file, sink.written());
            self.settle(outcome, candidate_id, cycle, source, report)?;
        }

        debug!(candidate_id = %candidate_id, cycle, linked = ?linked, "Linked committees");
        Ok(linked)
    }

    /// Live committee links; the raw rows are kept only when the source is enabled
    async fn candidate_links(
        &self,
        candidate_id: &str,
        cycle: u16,
        report: &mut IngestReport,
    ) -> Result<BTreeSet<String>> {
        let source = RawSource::CandidateCommittees;
        let file = source.file_name(candidate_id, cycle);
        let meta = self.meta(source, candidate_id, Some(cycle));
        let mut sink = if self.plan.is_enabled(source) {
            PartitionSink::new(self.partition.path.join(&file), meta).collecting_links()
        } else {
            PartitionSink::links_only(meta)
        };

        let outcome = self.walk(source, candidate_id, cycle, &mut sink).await;
        report.add_lines(&file, sink.written());
        if self.settle(outcome, candidate_id, cycle, source, report)? {
            Ok(sink.take_links())
        } else {
            Ok(BTreeSet::new())
        }
    }

    async fn ingest_committee(&self, committee_id: &str, cycle: u16, report: &mut IngestReport) -> Result<()> {
        for source in self.plan.cycle_sources(Subject::Committee) {
            let file = source.file_name(committee_id, cycle);
            let mut sink = PartitionSink::new(
                self.partition.path.join(&file),
                self.meta(source, committee_id, Some(cycle)),
            );

            let outcome = self.walk(source, committee_id, cycle, &mut sink).await;
            report.add_lines(&file, sink.written());
            if !self.settle(outcome, committee_id, cycle, source, report)? {
                break;
            }
        }
        Ok(())
    }

    /// Ok(true) to continue with the entity's next source, Ok(false) to skip
    /// the rest, Err for errors that end the run
    fn settle(
        &self,
        outcome: Result<PageStats>,
        id: &str,
        cycle: u16,
        source: RawSource,
        report: &mut IngestReport,
    ) -> Result<bool> {
        match outcome {
            Ok(stats) => {
                debug!(
                    entity_id = %id,
                    cycle,
                    source = source.key(),
                    pages = stats.pages,
                    records = stats.records,
                    "Source fetched"
                );
                if stats.truncated {
                    report.truncated.push(Truncation {
                        entity_id: id.to_string(),
                        cycle,
                        source,
                        pages: stats.pages,
                    });
                }
                Ok(true)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                let reason = match &e {
                    Error::Api(FecError::NotFound(_)) => "not found".to_string(),
                    other => other.to_string(),
                };
                report.skip(id, Some(cycle), source, reason);
                Ok(false)
            }
        }
    }

    async fn walk(&self, source: RawSource, id: &str, cycle: u16, sink: &mut PartitionSink) -> Result<PageStats> {
        let path = source.path(id);
        let params = source.params(id, cycle);
        match source.paging() {
            Paging::Offset => collect_offset(self.client, &path, &params, self.offset_limits, sink).await,
            Paging::Keyset => collect_keyset(self.client, &path, &params, self.keyset_limits, sink).await,
            Paging::Single => {
                let envelope = self.client.get(&path, &params, EndpointCost::Listing).await?;
                sink.accept(&envelope.results)?;
                Ok(PageStats {
                    pages: 1,
                    records: envelope.results.len(),
                    truncated: false,
                })
            }
        }
    }

    fn meta(&self, source: RawSource, id: &str, cycle: Option<u16>) -> RecordMeta {
        RecordMeta {
            source,
            fetched_on: time::ymd(self.partition.date),
            cycle,
            entity_id: Some(id.to_string()),
        }
    }
}
