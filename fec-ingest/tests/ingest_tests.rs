//! End-to-end ingest runs against the in-process FEC mock

use chrono::NaiveDate;
use fec_common::api::PageLimits;
use fec_common::config::TargetConfig;
use fec_common::layout::DataLayout;
use fec_common::ndjson::read_ndjson;
use fec_common::raw::{RawSource, RecordMeta};
use fec_common::settings::IngestSettings;
use fec_common::testing::{MockFec, MockRoute};
use fec_ingest::{IngestPlan, Ingester};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

const OFFSET: PageLimits = PageLimits {
    per_page: 100,
    max_pages: 50,
};
const KEYSET: PageLimits = PageLimits {
    per_page: 100,
    max_pages: 20,
};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn config(value: Value) -> TargetConfig {
    serde_json::from_value(value).unwrap()
}

fn receipts(prefix: &str, n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| json!({"sub_id": format!("{}{}", prefix, i), "contribution_receipt_amount": 100.0}))
        .collect()
}

/// Every endpoint for candidate H6WA10123 and its principal committee C00000001
fn full_routes() -> Vec<(&'static str, MockRoute)> {
    vec![
        ("/candidate/H6WA10123/", MockRoute::detail(json!({"candidate_id": "H6WA10123", "name": "DOE, JANE"}))),
        ("/candidate/H6WA10123/history/", MockRoute::Offset(vec![vec![json!({"candidate_id": "H6WA10123", "two_year_period": 2026})]])),
        (
            "/candidate/H6WA10123/committees/",
            MockRoute::Offset(vec![vec![
                json!({"committee_id": "C00000001", "designation": "P"}),
                json!({"committee_id": "C00000077", "designation": "J"}),
            ]]),
        ),
        ("/schedules/schedule_e/", MockRoute::Keyset(vec![vec![json!({"sub_id": "e1", "support_oppose_indicator": "S"})]])),
        ("/committee/C00000001/", MockRoute::detail(json!({"committee_id": "C00000001", "name": "DOE FOR CONGRESS"}))),
        ("/committee/C00000001/reports/", MockRoute::Offset(vec![vec![json!({"file_number": 1, "committee_id": "C00000001"})]])),
        ("/schedules/schedule_a/", MockRoute::Keyset(vec![receipts("a", 3), receipts("b", 2)])),
        ("/schedules/schedule_a/by_size/", MockRoute::Offset(vec![vec![json!({"size": 0, "total": 50.0})]])),
        ("/schedules/schedule_a/by_state/", MockRoute::Offset(vec![vec![json!({"state": "WA", "total": 400.0})]])),
        ("/schedules/schedule_a/by_employer/", MockRoute::Offset(vec![vec![json!({"employer": "ACME", "total": 300.0})]])),
        ("/schedules/schedule_b/", MockRoute::Keyset(vec![vec![json!({"sub_id": "b1", "recipient_name": "Vendor"})]])),
    ]
}

fn lines(dir: &Path, file: &str) -> usize {
    let path = dir.join(file);
    if path.exists() {
        read_ndjson(&path).unwrap().len()
    } else {
        0
    }
}

#[tokio::test]
async fn test_rerun_same_day_appends() {
    let mock = MockFec::start(full_routes()).await;
    let client = mock.client();
    let data = TempDir::new().unwrap();
    let layout = DataLayout::new(data.path());
    let cfg = config(json!({"cycles": [2026], "candidate_ids": ["H6WA10123"]}));
    let plan = IngestPlan::from_config(&cfg, &IngestSettings::default(), false).unwrap();

    let first = Ingester::new(&client, &plan, &layout, day(), OFFSET, KEYSET)
        .run()
        .await
        .unwrap();
    let partition = layout.partition(day());
    assert!(partition.is_complete());
    assert_eq!(lines(&partition.path, "schedule_a_C00000001_2026.ndjson"), 5);
    assert_eq!(first.files["schedule_a_C00000001_2026.ndjson"], 5);
    assert!(first.skipped.is_empty());

    Ingester::new(&client, &plan, &layout, day(), OFFSET, KEYSET)
        .run()
        .await
        .unwrap();

    assert!(partition.is_complete());
    assert_eq!(lines(&partition.path, "schedule_a_C00000001_2026.ndjson"), 10);
    assert_eq!(lines(&partition.path, "committee_reports_C00000001_2026.ndjson"), 2);
    assert_eq!(lines(&partition.path, "candidates.ndjson"), 2);
}

#[tokio::test]
async fn test_every_source_lands_with_provenance() {
    let mock = MockFec::start(full_routes()).await;
    let client = mock.client();
    let data = TempDir::new().unwrap();
    let layout = DataLayout::new(data.path());
    let cfg = config(json!({"cycles": [2026], "candidate_ids": ["H6WA10123"]}));
    let plan = IngestPlan::from_config(&cfg, &IngestSettings::default(), false).unwrap();

    Ingester::new(&client, &plan, &layout, day(), OFFSET, KEYSET)
        .run()
        .await
        .unwrap();

    let dir = layout.partition(day()).path;
    for file in [
        "candidates.ndjson",
        "committees.ndjson",
        "candidate_history_H6WA10123_2026.ndjson",
        "candidate_committees_H6WA10123_2026.ndjson",
        "schedule_e_H6WA10123_2026.ndjson",
        "committee_reports_C00000001_2026.ndjson",
        "receipts_by_size_C00000001_2026.ndjson",
        "receipts_by_state_C00000001_2026.ndjson",
        "receipts_by_employer_C00000001_2026.ndjson",
        "schedule_b_C00000001_2026.ndjson",
    ] {
        assert!(lines(&dir, file) > 0, "{} missing", file);
    }

    // Joint fundraisers are not followed
    assert_eq!(mock.hit_count("/committee/C00000077/"), 0);

    let row = &read_ndjson(&dir.join("schedule_b_C00000001_2026.ndjson")).unwrap()[0];
    let meta = RecordMeta::read(row).unwrap();
    assert_eq!(meta.source, RawSource::ScheduleB);
    assert_eq!(meta.fetched_on, "2026-10-19");
    assert_eq!(meta.cycle, Some(2026));
    assert_eq!(meta.entity_id.as_deref(), Some("C00000001"));
}

#[tokio::test]
async fn test_missing_committee_is_skipped() {
    let mut routes = full_routes();
    routes.push(("/committee/C00000404/", MockRoute::status(404)));
    routes.push(("/committee/C00000500/", MockRoute::Json(200, json!({"results": []}))));
    let mock = MockFec::start(routes).await;
    let client = mock.client();
    let data = TempDir::new().unwrap();
    let layout = DataLayout::new(data.path());
    let cfg = config(json!({"cycles": [2024, 2026], "committee_ids": ["C00000001", "C00000404", "C00000500"]}));
    let plan = IngestPlan::from_config(&cfg, &IngestSettings::default(), false).unwrap();

    let report = Ingester::new(&client, &plan, &layout, day(), OFFSET, KEYSET)
        .run()
        .await
        .unwrap();

    let skipped: Vec<&str> = report.skipped.iter().map(|s| s.entity_id.as_str()).collect();
    assert_eq!(skipped, vec!["C00000404", "C00000500"]);
    // Not-found answers are remembered across cycles
    assert_eq!(mock.hit_count("/committee/C00000404/"), 1);
    assert_eq!(mock.hit_count("/committee/C00000404/reports/"), 0);

    let dir = layout.partition(day()).path;
    assert!(lines(&dir, "committee_reports_C00000001_2024.ndjson") > 0);
    assert!(lines(&dir, "committee_reports_C00000001_2026.ndjson") > 0);
    assert_eq!(lines(&dir, "committees.ndjson"), 1);
    assert!(layout.partition(day()).is_complete());
}

#[tokio::test]
async fn test_retry_exhaustion_skips_rest_of_entity() {
    let mut routes = full_routes();
    routes.push(("/committee/C00000002/", MockRoute::detail(json!({"committee_id": "C00000002"}))));
    routes.push(("/committee/C00000002/reports/", MockRoute::status(429)));
    let mock = MockFec::start(routes).await;
    let client = mock.client();
    let data = TempDir::new().unwrap();
    let layout = DataLayout::new(data.path());
    let cfg = config(json!({"cycles": [2026], "committee_ids": ["C00000001", "C00000002"]}));
    let plan = IngestPlan::from_config(&cfg, &IngestSettings::default(), false).unwrap();

    let report = Ingester::new(&client, &plan, &layout, day(), OFFSET, KEYSET)
        .run()
        .await
        .unwrap();

    assert_eq!(report.skipped.len(), 1);
    let skip = &report.skipped[0];
    assert_eq!(skip.entity_id, "C00000002");
    assert_eq!(skip.source, RawSource::CommitteeReports);
    assert!(skip.reason.contains("4 attempts"));

    let dir = layout.partition(day()).path;
    assert_eq!(lines(&dir, "schedule_a_C00000002_2026.ndjson"), 0);
    assert_eq!(lines(&dir, "schedule_a_C00000001_2026.ndjson"), 5);
    assert!(layout.partition(day()).is_complete());
}

#[tokio::test]
async fn test_failed_candidate_history_keeps_linked_committees() {
    let mut routes = full_routes();
    routes.retain(|(p, _)| *p != "/candidate/H6WA10123/history/");
    routes.push(("/candidate/H6WA10123/history/", MockRoute::status(500)));
    let mock = MockFec::start(routes).await;
    let client = mock.client();
    let data = TempDir::new().unwrap();
    let layout = DataLayout::new(data.path());
    let cfg = config(json!({"cycles": [2026], "candidate_ids": ["H6WA10123"]}));
    let plan = IngestPlan::from_config(&cfg, &IngestSettings::default(), false).unwrap();

    let report = Ingester::new(&client, &plan, &layout, day(), OFFSET, KEYSET)
        .run()
        .await
        .unwrap();

    let skipped: Vec<(&str, RawSource)> = report
        .skipped
        .iter()
        .map(|s| (s.entity_id.as_str(), s.source))
        .collect();
    assert_eq!(skipped, vec![("H6WA10123", RawSource::CandidateHistory)]);

    assert_eq!(mock.hit_count("/committee/C00000001/"), 1);
    assert_eq!(mock.hit_count("/committee/C00000001/reports/"), 1);
    let dir = layout.partition(day()).path;
    assert_eq!(lines(&dir, "candidate_history_H6WA10123_2026.ndjson"), 0);
    assert_eq!(lines(&dir, "schedule_e_H6WA10123_2026.ndjson"), 1);
    assert_eq!(lines(&dir, "schedule_a_C00000001_2026.ndjson"), 5);
    assert!(layout.partition(day()).is_complete());
}

#[tokio::test]
async fn test_offline_mapping_skips_live_committee_lookup() {
    let mock = MockFec::start(full_routes()).await;
    let client = mock.client();
    let data = TempDir::new().unwrap();
    let layout = DataLayout::new(data.path());
    let cfg = config(json!({
        "cycles": [2026],
        "candidate_ids": ["H6WA10123"],
        "candidate_committees": {"H6WA10123": {"2026": ["C00000001"]}}
    }));
    let plan = IngestPlan::from_config(&cfg, &IngestSettings::default(), true).unwrap();

    Ingester::new(&client, &plan, &layout, day(), OFFSET, KEYSET)
        .run()
        .await
        .unwrap();

    assert_eq!(mock.hit_count("/candidate/H6WA10123/committees/"), 0);
    let dir = layout.partition(day()).path;
    assert_eq!(lines(&dir, "schedule_a_C00000001_2026.ndjson"), 5);
}

#[tokio::test]
async fn test_source_selection_limits_requests() {
    let mock = MockFec::start(full_routes()).await;
    let client = mock.client();
    let data = TempDir::new().unwrap();
    let layout = DataLayout::new(data.path());
    let cfg = config(json!({"cycles": [2026], "committee_ids": ["C00000001"]}));
    let settings = IngestSettings {
        sources: vec![RawSource::CommitteeReports],
        ..IngestSettings::default()
    };
    let plan = IngestPlan::from_config(&cfg, &settings, false).unwrap();

    let report = Ingester::new(&client, &plan, &layout, day(), OFFSET, KEYSET)
        .run()
        .await
        .unwrap();

    assert_eq!(report.files.len(), 1);
    assert_eq!(mock.hit_count("/schedules/schedule_a/"), 0);
    // Detail lookup still runs as the existence check, but nothing is stored
    assert_eq!(mock.hit_count("/committee/C00000001/"), 1);
    assert_eq!(lines(&layout.partition(day()).path, "committees.ndjson"), 0);
}

#[tokio::test]
async fn test_keyset_cap_is_reported() {
    let mut routes = full_routes();
    routes.retain(|(p, _)| *p != "/schedules/schedule_a/");
    let pages: Vec<Vec<Value>> = (0..5).map(|i| receipts(&format!("p{}-", i), 1)).collect();
    routes.push(("/schedules/schedule_a/", MockRoute::Keyset(pages)));
    let mock = MockFec::start(routes).await;
    let client = mock.client();
    let data = TempDir::new().unwrap();
    let layout = DataLayout::new(data.path());
    let cfg = config(json!({"cycles": [2026], "committee_ids": ["C00000001"]}));
    let plan = IngestPlan::from_config(&cfg, &IngestSettings::default(), false).unwrap();
    let capped = PageLimits {
        per_page: 100,
        max_pages: 2,
    };

    let report = Ingester::new(&client, &plan, &layout, day(), OFFSET, capped)
        .run()
        .await
        .unwrap();

    assert_eq!(report.truncated.len(), 1);
    assert_eq!(report.truncated[0].source, RawSource::ScheduleA);
    assert_eq!(lines(&layout.partition(day()).path, "schedule_a_C00000001_2026.ndjson"), 2);
}
