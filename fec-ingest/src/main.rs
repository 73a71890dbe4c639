//! fec-ingest - Raw ingester
//!
//! Pulls committee reports, itemized schedules and aggregates for every
//! tracked candidate and committee into `data/raw/<UTC date>/`.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use fec_common::api::FecClient;
use fec_common::config::{default_targets_path, offline_mode, ApiKey, TargetConfig};
use fec_common::layout::DataLayout;
use fec_common::raw::RawSource;
use fec_common::settings::PipelineSettings;
use fec_common::{build_info, logging, time};
use fec_ingest::{IngestPlan, Ingester};

/// Command-line arguments for fec-ingest
#[derive(Parser, Debug)]
#[command(name = "fec-ingest")]
#[command(about = "Fetch FEC data into dated raw partitions")]
#[command(version)]
struct Args {
    /// Target config path
    #[arg(long, env = "FEC_TARGETS", default_value_os_t = default_targets_path())]
    config: PathBuf,

    /// Pipeline settings TOML
    #[arg(long, env = "FEC_SETTINGS")]
    settings: Option<PathBuf>,

    /// Data root (default: settings, FEC_DATA_ROOT, then ./data)
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Partition date, YYYY-MM-DD (default: today, UTC)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Restrict to these sources (repeatable), e.g. --source schedule_a
    #[arg(long = "source", value_parser = parse_source)]
    sources: Vec<RawSource>,
}

fn parse_source(s: &str) -> std::result::Result<RawSource, String> {
    RawSource::from_key(s).ok_or_else(|| {
        let known: Vec<&str> = RawSource::ALL.iter().map(|s| s.key()).collect();
        format!("unknown source {:?}; expected one of {}", s, known.join(", "))
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = PipelineSettings::load(args.settings.as_deref())
        .context("Failed to load pipeline settings")?;
    logging::init(&settings.logging.level);
    info!("{}", build_info::banner("fec-ingest", env!("CARGO_PKG_VERSION")));

    if !args.sources.is_empty() {
        settings.ingest.sources = args.sources.clone();
    }

    // Configuration problems end the run before any request
    let config = TargetConfig::load(&args.config)?;
    let offline = offline_mode();
    let plan = IngestPlan::from_config(&config, &settings.ingest, offline)?;
    let api_key = ApiKey::from_env()?;
    info!(api_key = %api_key, offline, "Credentials and targets validated");

    let client = FecClient::new(settings.api.base_url.clone(), api_key, settings.request_policy())
        .context("Failed to build FEC client")?;

    let layout = DataLayout::new(settings.data_root(args.data_root.as_deref()));
    let date = args.date.unwrap_or_else(|| time::partition_date(time::now()));

    let mut ingester = Ingester::new(
        &client,
        &plan,
        &layout,
        date,
        settings.offset_limits(),
        settings.keyset_limits(),
    );
    let partition_path = ingester.partition().path.clone();
    let report = ingester
        .run()
        .await
        .with_context(|| format!("Ingest into {} failed", partition_path.display()))?;

    report.log_summary();
    Ok(())
}
