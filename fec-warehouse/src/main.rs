//! fec-warehouse - Warehouse builder
//!
//! Normalizes the newest usable raw partition into `data/warehouse/`.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use fec_common::layout::DataLayout;
use fec_common::settings::PipelineSettings;
use fec_common::{build_info, logging, time};
use fec_warehouse::WarehouseBuilder;

#[derive(Parser, Debug)]
#[command(name = "fec-warehouse")]
#[command(about = "Build normalized tables and committee metrics from raw partitions")]
#[command(version)]
struct Args {
    /// Pipeline settings TOML
    #[arg(long, env = "FEC_SETTINGS")]
    settings: Option<PathBuf>,

    /// Data root (default: settings, FEC_DATA_ROOT, then ./data)
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Date used when no raw partition exists yet (default: today, UTC)
    #[arg(long)]
    date: Option<NaiveDate>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = PipelineSettings::load(args.settings.as_deref())
        .context("Failed to load pipeline settings")?;
    logging::init(&settings.logging.level);
    info!("{}", build_info::banner("fec-warehouse", env!("CARGO_PKG_VERSION")));

    let layout = DataLayout::new(settings.data_root(args.data_root.as_deref()));
    let today = args.date.unwrap_or_else(|| time::partition_date(time::now()));

    let summary = WarehouseBuilder::new(layout.clone(), settings.warehouse.clone())
        .build(today)
        .with_context(|| format!("Warehouse build under {} failed", layout.root().display()))?;

    summary.log_summary();
    Ok(())
}
