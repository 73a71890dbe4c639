//! fec-bundle - Site bundle builder
//!
//! Turns `data/warehouse/` into the JSON bundles under `data/site/`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use fec_bundle::BundleBuilder;
use fec_common::config::{default_targets_path, TargetConfig};
use fec_common::layout::DataLayout;
use fec_common::settings::PipelineSettings;
use fec_common::{build_info, logging, time};

#[derive(Parser, Debug)]
#[command(name = "fec-bundle")]
#[command(about = "Build site JSON bundles from warehouse tables")]
#[command(version)]
struct Args {
    /// Target config path (offline candidate → committee mapping)
    #[arg(long, env = "FEC_TARGETS", default_value_os_t = default_targets_path())]
    config: PathBuf,

    /// Pipeline settings TOML
    #[arg(long, env = "FEC_SETTINGS")]
    settings: Option<PathBuf>,

    /// Data root (default: settings, FEC_DATA_ROOT, then ./data)
    #[arg(long)]
    data_root: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = PipelineSettings::load(args.settings.as_deref())
        .context("Failed to load pipeline settings")?;
    logging::init(&settings.logging.level);
    info!("{}", build_info::banner("fec-bundle", env!("CARGO_PKG_VERSION")));

    let config = TargetConfig::load_or_default(&args.config)?;
    let layout = DataLayout::new(settings.data_root(args.data_root.as_deref()));
    let generated_at = time::rfc3339(time::now());

    BundleBuilder::new(layout.clone(), settings.bundle.clone())
        .build(&config, &generated_at)
        .with_context(|| format!("Bundle build under {} failed", layout.root().display()))?;

    Ok(())
}
