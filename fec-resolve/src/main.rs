//! fec-resolve - Target resolver
//!
//! Finds candidates by office/state/district/name for one cycle and lists
//! their principal and authorized committees. With `--write` the result is
//! merged into the target config.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use fec_common::api::FecClient;
use fec_common::config::{default_targets_path, ApiKey, TargetConfig};
use fec_common::settings::PipelineSettings;
use fec_common::{build_info, logging};
use fec_resolve::{merge_into, resolve, Office, ResolveQuery};

/// Command-line arguments for fec-resolve
#[derive(Parser, Debug)]
#[command(name = "fec-resolve")]
#[command(about = "Resolve FEC candidate and committee IDs")]
#[command(version)]
struct Args {
    /// Two-year election cycle, e.g. 2026
    #[arg(long)]
    cycle: u16,

    /// Two-letter state code
    #[arg(long)]
    state: Option<String>,

    /// House district number (zero-padding optional)
    #[arg(long)]
    district: Option<String>,

    /// Candidate name search
    #[arg(long)]
    name: Option<String>,

    /// Office sought: H, S or P
    #[arg(long, default_value = "H")]
    office: Office,

    /// Merge found IDs into the target config
    #[arg(long)]
    write: bool,

    /// Target config path
    #[arg(long, env = "FEC_TARGETS", default_value_os_t = default_targets_path())]
    config: PathBuf,

    /// Pipeline settings TOML
    #[arg(long, env = "FEC_SETTINGS")]
    settings: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = PipelineSettings::load(args.settings.as_deref())
        .context("Failed to load pipeline settings")?;
    logging::init(&settings.logging.level);
    info!("{}", build_info::banner("fec-resolve", env!("CARGO_PKG_VERSION")));

    let query = ResolveQuery {
        office: args.office,
        state: args.state,
        district: args.district,
        name: args.name,
        cycle: args.cycle,
    }
    .validated()
    .context("Invalid search filters")?;

    // Key check happens before any request
    let api_key = ApiKey::from_env()?;
    let client = FecClient::new(settings.api.base_url.clone(), api_key, settings.request_policy())
        .context("Failed to build FEC client")?;

    let rows = resolve(&client, &query, settings.offset_limits())
        .await
        .context("Candidate search failed")?;

    if rows.is_empty() {
        info!(
            state = ?query.state,
            district = ?query.district,
            name = ?query.name,
            cycle = query.cycle,
            "No candidates found"
        );
    }
    for row in &rows {
        info!(
            candidate_id = %row.candidate_id,
            name = row.name.as_deref().unwrap_or("-"),
            party = row.party.as_deref().unwrap_or("-"),
            principal = %row.principal_ids.join(","),
            authorized = %row.authorized_ids.join(","),
            "Resolved candidate"
        );
    }
    println!("{}", serde_json::to_string_pretty(&rows)?);

    if args.write && !rows.is_empty() {
        let mut config = TargetConfig::load_or_default(&args.config)
            .with_context(|| format!("Failed to read {}", args.config.display()))?;
        merge_into(&mut config, query.cycle, &rows);
        config
            .save(&args.config)
            .with_context(|| format!("Failed to write {}", args.config.display()))?;
        info!(
            path = %args.config.display(),
            candidates = config.candidate_ids.len(),
            committees = config.committee_ids.len(),
            "Target config updated"
        );
    }

    Ok(())
}
