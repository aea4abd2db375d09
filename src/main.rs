//! CURATOR — Inventory-aware collection reordering agent
//!
//! Entry point. Loads configuration, initialises structured logging,
//! validates credentials, and runs the sequential reorder pass over the
//! store's collections.

use anyhow::{Context, Result};
use tracing::{info, warn};

use curator::api::shopify::ShopifyAdmin;
use curator::config::AppConfig;
use curator::engine::{Reorderer, RunOptions};
use curator::ranking::DemotionRules;

const BANNER: &str = r#"
   ____ _   _ ____      _  _____ ___  ____
  / ___| | | |  _ \    / \|_   _/ _ \|  _ \
 | |   | | | | |_) |  / _ \ | || | | | |_) |
 | |___| |_| |  _ <  / ___ \| || |_| |  _ <
  \____|\___/|_| \_\/_/   \_\_| \___/|_| \_\

  Inventory-aware collection reordering
  v0.1.0 — surfacing what's actually in stock
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("CURATOR_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = AppConfig::load(&config_path)
        .with_context(|| format!("loading configuration from {config_path}"))?;

    init_logging();

    println!("{BANNER}");

    // Credentials resolve before anything touches the network.
    let creds = cfg.credentials()?;

    info!(
        store = %creds.store_domain,
        api_version = %creds.api_version,
        dry_run = cfg.run.dry_run,
        "CURATOR starting up"
    );
    if cfg.run.dry_run {
        info!("Dry run: plans will be computed and logged, nothing submitted");
    }

    let api = ShopifyAdmin::new(
        &creds,
        cfg.run.products_per_page,
        cfg.run.inventory_levels_per_variant,
    )?;

    let options = RunOptions {
        dry_run: cfg.run.dry_run,
        include_smart: cfg.run.include_smart,
        include_manual: cfg.run.include_manual,
        handle_prefix: cfg.run.handle_prefix.clone(),
        exclude_handles: cfg.run.exclude_handles.clone(),
        exclude_collection_ids: cfg.run.exclude_collection_ids.clone(),
        abort_on_error: cfg.run.abort_on_error,
    };
    let rules = DemotionRules::new(
        &cfg.ranking.demote_title_keywords,
        &cfg.ranking.demote_tags,
        &cfg.ranking.demote_product_types,
    );
    if rules.is_empty() {
        warn!("No demotion keywords configured — ranking on stock alone");
    }

    let reorderer = Reorderer::new(
        Box::new(api),
        options,
        rules,
        cfg.ranking.location_ids.clone(),
    );

    let summary = reorderer.run().await?;

    info!(
        collections = summary.collections_seen,
        selected = summary.selected,
        processed = summary.processed,
        failed = summary.failed,
        moves_planned = summary.moves_planned,
        moves_submitted = summary.moves_submitted,
        jobs_confirmed = summary.jobs_confirmed,
        jobs_unconfirmed = summary.jobs_unconfirmed,
        elapsed_secs = summary.elapsed().num_seconds(),
        "Run complete"
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("curator=info"));

    let json_logging = std::env::var("CURATOR_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
