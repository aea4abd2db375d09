//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Credentials (store domain, admin token) are referenced by env-var name
//! in the config and resolved at runtime via `std::env::var`. A missing
//! credential is a fatal configuration error surfaced before any network
//! activity.

use serde::Deserialize;
use std::fs;

use crate::types::CuratorError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
}

/// Remote API access. Secrets are env-var *names*, not values.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub store_domain_env: String,
    pub admin_token_env: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RunConfig {
    /// Compute and log plans but submit no mutation.
    pub dry_run: bool,
    pub include_smart: bool,
    pub include_manual: bool,
    /// Only process collections whose handle starts with this prefix.
    pub handle_prefix: String,
    pub products_per_page: u32,
    pub inventory_levels_per_variant: u32,
    /// Abort the whole run on the first unrecovered collection error.
    /// When false, the failing collection is logged and skipped.
    pub abort_on_error: bool,
    pub exclude_handles: Vec<String>,
    /// Matches either the full `gid://` id or its bare numeric tail.
    pub exclude_collection_ids: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            include_smart: true,
            include_manual: true,
            handle_prefix: String::new(),
            products_per_page: 25,
            inventory_levels_per_variant: 10,
            abort_on_error: true,
            exclude_handles: Vec::new(),
            exclude_collection_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RankingConfig {
    /// Stock locations counted toward availability. Empty = all locations.
    pub location_ids: Vec<String>,
    pub demote_title_keywords: Vec<String>,
    pub demote_tags: Vec<String>,
    pub demote_product_types: Vec<String>,
}

/// Resolved remote-access credentials, ready to build a client from.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub store_domain: String,
    pub admin_token: String,
    pub api_version: String,
}

fn default_api_version() -> String {
    "2025-01".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, CuratorError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CuratorError::Config(format!("failed to read {path}: {e}")))?;
        Self::from_toml(&contents)
            .map_err(|e| CuratorError::Config(format!("failed to parse {path}: {e}")))
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Resolve credential env-vars into usable values.
    ///
    /// Fails with `Config` if either variable is unset or empty — the run
    /// must terminate before any remote call is attempted.
    pub fn credentials(&self) -> Result<ApiCredentials, CuratorError> {
        let store_domain = resolve_env(&self.api.store_domain_env)?;
        let admin_token = resolve_env(&self.api.admin_token_env)?;
        Ok(ApiCredentials {
            store_domain,
            admin_token,
            api_version: self.api.api_version.clone(),
        })
    }
}

/// Resolve an environment variable name to a non-empty value.
fn resolve_env(name: &str) -> Result<String, CuratorError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CuratorError::Config(format!(
            "environment variable not set: {name}"
        ))),
    }
}
