//! Optional TOML configuration.
//!
//! Every field has a default so the tool runs without a config file. Lookup
//! order: an explicit `--config` path, then `affiliate-links.toml` in the data
//! root, then built-in defaults.

use crate::layout::SchemaGeneration;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const CONFIG_FILE_NAME: &str = "affiliate-links.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub convert: ConvertConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PublishConfig {
    /// Hosting base the `v{major}/` directories are served under.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub generation: SchemaGeneration,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConvertConfig {
    #[serde(default = "default_document_version")]
    pub document_version: i64,
    #[serde(default = "default_item_version")]
    pub item_version: i64,
    #[serde(default)]
    pub affiliate_tags: AffiliateTags,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            document_version: default_document_version(),
            item_version: default_item_version(),
            affiliate_tags: AffiliateTags::default(),
        }
    }
}

fn default_document_version() -> i64 {
    3
}
fn default_item_version() -> i64 {
    1
}

#[derive(Debug, Deserialize, Clone)]
/// Tracking tag per retailer family, keyed by substring of the retailer name.
pub struct AffiliateTags {
    #[serde(default = "default_amazon_tag")]
    pub amazon: String,
    #[serde(default = "default_other_tag")]
    pub walmart: String,
    #[serde(default = "default_other_tag")]
    pub target: String,
    #[serde(default = "default_other_tag")]
    pub default: String,
}

impl Default for AffiliateTags {
    fn default() -> Self {
        Self {
            amazon: default_amazon_tag(),
            walmart: default_other_tag(),
            target: default_other_tag(),
            default: default_other_tag(),
        }
    }
}

fn default_amazon_tag() -> String {
    "dormready-20".to_string()
}
fn default_other_tag() -> String {
    "dormready".to_string()
}

impl AffiliateTags {
    /// Tag for a (normalized, lowercase) retailer name.
    pub fn for_retailer(&self, retailer: &str) -> &str {
        let retailer = retailer.to_lowercase();
        if retailer.contains("amazon") {
            &self.amazon
        } else if retailer.contains("walmart") {
            &self.walmart
        } else if retailer.contains("target") {
            &self.target
        } else {
            &self.default
        }
    }
}

impl PublishConfig {
    /// Parsed base URL; errors when unset or malformed.
    pub fn base_url(&self) -> Result<Url> {
        let Some(raw) = self.base_url.as_deref() else {
            bail!("publish.base_url is not configured (set it in {CONFIG_FILE_NAME})");
        };
        Url::parse(raw).with_context(|| format!("publish.base_url '{raw}' is not a valid URL"))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    if config.convert.document_version < 0 || config.convert.item_version < 0 {
        bail!("convert.document_version and convert.item_version must be non-negative");
    }
    Ok(config)
}

/// Resolve the effective configuration.
///
/// An explicit path must exist; the data-root file is optional.
pub fn resolve_config(explicit: Option<&Path>, data_root: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let candidate: Option<PathBuf> = data_root.map(|root| root.join(CONFIG_FILE_NAME));
    match candidate {
        Some(path) if path.is_file() => {
            log::debug!("using config {}", path.display());
            load_config(&path)
        }
        _ => Ok(Config::default()),
    }
}
