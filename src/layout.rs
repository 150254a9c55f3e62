//! Published file layout: `v{major}/{categoryId}.json` under a hosting base.
//!
//! The `v{major}` segment is the schema generation and only changes on a
//! breaking schema change; content revisions are tracked inside the documents.

use crate::catalog::CategoryId;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

/// Breaking-schema generation encoded in the publish path.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SchemaGeneration(pub u32);

impl SchemaGeneration {
    pub const V1: SchemaGeneration = SchemaGeneration(1);

    /// Directory name under the data root (`v1`).
    pub fn dir_name(&self) -> String {
        format!("v{}", self.0)
    }
}

impl Default for SchemaGeneration {
    fn default() -> Self {
        Self::V1
    }
}

impl fmt::Display for SchemaGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl FromStr for SchemaGeneration {
    type Err = anyhow::Error;

    /// Accepts `v1`, `V1` or a bare `1`.
    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        let major: u32 = digits
            .parse()
            .with_context(|| format!("invalid schema generation '{raw}'"))?;
        if major == 0 {
            bail!("schema generation must start at v1, got '{raw}'");
        }
        Ok(SchemaGeneration(major))
    }
}

impl Serialize for SchemaGeneration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SchemaGeneration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Relative publish path for a category, e.g. `v1/bedding_sleep.json`.
pub fn category_path(generation: SchemaGeneration, id: &CategoryId) -> String {
    format!("{}/{}.json", generation.dir_name(), id.0)
}

/// On-disk location of a category under a data root.
pub fn category_file(root: &Path, generation: SchemaGeneration, id: &CategoryId) -> PathBuf {
    root.join(generation.dir_name()).join(format!("{}.json", id.0))
}

/// Absolute URL a consumer fetches a category from.
///
/// A base URL without a trailing slash is treated as a directory, so
/// `https://host/links` and `https://host/links/` resolve identically.
pub fn category_url(base: &Url, generation: SchemaGeneration, id: &CategoryId) -> Result<Url> {
    if base.cannot_be_a_base() {
        bail!("base url {base} cannot carry a path");
    }
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(&category_path(generation, id))
        .with_context(|| format!("joining {} onto {base}", category_path(generation, id)))
}

/// Category id implied by a file name (`bedding_sleep.json` -> `bedding_sleep`).
pub fn category_id_from_path(path: &Path) -> Option<CategoryId> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| CategoryId(stem.to_string()))
}

/// List `*.json` files directly inside `dir`, sorted by name.
///
/// Documents never nest, so subdirectories are ignored.
pub fn list_category_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("category directory not found: {}", dir.display());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
