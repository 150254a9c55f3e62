//! Deserializable representation of a v1 category document.
//!
//! The types mirror `schema/category_v1.schema.json` so the converter, the
//! revision checks and tests can reason about links without ad-hoc JSON
//! handling. Use `CategoryIndex` when a schema-validated load is required;
//! use these structs directly when the file has already been vetted.

use crate::catalog::identity::{Badge, CategoryId, ItemId, Retailer};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One category's worth of affiliate items, published as a single file.
///
/// `version` counts content revisions within a schema generation; the
/// generation itself lives in the publish path (`v1/...`).
pub struct CategoryDocument {
    pub category_id: CategoryId,
    pub version: i64,
    pub last_updated: NaiveDate,
    pub items: BTreeMap<ItemId, ItemRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A product and the retailer offers for it, in display order.
pub struct ItemRecord {
    pub item_version: i64,
    pub links: Vec<LinkRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A single retailer's affiliate offer for an item.
///
/// Counters are signed so a malformed file still parses and the conformance
/// report can point at the offending value.
pub struct LinkRecord {
    pub retailer: Retailer,
    pub url: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub affiliate_tag: String,
    pub priority: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<Badge>,
}

impl CategoryDocument {
    /// Create an empty document for a category.
    pub fn new(category_id: CategoryId, version: i64, last_updated: NaiveDate) -> Self {
        Self {
            category_id,
            version,
            last_updated,
            items: BTreeMap::new(),
        }
    }

    pub fn item(&self, id: &ItemId) -> Option<&ItemRecord> {
        self.items.get(id)
    }

    pub fn item_mut(&mut self, id: &ItemId) -> Option<&mut ItemRecord> {
        self.items.get_mut(id)
    }

    /// Item ids in stable (sorted) order.
    pub fn item_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.items.keys()
    }

    /// Total number of links across every item.
    pub fn link_count(&self) -> usize {
        self.items.values().map(|item| item.links.len()).sum()
    }

    /// Render the document the way it is published: two-space indentation,
    /// non-ASCII kept verbatim, trailing newline.
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut rendered =
            serde_json::to_string_pretty(self).context("serializing category document")?;
        rendered.push('\n');
        Ok(rendered)
    }
}

impl ItemRecord {
    /// Links ordered by ascending priority; equal priorities keep array order.
    pub fn ordered_links(&self) -> Vec<&LinkRecord> {
        let mut links: Vec<&LinkRecord> = self.links.iter().collect();
        links.sort_by_key(|link| link.priority);
        links
    }
}

/// Read and parse a category document from disk without additional validation.
pub fn load_document_from_path(path: &Path) -> Result<CategoryDocument> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let document: CategoryDocument =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(document)
}

/// Write a document to `path`, replacing any existing file atomically.
///
/// The temp file lives in the destination directory so the final rename never
/// crosses filesystems.
pub fn save_document(path: &Path, document: &CategoryDocument) -> Result<()> {
    let rendered = document.to_pretty_json()?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    tmp.write_all(rendered.as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
