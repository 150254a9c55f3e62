//! Conversion from the v2 authoring format to published v1 documents.
//!
//! v2 files list items as an array with free-form retailer names and badge
//! text. v1 keys items by id, lowercases retailers, assigns each retailer its
//! tracking tag, derives `priority` from array position and maps badge text
//! onto the normalized vocabulary the app understands.

use crate::catalog::{
    Badge, CategoryDocument, CategoryId, ItemId, ItemRecord, LinkRecord, Retailer, save_document,
};
use crate::config::{AffiliateTags, ConvertConfig};
use crate::layout::list_category_files;
use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::fs;
use std::path::{Path, PathBuf};

// Free-form badge text seen in v2 files, lowercased, mapped to v1 labels.
const BADGE_ALIASES: &[(&str, &str)] = &[
    ("budget best-seller", "best_seller"),
    ("best-seller", "best_seller"),
    ("amazon no.1 best-seller", "best_seller"),
    ("amazons choice", "amazons_choice"),
    ("amazon choice-style", "amazons_choice"),
    ("budget pick", "budget_pick"),
    ("dorm bundle", "dorm_bundle"),
    ("adjustable luxury", "premium"),
    ("premium adjustable", "premium"),
    ("multiple options", "multiple_options"),
    ("multiple styles", "multiple_options"),
    ("heavy-duty", "heavy_duty"),
    ("adjustable height", "adjustable"),
    ("popular dorm upgrade", "popular"),
    ("popular dorm lamp", "popular"),
    ("plush comfort", "comfort"),
    ("decor + luxe feel", "premium"),
    ("top-rated", "top_rated"),
    ("budget encasement", "budget_pick"),
    ("soft & quiet", "comfort"),
    ("allergy-friendly", "allergy_friendly"),
    ("value pack", "value_pack"),
    ("big-box option", "in_store"),
    ("budget full-body", "budget_pick"),
    ("budget set", "budget_pick"),
    ("budget cozy", "budget_pick"),
    ("large capacity", "large_capacity"),
    ("many options", "multiple_options"),
];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A v2 category file.
pub struct V2Category {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub items: Vec<V2Item>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V2Item {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub affiliate_links: Vec<V2Link>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V2Link {
    #[serde(default)]
    pub retailer: String,
    pub url: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default, deserialize_with = "whole_count")]
    pub review_count: Option<i64>,
    #[serde(default)]
    pub badge: Option<String>,
}

/// Accepts `1200` and `1200.0` alike; rejects fractional counts.
fn whole_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(count) = number.as_i64() {
        return Ok(Some(count));
    }
    match number.as_f64() {
        Some(value) if value.fract() == 0.0 && value.abs() <= i64::MAX as f64 => {
            Ok(Some(value as i64))
        }
        _ => Err(serde::de::Error::custom(format!(
            "reviewCount must be a whole number, got {number}"
        ))),
    }
}

/// Knobs applied to every converted document.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub document_version: i64,
    pub item_version: i64,
    pub last_updated: NaiveDate,
    pub tags: AffiliateTags,
}

impl ConvertOptions {
    pub fn from_config(config: &ConvertConfig, last_updated: NaiveDate) -> Self {
        Self {
            document_version: config.document_version,
            item_version: config.item_version,
            last_updated,
            tags: config.affiliate_tags.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertedFile {
    pub file: String,
    pub items: usize,
    pub links: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub file: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
/// Outcome of converting a whole directory.
pub struct ConversionSummary {
    pub converted: Vec<ConvertedFile>,
    pub failed: Vec<FailedFile>,
}

impl ConversionSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Lowercase and trim a retailer name.
pub fn normalize_retailer(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Map badge text onto the v1 vocabulary; unknown text becomes snake_case.
pub fn normalize_badge(raw: &str) -> Option<Badge> {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    let label = BADGE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| lowered.replace([' ', '-'], "_"));
    Some(Badge::from_label(&label))
}

/// Parse v2 file content.
///
/// Besides a plain object, accepts a bare object member such as
/// `"bedding_sleep": { ... }` cut out of a combined file; the member key
/// supplies the category id when the body has none.
pub fn parse_v2(content: &str) -> Result<V2Category> {
    let trimmed = content.trim();
    if !trimmed.starts_with('"') {
        return serde_json::from_str(trimmed).context("parsing v2 category object");
    }

    let wrapped: Map<String, Value> = serde_json::from_str(&format!("{{{trimmed}}}"))
        .context("parsing v2 category fragment")?;
    if wrapped.len() != 1 {
        bail!(
            "v2 fragment must hold exactly one category, found {}",
            wrapped.len()
        );
    }
    let Some((key, body)) = wrapped.into_iter().next() else {
        bail!("v2 fragment is empty");
    };
    let mut category: V2Category =
        serde_json::from_value(body).with_context(|| format!("parsing v2 category '{key}'"))?;
    if category.id.is_none() {
        category.id = Some(key);
    }
    Ok(category)
}

fn convert_link(link: &V2Link, position: usize, tags: &AffiliateTags) -> LinkRecord {
    let retailer = normalize_retailer(&link.retailer);
    let affiliate_tag = tags.for_retailer(&retailer).to_string();
    LinkRecord {
        retailer: Retailer::from_label(&retailer),
        url: link.url.clone(),
        display_name: link.display_name.clone(),
        affiliate_tag,
        priority: position as i64 + 1,
        average_rating: link.average_rating,
        review_count: link.review_count,
        badge: link.badge.as_deref().and_then(normalize_badge),
    }
}

/// Convert one parsed v2 category.
///
/// Items sharing an id collapse to the last occurrence.
pub fn convert_category(v2: &V2Category, options: &ConvertOptions) -> Result<CategoryDocument> {
    let id = v2
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| anyhow!("v2 category is missing 'id'"))?;

    let mut doc = CategoryDocument::new(
        CategoryId(id.to_string()),
        options.document_version,
        options.last_updated,
    );
    for item in &v2.items {
        let links = item
            .affiliate_links
            .iter()
            .enumerate()
            .map(|(idx, link)| convert_link(link, idx, &options.tags))
            .collect();
        let record = ItemRecord {
            item_version: options.item_version,
            links,
        };
        if doc.items.insert(ItemId(item.id.clone()), record).is_some() {
            log::warn!("[convert] {id}: duplicate item '{}', keeping the last", item.id);
        }
    }
    Ok(doc)
}

/// Convert `input` and write the v1 document to `output`.
pub fn convert_file(input: &Path, output: &Path, options: &ConvertOptions) -> Result<ConvertedFile> {
    let content =
        fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let v2 = parse_v2(&content).with_context(|| format!("in {}", input.display()))?;
    let doc = convert_category(&v2, options).with_context(|| format!("in {}", input.display()))?;
    save_document(output, &doc)?;

    let converted = ConvertedFile {
        file: display_name(input),
        items: doc.items.len(),
        links: doc.link_count(),
    };
    log::info!(
        "[convert] {}: {} items, {} links",
        converted.file,
        converted.items,
        converted.links
    );
    Ok(converted)
}

/// Convert every `*.json` under `v2_dir` into `v1_dir`, keeping file names.
///
/// Per-file failures are recorded and the run continues; only a missing or
/// empty input directory aborts.
pub fn convert_dir(v2_dir: &Path, v1_dir: &Path, options: &ConvertOptions) -> Result<ConversionSummary> {
    if !v2_dir.is_dir() {
        bail!("v2 directory not found: {}", v2_dir.display());
    }
    let inputs = list_category_files(v2_dir)?;
    if inputs.is_empty() {
        bail!("no JSON files found in {}", v2_dir.display());
    }
    fs::create_dir_all(v1_dir).with_context(|| format!("creating {}", v1_dir.display()))?;
    log::info!("[convert] found {} files to convert", inputs.len());

    let mut summary = ConversionSummary::default();
    for input in inputs {
        let output: PathBuf = match input.file_name() {
            Some(name) => v1_dir.join(name),
            None => continue,
        };
        match convert_file(&input, &output, options) {
            Ok(converted) => summary.converted.push(converted),
            Err(err) => {
                log::warn!("[convert] {}: {err:#}", display_name(&input));
                summary.failed.push(FailedFile {
                    file: display_name(&input),
                    error: format!("{err:#}"),
                });
            }
        }
    }
    Ok(summary)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
