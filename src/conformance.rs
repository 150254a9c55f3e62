//! Static conformance checks for category documents.
//!
//! These are the data properties a published file is expected to hold:
//! unique non-empty item keys, non-empty link lists, positive priorities,
//! absolute URLs, ratings within `[0, 5]` and non-negative counters. Nothing
//! here fetches URLs or rewrites files; callers decide what to do with the
//! report.

use crate::catalog::{CategoryDocument, ItemId};
use crate::layout::{category_id_from_path, list_category_files};
use crate::schema_loader::CategorySchema;
use anyhow::Result;
use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use url::Url;

pub const MAX_AVERAGE_RATING: f64 = 5.0;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
/// One broken rule, located by a slash-separated path inside the document.
pub struct Violation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub location: String,
    pub message: String,
}

impl Violation {
    pub(crate) fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: None,
            location: location.into(),
            message: message.into(),
        }
    }

    fn in_file(mut self, path: &Path) -> Self {
        self.file = Some(path.display().to_string());
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{file}: ")?;
        }
        if self.location.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.location, self.message)
        }
    }
}

/// Check the value rules of an already-parsed document.
///
/// Every problem is collected instead of stopping at the first one so an
/// editor can fix a file in a single pass.
pub fn check_document(doc: &CategoryDocument) -> Vec<Violation> {
    let mut violations = Vec::new();

    if doc.category_id.0.trim().is_empty() {
        violations.push(Violation::new("categoryId", "must be a non-empty string"));
    }
    if doc.version < 0 {
        violations.push(Violation::new(
            "version",
            format!("must be non-negative, got {}", doc.version),
        ));
    }

    for (item_id, item) in &doc.items {
        let base = format!("items/{}", item_id.0);
        if item_id.0.trim().is_empty() {
            violations.push(Violation::new(&base, "item key must be a non-empty string"));
        }
        if item.item_version < 0 {
            violations.push(Violation::new(
                format!("{base}/itemVersion"),
                format!("must be non-negative, got {}", item.item_version),
            ));
        }
        if item.links.is_empty() {
            violations.push(Violation::new(
                format!("{base}/links"),
                "must contain at least one link",
            ));
        }

        for (idx, link) in item.links.iter().enumerate() {
            let at = format!("{base}/links/{idx}");
            if link.retailer.as_str().trim().is_empty() {
                violations.push(Violation::new(
                    format!("{at}/retailer"),
                    "must be a non-empty string",
                ));
            }
            if let Err(reason) = check_url(&link.url) {
                violations.push(Violation::new(format!("{at}/url"), reason));
            }
            if link.priority <= 0 {
                violations.push(Violation::new(
                    format!("{at}/priority"),
                    format!("must be a positive integer, got {}", link.priority),
                ));
            }
            if let Some(rating) = link.average_rating {
                if !rating.is_finite() || !(0.0..=MAX_AVERAGE_RATING).contains(&rating) {
                    violations.push(Violation::new(
                        format!("{at}/averageRating"),
                        format!("must lie within [0, {MAX_AVERAGE_RATING}], got {rating}"),
                    ));
                }
            }
            if let Some(count) = link.review_count {
                if count < 0 {
                    violations.push(Violation::new(
                        format!("{at}/reviewCount"),
                        format!("must be non-negative, got {count}"),
                    ));
                }
            }
        }
    }

    violations
}

/// Check one file on disk: JSON syntax, duplicate item keys, schema shape,
/// file stem vs. `categoryId`, then the value rules.
///
/// Read and parse failures become violations so a directory scan can keep
/// going past a broken file.
pub fn check_file(path: &Path, schema: &CategorySchema) -> Vec<Violation> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) => return vec![Violation::new("", format!("unable to read: {err}")).in_file(path)],
    };

    let value: Value = match serde_json::from_str(&data) {
        Ok(value) => value,
        Err(err) => return vec![Violation::new("", format!("invalid JSON: {err}")).in_file(path)],
    };

    let mut violations = Vec::new();
    let duplicates = duplicate_keys(&data);
    for field in duplicates.fields {
        violations.push(Violation::new(field, "key appears more than once"));
    }
    for dup in duplicates.items {
        violations.push(Violation::new(
            format!("items/{}", dup.0),
            "item key appears more than once",
        ));
    }

    if let Err(errors) = schema.validate(&value) {
        violations.extend(errors.into_iter().map(|err| Violation::new("", format!("schema: {err}"))));
        return violations.into_iter().map(|v| v.in_file(path)).collect();
    }

    let doc: CategoryDocument = match serde_json::from_value(value) {
        Ok(doc) => doc,
        Err(err) => {
            violations.push(Violation::new("", format!("unable to parse document: {err}")));
            return violations.into_iter().map(|v| v.in_file(path)).collect();
        }
    };

    if let Some(stem) = category_id_from_path(path) {
        if stem != doc.category_id {
            violations.push(Violation::new(
                "categoryId",
                format!(
                    "'{}' does not match file name '{}'",
                    doc.category_id, stem
                ),
            ));
        }
    }

    violations.extend(check_document(&doc));
    violations.into_iter().map(|v| v.in_file(path)).collect()
}

/// Check every category file directly inside `dir`.
pub fn check_dir(dir: &Path, schema: &CategorySchema) -> Result<Vec<Violation>> {
    let mut violations = Vec::new();
    for path in list_category_files(dir)? {
        let found = check_file(&path, schema);
        log::debug!("checked {} ({} violations)", path.display(), found.len());
        violations.extend(found);
    }
    Ok(violations)
}

fn check_url(raw: &str) -> Result<(), String> {
    if raw.trim().is_empty() {
        return Err("must be a non-empty URL".to_string());
    }
    let parsed = Url::parse(raw).map_err(|err| format!("invalid URL '{raw}': {err}"))?;
    if !parsed.has_host() {
        return Err(format!("URL '{raw}' has no host"));
    }
    Ok(())
}

/// Keys that occur more than once in the raw text, at the top level of the
/// document and inside `items`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DuplicateKeys {
    pub fields: Vec<String>,
    pub items: Vec<ItemId>,
}

impl DuplicateKeys {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.items.is_empty()
    }
}

/// Scan `raw` for repeated keys.
///
/// `serde_json::Value` keeps only the last duplicate, so the keys are read
/// straight off the token stream instead. Text that is not a JSON object
/// yields an empty result; the schema check reports that case.
pub fn duplicate_keys(raw: &str) -> DuplicateKeys {
    serde_json::from_str::<DuplicateKeys>(raw).unwrap_or_default()
}

/// Item keys that occur more than once in the raw text.
pub fn duplicate_item_keys(raw: &str) -> Vec<ItemId> {
    duplicate_keys(raw).items
}

fn push_once<T: PartialEq>(found: &mut Vec<T>, key: T) {
    if !found.contains(&key) {
        found.push(key);
    }
}

impl<'de> Deserialize<'de> for DuplicateKeys {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = DuplicateKeys;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a category document object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<DuplicateKeys, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut seen = BTreeSet::new();
                let mut found = DuplicateKeys::default();
                while let Some(key) = map.next_key::<String>()? {
                    if key == "items" {
                        for dup in map.next_value::<RawKeys>()?.duplicates {
                            push_once(&mut found.items, dup);
                        }
                    } else {
                        map.next_value::<IgnoredAny>()?;
                    }
                    if !seen.insert(key.clone()) {
                        push_once(&mut found.fields, key);
                    }
                }
                Ok(found)
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

#[derive(Default)]
struct RawKeys {
    duplicates: Vec<ItemId>,
}

impl<'de> Deserialize<'de> for RawKeys {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeysVisitor;

        impl<'de> Visitor<'de> for KeysVisitor {
            type Value = RawKeys;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of items")
            }

            fn visit_map<A>(self, mut map: A) -> Result<RawKeys, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut seen = BTreeSet::new();
                let mut duplicates = Vec::new();
                while let Some(key) = map.next_key::<String>()? {
                    map.next_value::<IgnoredAny>()?;
                    if !seen.insert(key.clone()) {
                        push_once(&mut duplicates, ItemId(key));
                    }
                }
                Ok(RawKeys { duplicates })
            }
        }

        deserializer.deserialize_map(KeysVisitor)
    }
}
