//! Indexed, validated view of one category document.
//!
//! Loading is strict: the file must pass the JSON Schema, its `categoryId`
//! must match the file name, it must contain items, and every conformance
//! rule must hold. Consumers of a `CategoryIndex` never see a document that a
//! client would choke on.

use crate::catalog::{CategoryDocument, CategoryId, ItemId, ItemRecord, LinkRecord};
use crate::conformance::{check_document, duplicate_keys};
use crate::layout::category_id_from_path;
use crate::schema_loader::CategorySchema;
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::fs;
use std::path::Path;

#[derive(Debug)]
/// A category document plus its links ordered for display.
pub struct CategoryIndex {
    document: CategoryDocument,
}

impl CategoryIndex {
    /// Load and validate a document from disk.
    pub fn load(path: &Path, schema: &CategorySchema) -> Result<Self> {
        let data =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let value: Value =
            serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;

        if let Err(errors) = schema.validate(&value) {
            bail!(
                "category document {} failed schema validation:\n{}",
                path.display(),
                errors.join("\n")
            );
        }

        let duplicates = duplicate_keys(&data);
        if let Some(field) = duplicates.fields.first() {
            bail!("duplicate field '{}' in {}", field, path.display());
        }
        if let Some(dup) = duplicates.items.first() {
            bail!("duplicate item id {} in {}", dup, path.display());
        }

        let document: CategoryDocument = serde_json::from_value(value)
            .with_context(|| format!("loading {}", path.display()))?;

        if let Some(stem) = category_id_from_path(path) {
            if stem != document.category_id {
                bail!(
                    "{} declares categoryId '{}' but is named '{}'",
                    path.display(),
                    document.category_id,
                    stem
                );
            }
        }

        Self::from_document(document).with_context(|| format!("validating {}", path.display()))
    }

    /// Validate an in-memory document.
    pub fn from_document(document: CategoryDocument) -> Result<Self> {
        if document.items.is_empty() {
            bail!("category {} contains no items", document.category_id);
        }
        let violations = check_document(&document);
        if !violations.is_empty() {
            let details = violations
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("\n");
            bail!("category {} is not conformant:\n{details}", document.category_id);
        }
        Ok(Self { document })
    }

    pub fn id(&self) -> &CategoryId {
        &self.document.category_id
    }

    /// Resolve an item by id.
    ///
    /// Returns `None` instead of erroring; callers report the missing id with
    /// their own context.
    pub fn item(&self, id: &ItemId) -> Option<&ItemRecord> {
        self.document.item(id)
    }

    /// Item ids in stable order.
    pub fn ids(&self) -> impl Iterator<Item = &ItemId> {
        self.document.item_ids()
    }

    /// Links for an item in display order (ascending priority).
    pub fn ranked_links(&self, id: &ItemId) -> Option<Vec<&LinkRecord>> {
        self.item(id).map(ItemRecord::ordered_links)
    }

    pub fn document(&self) -> &CategoryDocument {
        &self.document
    }

    pub fn into_document(self) -> CategoryDocument {
        self.document
    }
}
