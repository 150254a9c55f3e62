//! Holds the category documents of one schema generation for lookup by id.
//!
//! Documents stay independent; the repository only saves callers from
//! re-reading files when they need several categories at once.

use crate::catalog::identity::{CategoryId, ItemId};
use crate::catalog::index::CategoryIndex;
use crate::catalog::model::{CategoryDocument, ItemRecord};
use crate::layout::list_category_files;
use crate::schema_loader::CategorySchema;
use anyhow::{Result, bail};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Default)]
/// In-memory store of category documents keyed by `CategoryId`.
pub struct CatalogRepository {
    categories: BTreeMap<CategoryId, CategoryDocument>,
}

impl CatalogRepository {
    /// Load every category file in a generation directory.
    ///
    /// Each file goes through `CategoryIndex::load`, so one bad file fails the
    /// whole load.
    pub fn load_dir(dir: &Path, schema: &CategorySchema) -> Result<Self> {
        let mut repo = Self::default();
        for path in list_category_files(dir)? {
            let index = CategoryIndex::load(&path, schema)?;
            repo.register(index.into_document())?;
        }
        Ok(repo)
    }

    /// Register a document; a second document with the same id is rejected.
    pub fn register(&mut self, document: CategoryDocument) -> Result<()> {
        if self.categories.contains_key(&document.category_id) {
            bail!("category {} registered twice", document.category_id);
        }
        self.categories
            .insert(document.category_id.clone(), document);
        Ok(())
    }

    pub fn get(&self, id: &CategoryId) -> Option<&CategoryDocument> {
        self.categories.get(id)
    }

    /// Resolve an item inside a registered category.
    pub fn find_item(&self, category: &CategoryId, item: &ItemId) -> Option<&ItemRecord> {
        self.get(category)?.item(item)
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategoryId> {
        self.categories.keys()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
