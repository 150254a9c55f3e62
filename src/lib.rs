//! Shared library for the affiliate link catalogs.
//!
//! The crate exposes the v1 category document types, the publish layout,
//! the v2 converter and the conformance/revision checks used by the
//! `affiliate-links` binary. Public functions here form the contract the
//! binary and the integration tests depend on.

use anyhow::{Result, bail};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub mod catalog;
pub mod config;
pub mod conformance;
pub mod convert;
pub mod layout;
pub mod revision;
pub mod schema_loader;

pub use catalog::{
    Badge, CatalogRepository, CategoryDocument, CategoryId, CategoryIndex, ItemId, ItemRecord,
    LinkRecord, Retailer, load_document_from_path, save_document,
};
pub use config::{Config, resolve_config};
pub use conformance::{Violation, check_dir, check_document, check_file};
pub use convert::{ConversionSummary, ConvertOptions, convert_category, convert_dir, parse_v2};
pub use layout::{SchemaGeneration, category_path, category_url, list_category_files};
pub use revision::{RevisionReport, diff_documents, record_edit, record_edits, stale_items};
pub use schema_loader::{CategorySchema, default_category_schema};

pub const ROOT_ENV: &str = "AFFILIATE_LINKS_ROOT";

/// Returns true when `candidate` holds a published generation directory.
fn is_data_root(candidate: &Path, generation: SchemaGeneration) -> bool {
    candidate.join(generation.dir_name()).is_dir()
}

/// Verifies that an explicit root hint points at a real data root.
fn data_root_from_hint(hint: &str, generation: SchemaGeneration) -> Option<PathBuf> {
    if hint.is_empty() {
        return None;
    }
    let hint_path = PathBuf::from(hint);
    if !hint_path.exists() || !is_data_root(&hint_path, generation) {
        return None;
    }
    fs::canonicalize(hint_path).ok()
}

fn search_upwards(start: &Path, generation: SchemaGeneration) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        if is_data_root(&dir, generation) {
            return Some(dir);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Locate the directory holding the `v{major}/` category folders.
///
/// Honors `AFFILIATE_LINKS_ROOT` when it points at a real root, then climbs up
/// from the current directory, then falls back to the build-time hint. The
/// hint is `AFFILIATE_LINKS_ROOT_HINT` as set when the crate was built, else
/// the manifest directory; it only resolves when the tool is built inside a
/// catalog checkout that keeps `v1/` next to `Cargo.toml`.
pub fn find_data_root(generation: SchemaGeneration) -> Result<PathBuf> {
    if let Ok(env_root) = env::var(ROOT_ENV) {
        if let Some(root) = data_root_from_hint(&env_root, generation) {
            return Ok(root);
        }
        log::warn!("{ROOT_ENV}={env_root} has no {} directory; searching", generation.dir_name());
    }

    if let Ok(cwd) = env::current_dir() {
        if let Some(root) = search_upwards(&cwd, generation) {
            return Ok(root);
        }
    }

    if let Some(hint) = option_env!("AFFILIATE_LINKS_ROOT_HINT") {
        if let Some(root) = data_root_from_hint(hint, generation) {
            return Ok(root);
        }
    }

    bail!(
        "Unable to locate a data root with a {} directory. Set {ROOT_ENV} or pass --root.",
        generation.dir_name()
    );
}

/// Today's local date, used for `lastUpdated`.
pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
