//! Revision tracking between two copies of the same category document.
//!
//! Editors bump `itemVersion` on the item they touched, bump the document
//! `version` once per save and keep `lastUpdated` from moving backwards. Consumers compare those counters
//! against their cached copy to decide what to refresh. Both sides of that
//! convention live here.

use crate::catalog::{CategoryDocument, ItemId};
use crate::conformance::Violation;
use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Clone, Debug, Default, Serialize)]
/// What changed between two revisions and which edit rules were broken.
pub struct RevisionReport {
    pub added: Vec<ItemId>,
    pub removed: Vec<ItemId>,
    pub changed: Vec<ItemId>,
    pub unchanged: Vec<ItemId>,
    pub violations: Vec<Violation>,
}

impl RevisionReport {
    /// True when any item was added, removed, or had its links edited.
    pub fn content_changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || !self.changed.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Compare `previous` with `next` and apply the version-bump rules.
///
/// An item counts as changed when its link list differs (order included,
/// since order encodes display priority).
pub fn diff_documents(previous: &CategoryDocument, next: &CategoryDocument) -> RevisionReport {
    let mut report = RevisionReport::default();

    if previous.category_id != next.category_id {
        report.violations.push(Violation::new(
            "categoryId",
            format!(
                "changed from '{}' to '{}'",
                previous.category_id, next.category_id
            ),
        ));
    }

    let ids: BTreeSet<&ItemId> = previous.items.keys().chain(next.items.keys()).collect();
    for id in ids {
        let at = format!("items/{}/itemVersion", id.0);
        match (previous.items.get(id), next.items.get(id)) {
            (None, Some(_)) => report.added.push(id.clone()),
            (Some(_), None) => report.removed.push(id.clone()),
            (Some(before), Some(after)) => {
                let links_changed = before.links != after.links;
                if after.item_version < before.item_version {
                    report.violations.push(Violation::new(
                        &at,
                        format!(
                            "decreased from {} to {}",
                            before.item_version, after.item_version
                        ),
                    ));
                } else if links_changed && after.item_version == before.item_version {
                    report.violations.push(Violation::new(
                        &at,
                        format!("links changed but stayed at {}", after.item_version),
                    ));
                } else if !links_changed && after.item_version != before.item_version {
                    report.violations.push(Violation::new(
                        &at,
                        format!(
                            "changed from {} to {} without a link change",
                            before.item_version, after.item_version
                        ),
                    ));
                }
                if links_changed {
                    report.changed.push(id.clone());
                } else {
                    report.unchanged.push(id.clone());
                }
            }
            (None, None) => {}
        }
    }

    let content_changed = report.content_changed();

    if next.version < previous.version {
        report.violations.push(Violation::new(
            "version",
            format!("decreased from {} to {}", previous.version, next.version),
        ));
    } else if content_changed && next.version == previous.version {
        report.violations.push(Violation::new(
            "version",
            format!("content changed but stayed at {}", next.version),
        ));
    }

    // Same-day saves keep the date; only a backwards move is flagged.
    if next.last_updated < previous.last_updated {
        report.violations.push(Violation::new(
            "lastUpdated",
            format!(
                "moved backwards from {} to {}",
                previous.last_updated, next.last_updated
            ),
        ));
    }

    report
}

/// Items a consumer holding `cached` must refresh after fetching `fetched`:
/// new, removed, or carrying a different `itemVersion`.
pub fn stale_items(cached: &CategoryDocument, fetched: &CategoryDocument) -> Vec<ItemId> {
    let ids: BTreeSet<&ItemId> = cached.items.keys().chain(fetched.items.keys()).collect();
    ids.into_iter()
        .filter(|id| {
            match (cached.items.get(*id), fetched.items.get(*id)) {
                (Some(before), Some(after)) => before.item_version != after.item_version,
                _ => true,
            }
        })
        .cloned()
        .collect()
}

/// Whether a fetched copy differs from the cached one at all.
pub fn needs_refresh(cached: &CategoryDocument, fetched: &CategoryDocument) -> bool {
    cached.version != fetched.version || !stale_items(cached, fetched).is_empty()
}

/// Record a document-level edit: bump `version` and move `lastUpdated` to
/// `today`. A `today` earlier than the stored date leaves the date alone.
pub fn record_document_edit(doc: &mut CategoryDocument, today: NaiveDate) {
    doc.version += 1;
    if today > doc.last_updated {
        doc.last_updated = today;
    }
}

/// Record an edit to one item's links: bump its `itemVersion` plus the
/// document-level counters.
pub fn record_edit(doc: &mut CategoryDocument, item_id: &ItemId, today: NaiveDate) -> Result<()> {
    record_edits(doc, std::slice::from_ref(item_id), today)
}

/// Record one save that touched several items.
///
/// Each distinct item gets a single `itemVersion` bump and the document
/// counters move once. Unknown ids fail before anything is modified.
pub fn record_edits(doc: &mut CategoryDocument, item_ids: &[ItemId], today: NaiveDate) -> Result<()> {
    let touched: BTreeSet<&ItemId> = item_ids.iter().collect();
    if touched.is_empty() {
        bail!("no items given for category '{}'", doc.category_id);
    }
    if let Some(missing) = touched.iter().find(|id| !doc.items.contains_key(**id)) {
        bail!("item '{}' not found in category '{}'", missing, doc.category_id);
    }

    for id in touched {
        if let Some(item) = doc.items.get_mut(id) {
            item.item_version += 1;
            log::info!(
                "[revision] {}/{} itemVersion -> {}",
                doc.category_id,
                id,
                item.item_version
            );
        }
    }
    record_document_edit(doc, today);
    Ok(())
}
