//! Category document wiring.
//!
//! Types here mirror `schema/category_v1.schema.json`; callers use
//! `CategoryIndex` for a validated single-file load and `CatalogRepository`
//! when several categories are needed at once.

pub mod identity;
pub mod index;
pub mod model;
pub mod repository;

pub use identity::{Badge, CategoryId, ItemId, Retailer};
pub use index::CategoryIndex;
pub use model::{CategoryDocument, ItemRecord, LinkRecord};
pub use repository::CatalogRepository;

pub use model::{load_document_from_path, save_document};
