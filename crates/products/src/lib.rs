//! Products domain module.
//!
//! Product rules (validation, partial updates, filtering, statistics) plus the
//! storage port. No HTTP and no concrete storage live here.

pub mod catalog;
pub mod product;
pub mod query;
pub mod store;

pub use catalog::{Catalog, CatalogError};
pub use product::{NewProduct, Product, ProductDraft, ProductPatch};
pub use query::{ProductFilter, ProductStats};
pub use store::{ProductStore, ProductStoreError};
