//! API clients for tvplay

pub mod catalog;

pub use catalog::{CatalogClient, CatalogError, StationCatalog};
