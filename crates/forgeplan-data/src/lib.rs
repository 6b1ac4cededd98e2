//! Forgeplan Data -- catalog loading for the Forgeplan solver.
//!
//! Deserializes item/recipe/building catalogs produced by the external
//! game-data ingestion pipeline (JSON) and resolves them into the
//! immutable [`forgeplan_core::catalog::Catalog`] the solver consumes.

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, load_catalog_file, load_catalog_json};
