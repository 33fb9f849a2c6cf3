//! # UMUD - Universal Musculoskeletal Ultrasound Database catalog
//!
//! Validates metadata contributed for musculoskeletal ultrasound datasets and
//! serves the resulting catalog for browsing, filtering and charting.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Form / JSON │────▶│  Validator  │────▶│    Store    │
//! │ submission  │     │(field table)│     │ (JSON docs) │
//! └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                │ snapshot
//!                     ┌─────────────┐     ┌──────▼──────┐
//!                     │ CSV / charts│◀────│Query Engine │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use serde_json::json;
//! use umud::{validate, Catalog, JsonDirStore};
//!
//! let record = validate(&raw_form_input).map_err(umud::ValidationFailure)?;
//!
//! let store = JsonDirStore::with_dir(".umud/datasets");
//! let catalog = Catalog::new(&store);
//! let soleus = catalog.filter(&json!({ "muscle": "Soleus" }).as_object().cloned().unwrap_or_default())?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`vocab`] - Closed vocabularies
//! - [`models`] - Record model and field enumeration
//! - [`schema`] - Declarative field table
//! - [`validation`] - Record validation and normalization
//! - [`catalog`] - Filtering and aggregation
//! - [`store`] - Document stores
//! - [`export`] - JSON / CSV / e-mail artifacts
//! - [`config`] - Runtime configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;
pub mod vocab;

// Validation
pub mod schema;
pub mod validation;

// Querying and storage
pub mod catalog;
pub mod store;

// Artifacts
pub mod export;

// Runtime
pub mod config;

// HTTP API
pub mod api;

#[cfg(test)]
mod fixtures;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CatalogError, CatalogResult, ExportError, ExportResult, FieldError, Rule, ServerError,
    ServerResult, StoreError, StoreResult, ValidationFailure,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{DatasetMetadataRecord, Field, FieldValue};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use schema::{describe, FieldDescription, FieldKind, FieldSpec, FIELDS};
pub use validation::{is_valid, validate, validate_many};

// =============================================================================
// Re-exports - Catalog
// =============================================================================

pub use catalog::{
    criteria_from_pairs, distinct_values, filter_records, group_count, histogram, Catalog,
    Criteria, GroupCounts, Histogram,
};
pub use store::{CatalogStore, JsonDirStore, MemoryStore};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{mailto_link, records_to_csv, to_json_sidecar};

// =============================================================================
// Re-exports - Runtime
// =============================================================================

pub use api::server::start_server;
pub use config::Config;
