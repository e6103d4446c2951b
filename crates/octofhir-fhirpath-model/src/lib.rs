//! Model adapters for the FHIRPath value model
//!
//! [`JsonModelAdapter`] exposes FHIR resources held as `serde_json::Value`
//! documents to collections and equality checks of
//! `octofhir-fhirpath-types`.

pub mod json;

pub use json::{FHIR_NAMESPACE, JsonModelAdapter};
