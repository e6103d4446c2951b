//! Bridge to foreign data models

use crate::collection::Collection;
use crate::type_spec::{FqTypeName, TypeSpecRef};
use crate::value::{ForeignNode, Item};
use octofhir_fhirpath_diagnostics::Result;

/// Model adapter connecting foreign nodes to the native value model
///
/// The value model calls into the adapter wherever it meets a node it did not
/// construct itself: collection insertion, cross-model equality and casting.
/// Nothing is assumed about the foreign representation beyond this contract.
pub trait ModelAdapter: Send + Sync {
    /// Convert a node into a native value when it has a native counterpart
    ///
    /// Nodes without one (complex elements, resources) are returned as
    /// [`Item::Foreign`].
    fn convert_to_native(&self, node: &ForeignNode) -> Result<Item>;

    /// Type specification of a node
    fn type_spec(&self, node: &ForeignNode) -> TypeSpecRef;

    /// Cast a node to the named type; `Ok(None)` when it is not of that type
    fn cast(&self, node: &ForeignNode, type_name: &FqTypeName) -> Result<Option<Item>>;

    /// Structural equality of two nodes
    fn equal(&self, left: &ForeignNode, right: &ForeignNode) -> bool;

    /// Fuzzy equality of two nodes
    fn equivalent(&self, left: &ForeignNode, right: &ForeignNode) -> bool;

    /// Child reached through the named field; `Ok(None)` when absent
    fn navigate(&self, node: &ForeignNode, field: &str) -> Result<Option<Item>>;

    /// All children of a node, in document order
    fn children(&self, node: &ForeignNode) -> Result<Collection>;
}
