//! Ordered collections of native values and foreign nodes

use crate::adapter::ModelAdapter;
use crate::equality::{Equality, model_equal, model_equivalent};
use crate::system_types::{DataType, any_type_spec};
use crate::type_spec::{TypeSpecRef, common_base_type};
use crate::value::{Item, Value, ValueAccessor};
use octofhir_fhirpath_diagnostics::{FhirPathError, Result};
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;

static EMPTY: Lazy<Collection> = Lazy::new(Collection::new);

/// Bulk insertion failure
///
/// Items inserted before the failing one stay in the collection; the caller
/// decides whether to keep or discard it.
#[derive(Debug, thiserror::Error)]
#[error("{error} ({added} items added before the failure)")]
pub struct PartialAddError {
    /// Items actually added before the failure
    pub added: usize,
    /// Conversion failure of the offending item
    #[source]
    pub error: FhirPathError,
}

/// Append-only ordered collection
///
/// Entries are native values, foreign nodes the adapter could not convert, or
/// nil. The item type follows the inserted items: it is the nearest common
/// base type of everything added so far.
#[derive(Clone, Default)]
pub struct Collection {
    items: Vec<Option<Item>>,
    item_type_spec: Option<TypeSpecRef>,
    adapter: Option<Arc<dyn ModelAdapter>>,
}

impl Collection {
    /// Create a collection without model adapter
    ///
    /// Only native values can be added to it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection converting foreign nodes through `adapter`
    pub fn with_adapter(adapter: Arc<dyn ModelAdapter>) -> Self {
        Self {
            adapter: Some(adapter),
            ..Self::default()
        }
    }

    /// Declare the item type up front
    pub fn with_item_type(mut self, spec: TypeSpecRef) -> Self {
        self.item_type_spec = Some(spec);
        self
    }

    /// Create a collection of native values
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        let mut collection = Self::new();
        for value in values {
            collection.push(Item::Native(value));
        }
        collection
    }

    /// Process-wide empty collection
    pub fn empty() -> &'static Collection {
        &EMPTY
    }

    pub fn adapter(&self) -> Option<&Arc<dyn ModelAdapter>> {
        self.adapter.as_ref()
    }

    /// Nearest common base type of the items, `None` before the first typed
    /// insertion
    pub fn item_type_spec(&self) -> Option<&TypeSpecRef> {
        self.item_type_spec.as_ref()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries in insertion order; nil entries are `None`
    pub fn iter(&self) -> impl Iterator<Item = Option<&Item>> {
        self.items.iter().map(Option::as_ref)
    }

    /// Native values in insertion order, skipping nil and foreign entries
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.items.iter().flatten().filter_map(Item::as_native)
    }

    fn convert(&self, item: Item) -> Result<Item> {
        match item {
            Item::Native(_) => Ok(item),
            Item::Foreign(node) => {
                let adapter = self.adapter.as_ref().ok_or_else(FhirPathError::missing_adapter)?;
                let converted = adapter.convert_to_native(&node)?;
                log::debug!(
                    "converted foreign node to {}",
                    if converted.is_native() { "a native value" } else { "a foreign item" }
                );
                Ok(converted)
            }
        }
    }

    fn push(&mut self, item: Item) {
        let spec = item.type_spec(self.adapter.as_deref());
        self.item_type_spec = Some(match self.item_type_spec.take() {
            None => spec,
            Some(current) => common_base_type(&current, &spec).unwrap_or_else(any_type_spec),
        });
        self.items.push(Some(item));
    }

    /// Append an item, converting foreign nodes to native values first
    ///
    /// Fails when a foreign node is added without a model adapter or the
    /// adapter cannot convert it.
    pub fn add(&mut self, item: impl Into<Item>) -> Result<()> {
        let item = self.convert(item.into())?;
        self.push(item);
        Ok(())
    }

    /// Append a nil entry
    pub fn add_nil(&mut self) {
        self.items.push(None);
    }

    /// Append an item unless an equal one is already present
    ///
    /// Returns whether the item was added.
    pub fn add_unique(&mut self, item: impl Into<Item>) -> Result<bool> {
        let item = self.convert(item.into())?;
        if self.contains_item(Some(&item)) {
            return Ok(false);
        }
        self.push(item);
        Ok(true)
    }

    /// Append every item, stopping at the first conversion failure
    pub fn add_all<I>(&mut self, items: I) -> std::result::Result<usize, PartialAddError>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        let mut added = 0;
        for item in items {
            if let Err(error) = self.add(item) {
                log::warn!("bulk insertion stopped after {} items: {}", added, error);
                return Err(PartialAddError { added, error });
            }
            added += 1;
        }
        Ok(added)
    }

    /// Append every item not yet present, stopping at the first conversion
    /// failure
    ///
    /// Counts only the items actually added.
    pub fn add_all_unique<I>(&mut self, items: I) -> std::result::Result<usize, PartialAddError>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        let mut added = 0;
        for item in items {
            match self.add_unique(item) {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(error) => {
                    log::warn!("bulk insertion stopped after {} items: {}", added, error);
                    return Err(PartialAddError { added, error });
                }
            }
        }
        Ok(added)
    }

    /// Entry at `index`; `None` for a nil entry
    ///
    /// # Panics
    ///
    /// Panics when the collection is empty or `index` is out of bounds.
    pub fn get(&self, index: usize) -> Option<&Item> {
        match self.try_get(index) {
            Ok(item) => item,
            Err(error) => panic!("{}", error),
        }
    }

    /// Entry at `index`, failing instead of panicking
    pub fn try_get(&self, index: usize) -> Result<Option<&Item>> {
        if self.items.is_empty() {
            return Err(FhirPathError::empty_access(format!(
                "cannot access index {} of an empty collection",
                index
            )));
        }
        self.items
            .get(index)
            .map(Option::as_ref)
            .ok_or_else(|| FhirPathError::index_out_of_range(index, self.items.len()))
    }

    /// Check whether a native value equal to `value` is present
    pub fn contains(&self, value: &Value) -> bool {
        self.values().any(|v| v.equal(value))
    }

    fn contains_item(&self, item: Option<&Item>) -> bool {
        let adapter = self.adapter.as_deref();
        self.items.iter().any(|i| model_equal(i.as_ref(), item, adapter))
    }

    /// Same length and pairwise equal entries at identical positions
    pub fn equal(&self, other: &Collection) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.is_empty() && other.is_empty();
        }
        let adapter = self.adapter.as_deref().or(other.adapter.as_deref());
        self.items.len() == other.items.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| model_equal(a, b, adapter))
    }

    /// Same length and pairwise equivalent entries at identical positions
    pub fn equivalent(&self, other: &Collection) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.is_empty() && other.is_empty();
        }
        let adapter = self.adapter.as_deref().or(other.adapter.as_deref());
        self.items.len() == other.items.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| model_equivalent(a, b, adapter))
    }
}

impl ValueAccessor for Collection {
    fn data_type(&self) -> DataType {
        DataType::Collection
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("items", &self.items)
            .field("item_type_spec", &self.item_type_spec)
            .field("adapter", &self.adapter.is_some())
            .finish()
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, item) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match item {
                None => write!(f, "null")?,
                Some(Item::Native(value)) => write!(f, "{}", value)?,
                Some(Item::Foreign(_)) => {
                    let spec = item.map(|i| i.type_spec(self.adapter.as_deref()));
                    write!(f, "<{}>", spec.map(|s| s.qualified_name()).unwrap_or_default())?
                }
            }
        }
        write!(f, "}}")
    }
}

impl FromIterator<Value> for Collection {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self::from_values(iter)
    }
}
