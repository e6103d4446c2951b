//! Two-tier equality protocol and tri-state comparison
//!
//! Every native value kind answers two predicates:
//! - [`Equality::equal`]: exact, precision-sensitive equality
//! - [`Equality::equivalent`]: fuzzy equality (case, whitespace, precision and
//!   unit tolerant)
//!
//! Ordering goes through [`Ordered::compare`], which distinguishes a computed
//! order from an undecidable one and from incompatible operand kinds.

use crate::adapter::ModelAdapter;
use crate::value::{Item, Value};
use std::cmp::Ordering;

/// Result of comparing two values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// A definite order was computed
    Evaluated(Ordering),
    /// Operands are not order-comparable in this instance; the caller must
    /// propagate "unknown"
    Empty,
    /// Operand kinds are fundamentally incompatible
    Inconvertible,
}

impl Comparison {
    /// Definite ordering, if one was computed
    pub fn ordering(&self) -> Option<Ordering> {
        match self {
            Self::Evaluated(ordering) => Some(*ordering),
            _ => None,
        }
    }

    pub fn is_evaluated(&self) -> bool {
        matches!(self, Self::Evaluated(_))
    }

    /// Map an optional ordering, treating `None` as undecidable
    pub fn from_partial(ordering: Option<Ordering>) -> Self {
        ordering.map_or(Self::Empty, Self::Evaluated)
    }

    /// Swap operand roles
    pub fn reverse(self) -> Self {
        match self {
            Self::Evaluated(ordering) => Self::Evaluated(ordering.reverse()),
            other => other,
        }
    }
}

/// Exact and fuzzy equality against any native value
pub trait Equality {
    /// Structural, precision-exact equality
    fn equal(&self, other: &Value) -> bool;

    /// Fuzzy equality
    fn equivalent(&self, other: &Value) -> bool;
}

/// Ordering against any native value
pub trait Ordered {
    fn compare(&self, other: &Value) -> Comparison;
}

/// Exact equality of two collection entries
///
/// Both nil is equal, one nil is not. Native pairs use the value protocol,
/// foreign pairs the model adapter (identity when none is available), and
/// mixed native/foreign pairs are never equal.
pub fn model_equal(a: Option<&Item>, b: Option<&Item>, adapter: Option<&dyn ModelAdapter>) -> bool {
    match (a, b) {
        (None, None) => true,
        (None, Some(_)) | (Some(_), None) => false,
        (Some(Item::Native(a)), Some(Item::Native(b))) => a.equal(b),
        (Some(Item::Foreign(a)), Some(Item::Foreign(b))) => match adapter {
            Some(adapter) => adapter.equal(a, b),
            None => a.ptr_eq(b),
        },
        _ => false,
    }
}

/// Fuzzy equality of two collection entries, dispatched like [`model_equal`]
pub fn model_equivalent(
    a: Option<&Item>,
    b: Option<&Item>,
    adapter: Option<&dyn ModelAdapter>,
) -> bool {
    match (a, b) {
        (None, None) => true,
        (None, Some(_)) | (Some(_), None) => false,
        (Some(Item::Native(a)), Some(Item::Native(b))) => a.equivalent(b),
        (Some(Item::Foreign(a)), Some(Item::Foreign(b))) => match adapter {
            Some(adapter) => adapter.equivalent(a, b),
            None => a.ptr_eq(b),
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ForeignNode;

    #[test]
    fn test_comparison_helpers() {
        assert_eq!(Comparison::from_partial(None), Comparison::Empty);
        assert_eq!(
            Comparison::Evaluated(Ordering::Less).reverse(),
            Comparison::Evaluated(Ordering::Greater)
        );
        assert_eq!(Comparison::Inconvertible.reverse(), Comparison::Inconvertible);
        assert!(Comparison::Evaluated(Ordering::Equal).is_evaluated());
        assert_eq!(Comparison::Empty.ordering(), None);
    }

    #[test]
    fn test_nil_dispatch() {
        let a = Item::from(Value::string("a"));
        assert!(model_equal(None, None, None));
        assert!(!model_equal(Some(&a), None, None));
        assert!(!model_equivalent(None, Some(&a), None));
        assert!(model_equal(Some(&a), Some(&a), None));
    }

    #[test]
    fn test_mixed_is_never_equal() {
        let native = Item::from(Value::boolean(true));
        let foreign = Item::Foreign(ForeignNode::new(true));
        assert!(!model_equal(Some(&native), Some(&foreign), None));
        assert!(!model_equivalent(Some(&foreign), Some(&native), None));
    }

    #[test]
    fn test_foreign_without_adapter_uses_identity() {
        let node = ForeignNode::new(42_u8);
        let same = Item::Foreign(node.clone());
        let other = Item::Foreign(ForeignNode::new(42_u8));
        assert!(model_equal(Some(&Item::Foreign(node)), Some(&same), None));
        assert!(!model_equal(Some(&same), Some(&other), None));
    }
}
