//! Type specification graph
//!
//! Every value kind (native or foreign) is described by a [`TypeSpec`]: a fully
//! qualified name plus an optional base type. Specs form singly-linked chains
//! that end at `System.Any` or at a spec without a base. The chains answer the
//! "is-a" question ([`TypeSpec::extends_name`]) and the "nearest common
//! ancestor" question ([`common_base_type`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Shared reference to a type specification
pub type TypeSpecRef = Arc<TypeSpec>;

/// Fully-qualified type name (`namespace.name`)
///
/// A name with an empty `name` component is anonymous. Anonymous names never
/// compare equal to anything, including another anonymous name, so the type
/// is deliberately not `PartialEq`; use [`FqTypeName::equal`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FqTypeName {
    namespace: String,
    name: String,
}

impl FqTypeName {
    /// Create a namespace-qualified name
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Create a name without namespace
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(String::new(), name)
    }

    /// Create an anonymous name
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Parse `Namespace.Name` or a bare `Name`
    ///
    /// Only the last dot separates the namespace, so `a.b.C` has namespace `a.b`.
    pub fn parse(value: &str) -> Self {
        match value.rfind('.') {
            Some(idx) => Self::new(&value[..idx], &value[idx + 1..]),
            None => Self::bare(value),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_namespace(&self) -> bool {
        !self.namespace.is_empty()
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    /// Exact equality of the rendered names; anonymous names never match
    pub fn equal(&self, other: &FqTypeName) -> bool {
        !self.is_anonymous()
            && !other.is_anonymous()
            && self.namespace == other.namespace
            && self.name == other.name
    }

    /// Match against a possibly bare target name
    ///
    /// A bare target matches on the name component alone.
    fn matches(&self, target: &FqTypeName) -> bool {
        if self.is_anonymous() || target.is_anonymous() {
            return false;
        }
        if target.has_namespace() {
            self.equal(target)
        } else {
            self.name == target.name
        }
    }
}

impl fmt::Display for FqTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anonymous() {
            Ok(())
        } else if self.has_namespace() {
            write!(f, "{}.{}", self.namespace, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Type specification: a fully-qualified name and an optional base
#[derive(Debug)]
pub struct TypeSpec {
    fq_name: FqTypeName,
    base: Option<TypeSpecRef>,
}

impl TypeSpec {
    /// Create a new shared type specification
    pub fn new(fq_name: FqTypeName, base: Option<TypeSpecRef>) -> TypeSpecRef {
        Arc::new(Self { fq_name, base })
    }

    /// Create a spec that is unrelated to every other spec
    pub fn anonymous() -> TypeSpecRef {
        Self::new(FqTypeName::anonymous(), None)
    }

    /// Fully-qualified name of this spec (`None` when anonymous)
    pub fn fq_name(&self) -> Option<&FqTypeName> {
        if self.fq_name.is_anonymous() {
            None
        } else {
            Some(&self.fq_name)
        }
    }

    /// Base type, if any
    pub fn base(&self) -> Option<&TypeSpecRef> {
        self.base.as_ref()
    }

    /// Rendered qualified name, empty for anonymous specs
    pub fn qualified_name(&self) -> String {
        self.fq_name.to_string()
    }

    /// Check whether this spec or one of its ancestors carries `name`
    ///
    /// A bare `name` matches any ancestor with the same name component,
    /// whatever its namespace.
    pub fn extends_name(&self, name: &FqTypeName) -> bool {
        let mut current = Some(self);
        while let Some(spec) = current {
            if spec.fq_name.matches(name) {
                return true;
            }
            current = spec.base.as_deref();
        }
        false
    }

    /// Exact fully-qualified type equality
    pub fn equal_type(&self, other: &TypeSpec) -> bool {
        self.fq_name.equal(&other.fq_name)
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fq_name)
    }
}

fn chain(spec: &TypeSpecRef) -> Vec<TypeSpecRef> {
    let mut result = Vec::new();
    let mut current = Some(spec.clone());
    while let Some(s) = current {
        current = s.base.clone();
        result.push(s);
    }
    result
}

/// Nearest common ancestor of two specs
///
/// Walks both chains pairwise and returns the first structurally equal pair.
/// Since every spec has at most one base, each chain is ordered from most to
/// least specific and the first match is the nearest one.
pub fn common_base_type(a: &TypeSpecRef, b: &TypeSpecRef) -> Option<TypeSpecRef> {
    let b_chain = chain(b);
    for ancestor in chain(a) {
        if b_chain.iter().any(|other| ancestor.equal_type(other)) {
            log::trace!("common base of {} and {} is {}", a, b, ancestor);
            return Some(ancestor);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hierarchy() -> (TypeSpecRef, TypeSpecRef, TypeSpecRef, TypeSpecRef, TypeSpecRef) {
        let root = TypeSpec::new(FqTypeName::new("Test", "Root"), None);
        let mid = TypeSpec::new(FqTypeName::new("Test", "Mid"), Some(root.clone()));
        let leaf = TypeSpec::new(FqTypeName::new("Test", "Leaf"), Some(mid.clone()));
        let sibling = TypeSpec::new(FqTypeName::new("Test", "Sibling"), Some(root.clone()));
        let cousin = TypeSpec::new(FqTypeName::new("Test", "Cousin"), Some(mid.clone()));
        (root, mid, leaf, sibling, cousin)
    }

    #[test]
    fn test_fq_name_parse_and_display() {
        let name = FqTypeName::parse("System.Integer");
        assert_eq!(name.namespace(), "System");
        assert_eq!(name.name(), "Integer");
        assert_eq!(name.to_string(), "System.Integer");

        let bare = FqTypeName::parse("Integer");
        assert!(!bare.has_namespace());
        assert_eq!(bare.to_string(), "Integer");
    }

    #[test]
    fn test_anonymous_names_never_equal() {
        assert!(!FqTypeName::anonymous().equal(&FqTypeName::anonymous()));
        assert!(!TypeSpec::anonymous().equal_type(&TypeSpec::anonymous()));
        assert_eq!(TypeSpec::anonymous().qualified_name(), "");
        assert!(TypeSpec::anonymous().fq_name().is_none());
    }

    #[test]
    fn test_extends_name_is_transitive() {
        let (root, _, leaf, _, _) = hierarchy();
        assert!(leaf.extends_name(&FqTypeName::new("Test", "Root")));
        assert!(leaf.extends_name(&FqTypeName::bare("Mid")));
        assert!(leaf.extends_name(&FqTypeName::bare("Leaf")));
        assert!(!leaf.extends_name(&FqTypeName::new("Other", "Root")));
        assert!(!root.extends_name(&FqTypeName::bare("Leaf")));
    }

    #[test]
    fn test_common_base_type() {
        let (root, mid, leaf, sibling, cousin) = hierarchy();

        let common = common_base_type(&leaf, &sibling).unwrap();
        assert!(common.equal_type(&root));

        let common = common_base_type(&leaf, &cousin).unwrap();
        assert!(common.equal_type(&mid));

        let common = common_base_type(&leaf, &leaf).unwrap();
        assert!(common.equal_type(&leaf));

        let unrelated = TypeSpec::new(FqTypeName::new("Other", "Thing"), None);
        assert!(common_base_type(&leaf, &unrelated).is_none());
    }
}
