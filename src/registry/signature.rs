//! Method signatures and their interned keys.

use super::interner::StringId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle of an interned signature inside one trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureId(pub(crate) u32);

impl SignatureId {
    /// Raw numeric value (stable for the lifetime of the owning trace)
    pub fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SignatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite key of a signature, built from the ids of its interned parts.
///
/// Deduplication happens on this key, so two signatures with identical
/// content always share one `SignatureId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureKey {
    pub return_type: StringId,
    pub package_name: StringId,
    pub class_name: StringId,
    pub method_name: StringId,
    pub parameter_types: Vec<StringId>,
}

impl SignatureKey {
    /// All string ids referenced by this key
    pub fn string_ids(&self) -> impl Iterator<Item = StringId> + '_ {
        [
            self.return_type,
            self.package_name,
            self.class_name,
            self.method_name,
        ]
        .into_iter()
        .chain(self.parameter_types.iter().copied())
    }
}

/// A resolved method signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub return_type: Option<String>,
    pub package_name: Option<String>,
    pub class_name: Option<String>,
    pub method_name: Option<String>,
    pub parameter_types: Vec<String>,

    /// Derived: the method is `<init>` or is named after its class
    pub is_constructor: bool,
}

impl Signature {
    /// Build a signature, deriving the constructor flag from the names
    pub fn new(
        return_type: Option<String>,
        package_name: Option<String>,
        class_name: Option<String>,
        method_name: Option<String>,
        parameter_types: Vec<String>,
    ) -> Self {
        let is_constructor = match (&method_name, &class_name) {
            (Some(method), _) if method == "<init>" => true,
            (Some(method), Some(class)) => method == class,
            _ => false,
        };

        Self {
            return_type,
            package_name,
            class_name,
            method_name,
            parameter_types,
            is_constructor,
        }
    }

    /// Fully qualified `package.Class` name, skipping absent parts
    pub fn qualified_class_name(&self) -> Option<String> {
        match (&self.package_name, &self.class_name) {
            (Some(pkg), Some(class)) if !pkg.is_empty() => Some(format!("{}.{}", pkg, class)),
            (_, Some(class)) => Some(class.clone()),
            (Some(pkg), None) => Some(pkg.clone()),
            (None, None) => None,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ret) = &self.return_type {
            write!(f, "{} ", ret)?;
        }
        if let Some(owner) = self.qualified_class_name() {
            write!(f, "{}.", owner)?;
        }
        write!(
            f,
            "{}({})",
            self.method_name.as_deref().unwrap_or("?"),
            self.parameter_types.join(", ")
        )
    }
}
