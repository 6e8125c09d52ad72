//! Per-trace interning of strings and signatures.
//!
//! Ids are assigned sequentially and backed by a content -> id map, so two
//! different strings can never share an id even when their hashes collide.
//! The hasher is a type parameter only so that tests can force collisions.

use super::signature::{Signature, SignatureId, SignatureKey};
use crate::utils::error::{ModelError, ModelResult};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, BuildHasherDefault};

/// Default hasher of the interning tables
pub type FxBuildHasher = BuildHasherDefault<FxHasher>;

/// Opaque handle of an interned string inside one trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringId(pub(crate) u32);

impl StringId {
    /// Raw numeric value (stable for the lifetime of the owning trace)
    pub fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Interning registry owned by exactly one trace
///
/// **Public** - used by the model while building and by the codec
#[derive(Debug, Clone, Default)]
pub struct Registry<S = FxBuildHasher> {
    /// Interned strings, indexed by `StringId`
    strings: Vec<Option<String>>,

    /// Content -> id for present strings
    string_ids: HashMap<String, StringId, S>,

    /// Id of the absent string, once registered
    null_id: Option<StringId>,

    /// Interned signature keys, indexed by `SignatureId`
    signatures: Vec<SignatureKey>,

    /// Key -> id
    signature_ids: HashMap<SignatureKey, SignatureId, S>,
}

impl Registry<FxBuildHasher> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: BuildHasher + Default> Registry<S> {
    /// Create an empty registry with a specific hasher
    pub fn with_hasher() -> Self {
        Self {
            strings: Vec::new(),
            string_ids: HashMap::default(),
            null_id: None,
            signatures: Vec::new(),
            signature_ids: HashMap::default(),
        }
    }

    /// Rebuild a registry from its tables, preserving every id.
    ///
    /// Fails if a table contains duplicates or a signature references an
    /// unknown string.
    pub fn from_tables(
        strings: Vec<Option<String>>,
        signatures: Vec<SignatureKey>,
    ) -> ModelResult<Self> {
        let mut registry = Self::with_hasher();

        for value in strings {
            let expected = StringId(registry.strings.len() as u32);
            if registry.register_string(value.as_deref()) != expected {
                return Err(ModelError::invalid_state(format!(
                    "duplicate string table entry at {}",
                    expected
                )));
            }
        }

        for key in signatures {
            if let Some(unknown) = key.string_ids().find(|id| id.index() >= registry.strings.len()) {
                return Err(ModelError::NotRegistered {
                    kind: "string",
                    id: unknown.raw(),
                });
            }
            let expected = SignatureId(registry.signatures.len() as u32);
            if registry.intern_key(key) != expected {
                return Err(ModelError::invalid_state(format!(
                    "duplicate signature table entry at {}",
                    expected
                )));
            }
        }

        Ok(registry)
    }

    /// Register a string (or its absence) and return its id.
    ///
    /// Equal inputs always yield the same id.
    pub fn register_string(&mut self, value: Option<&str>) -> StringId {
        if let Some(id) = self.find_string(value) {
            return id;
        }

        let id = StringId(self.strings.len() as u32);
        match value {
            Some(s) => {
                self.string_ids.insert(s.to_string(), id);
            }
            None => self.null_id = Some(id),
        }
        self.strings.push(value.map(str::to_string));
        id
    }

    /// Look up the id of a string without registering it
    pub fn find_string(&self, value: Option<&str>) -> Option<StringId> {
        match value {
            Some(s) => self.string_ids.get(s).copied(),
            None => self.null_id,
        }
    }

    /// Resolve a string id.
    ///
    /// # Errors
    /// * `ModelError::NotRegistered` - id unknown to this registry
    pub fn resolve_string(&self, id: StringId) -> ModelResult<Option<&str>> {
        self.strings
            .get(id.index())
            .map(Option::as_deref)
            .ok_or(ModelError::NotRegistered {
                kind: "string",
                id: id.raw(),
            })
    }

    /// Register a signature; every part is interned as a string first.
    pub fn register_signature<I, T>(
        &mut self,
        return_type: Option<&str>,
        package_name: Option<&str>,
        class_name: Option<&str>,
        method_name: Option<&str>,
        parameter_types: I,
    ) -> SignatureId
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let key = SignatureKey {
            return_type: self.register_string(return_type),
            package_name: self.register_string(package_name),
            class_name: self.register_string(class_name),
            method_name: self.register_string(method_name),
            parameter_types: parameter_types
                .into_iter()
                .map(|p| self.register_string(Some(p.as_ref())))
                .collect(),
        };

        self.intern_key(key)
    }

    fn intern_key(&mut self, key: SignatureKey) -> SignatureId {
        if let Some(id) = self.signature_ids.get(&key) {
            return *id;
        }

        let id = SignatureId(self.signatures.len() as u32);
        self.signatures.push(key.clone());
        self.signature_ids.insert(key, id);
        id
    }

    /// Interned key of a signature
    pub fn signature_key(&self, id: SignatureId) -> ModelResult<&SignatureKey> {
        self.signatures
            .get(id.index())
            .ok_or(ModelError::NotRegistered {
                kind: "signature",
                id: id.raw(),
            })
    }

    /// Resolve a signature id into its content.
    ///
    /// # Errors
    /// * `ModelError::NotRegistered` - the signature or one of its strings is unknown
    pub fn resolve_signature(&self, id: SignatureId) -> ModelResult<Signature> {
        let key = self.signature_key(id)?;
        let owned = |sid: StringId| -> ModelResult<Option<String>> {
            Ok(self.resolve_string(sid)?.map(str::to_string))
        };

        let mut parameter_types = Vec::with_capacity(key.parameter_types.len());
        for pid in &key.parameter_types {
            parameter_types.push(owned(*pid)?.unwrap_or_default());
        }

        Ok(Signature::new(
            owned(key.return_type)?,
            owned(key.package_name)?,
            owned(key.class_name)?,
            owned(key.method_name)?,
            parameter_types,
        ))
    }

    /// Number of interned strings (including the absent string, if registered)
    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    /// Number of interned signatures
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    /// String table in id order
    pub fn strings(&self) -> &[Option<String>] {
        &self.strings
    }

    /// Signature table in id order
    pub fn signature_keys(&self) -> &[SignatureKey] {
        &self.signatures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_string_idempotent() {
        let mut reg = Registry::new();
        let a = reg.register_string(Some("checkout"));
        let b = reg.register_string(Some("checkout"));
        let c = reg.register_string(Some("pay"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(reg.string_count(), 2);
        assert_eq!(reg.resolve_string(c).unwrap(), Some("pay"));
    }

    #[test]
    fn test_absent_string_has_stable_id() {
        let mut reg = Registry::new();
        let none1 = reg.register_string(None);
        let empty = reg.register_string(Some(""));
        let none2 = reg.register_string(None);

        assert_eq!(none1, none2);
        assert_ne!(none1, empty);
        assert_eq!(reg.resolve_string(none1).unwrap(), None);
        assert_eq!(reg.resolve_string(empty).unwrap(), Some(""));
    }

    #[test]
    fn test_resolve_unknown_string() {
        let reg = Registry::new();
        let err = reg.resolve_string(StringId(7)).unwrap_err();
        assert_eq!(err, ModelError::NotRegistered { kind: "string", id: 7 });
    }

    #[test]
    fn test_signature_dedup_on_content() {
        let mut reg = Registry::new();
        let a = reg.register_signature(Some("void"), Some("org"), Some("A"), Some("run"), ["int"]);
        let b = reg.register_signature(Some("void"), Some("org"), Some("A"), Some("run"), vec!["int".to_string()]);
        let c = reg.register_signature(Some("void"), Some("org"), Some("A"), Some("run"), ["long"]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(reg.signature_count(), 2);

        let sig = reg.resolve_signature(c).unwrap();
        assert_eq!(sig.method_name.as_deref(), Some("run"));
        assert_eq!(sig.parameter_types, vec!["long".to_string()]);
    }

    #[test]
    fn test_from_tables_rejects_duplicates() {
        let strings = vec![Some("a".to_string()), Some("a".to_string())];
        assert!(Registry::<FxBuildHasher>::from_tables(strings, Vec::new()).is_err());
    }

    #[test]
    fn test_from_tables_rejects_dangling_signature() {
        let strings = vec![Some("a".to_string())];
        let key = SignatureKey {
            return_type: StringId(0),
            package_name: StringId(0),
            class_name: StringId(0),
            method_name: StringId(3),
            parameter_types: Vec::new(),
        };
        let err = Registry::<FxBuildHasher>::from_tables(strings, vec![key]).unwrap_err();
        assert_eq!(err, ModelError::NotRegistered { kind: "string", id: 3 });
    }
}
