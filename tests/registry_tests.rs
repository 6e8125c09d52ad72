use cta_trace::registry::{Registry, StringId};
use std::collections::HashSet;
use std::hash::{BuildHasherDefault, Hasher};

/// Every value hashes to the same bucket
#[derive(Default)]
struct ConstantHasher;

impl Hasher for ConstantHasher {
    fn finish(&self) -> u64 {
        0x5eed
    }

    fn write(&mut self, _bytes: &[u8]) {}
}

type CollidingRegistry = Registry<BuildHasherDefault<ConstantHasher>>;

#[test]
fn test_colliding_strings_get_distinct_ids() {
    let mut reg = CollidingRegistry::with_hasher();
    let words = ["Aa", "BB", "checkout", "pay", "", "AaAa", "BBBB"];

    let ids: Vec<StringId> = words.iter().map(|w| reg.register_string(Some(*w))).collect();
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), words.len());

    for (word, id) in words.iter().zip(&ids) {
        assert_eq!(reg.resolve_string(*id).unwrap(), Some(*word));
        assert_eq!(reg.register_string(Some(*word)), *id);
    }
}

#[test]
fn test_colliding_signatures_get_distinct_ids() {
    let mut reg = CollidingRegistry::with_hasher();
    let a = reg.register_signature(Some("void"), Some("p"), Some("C"), Some("Aa"), ["int"]);
    let b = reg.register_signature(Some("void"), Some("p"), Some("C"), Some("BB"), ["int"]);
    let a_again = reg.register_signature(Some("void"), Some("p"), Some("C"), Some("Aa"), ["int"]);

    assert_ne!(a, b);
    assert_eq!(a, a_again);
    assert_eq!(reg.resolve_signature(b).unwrap().method_name.as_deref(), Some("BB"));
}

#[test]
fn test_java_hash_collision_pair_with_default_hasher() {
    // "Aa" and "BB" share a Java-style string hash code
    let mut reg = Registry::new();
    let aa = reg.register_string(Some("Aa"));
    let bb = reg.register_string(Some("BB"));
    assert_ne!(aa, bb);
}

#[test]
fn test_absent_string_is_interned_once() {
    let mut reg = CollidingRegistry::with_hasher();
    let none = reg.register_string(None);
    let empty = reg.register_string(Some(""));
    assert_eq!(reg.register_string(None), none);
    assert_ne!(none, empty);
    assert_eq!(reg.string_count(), 2);
}

#[test]
fn test_many_strings_stay_distinct() {
    let mut reg = CollidingRegistry::with_hasher();
    let ids: Vec<_> = (0..500)
        .map(|i| reg.register_string(Some(format!("method{}", i).as_str())))
        .collect();

    assert_eq!(reg.string_count(), 500);
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(
            reg.resolve_string(*id).unwrap(),
            Some(format!("method{}", i).as_str())
        );
    }
}
