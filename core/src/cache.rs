//! Response cache keyed by query identity.
//!
//! The cache is a narrow key-value interface: a [`QueryKey`] (operation name
//! plus its variables) maps to the JSON `data` of the last result for that
//! query. Writes replace an entry as a whole; there is no field-level merge,
//! so a reader sees either the old result or the new one. Changes derived
//! from the current entry go through [`QueryCache::update`], which runs the
//! whole read-modify-write under one lock so concurrent patches cannot
//! overwrite each other.

use crate::operation::Operation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

/// Identity of a cached query result
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey {
    operation: String,
    variables: String,
}

impl QueryKey {
    /// Key for a raw operation name and variables value
    ///
    /// Variables are stored in their canonical JSON text, so two structurally
    /// equal variable objects produce the same key. `serde_json` keeps object
    /// keys sorted, which makes the text canonical.
    #[must_use]
    pub fn new(operation: impl Into<String>, variables: &Value) -> Self {
        Self {
            operation: operation.into(),
            variables: variables.to_string(),
        }
    }

    /// Key for operation `O` with the given variables
    ///
    /// # Errors
    ///
    /// Returns the serde error if the variables cannot be serialized.
    pub fn of<O: Operation>(variables: &O::Variables) -> Result<Self, serde_json::Error> {
        Ok(Self::new(O::NAME, &serde_json::to_value(variables)?))
    }

    /// Operation name part of the key
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.variables == "null" {
            write!(f, "{}", self.operation)
        } else {
            write!(f, "{}({})", self.operation, self.variables)
        }
    }
}

/// Key-value store for query results
///
/// Implementations must make [`write`](QueryCache::write) atomic per key: a
/// concurrent [`read`](QueryCache::read) observes the previous value or the
/// new one, never a mixture.
pub trait QueryCache: Send + Sync {
    /// Read the cached result for `key`
    fn read(&self, key: &QueryKey) -> Option<Value>;

    /// Replace the cached result for `key`
    fn write(&self, key: QueryKey, data: Value);

    /// Atomically derive a new entry for `key` from the current one
    ///
    /// `f` receives the current value, if any, and returns the replacement,
    /// or `None` to leave the entry as it is. No other write to the cache
    /// can land between the read and the write. Returns whether an entry
    /// was written.
    fn update(&self, key: &QueryKey, f: &mut dyn FnMut(Option<&Value>) -> Option<Value>) -> bool;

    /// Remove the entry for `key`, returning whether it existed
    fn evict(&self, key: &QueryKey) -> bool;

    /// Drop every entry
    fn clear(&self);
}

/// Read and decode the cached result of operation `O`
///
/// An entry that does not decode into `O::Data` is reported as a miss.
pub fn read_query<O: Operation>(cache: &dyn QueryCache, variables: &O::Variables) -> Option<O::Data> {
    let key = QueryKey::of::<O>(variables).ok()?;
    let value = cache.read(&key)?;
    match serde_json::from_value(value) {
        Ok(data) => Some(data),
        Err(error) => {
            tracing::warn!(key = %key, error = %error, "Cached entry does not match operation data, ignoring");
            None
        },
    }
}

/// Encode and store the result of operation `O`
///
/// # Errors
///
/// Returns the serde error if the variables or data cannot be serialized; the
/// cache is left untouched in that case.
pub fn write_query<O: Operation>(
    cache: &dyn QueryCache,
    variables: &O::Variables,
    data: &O::Data,
) -> Result<(), serde_json::Error> {
    let key = QueryKey::of::<O>(variables)?;
    let value = serde_json::to_value(data)?;
    tracing::trace!(key = %key, "Writing query result to cache");
    cache.write(key, value);
    Ok(())
}

/// Decode, transform and re-encode the cached result of operation `O` atomically
///
/// `f` gets the decoded entry (`None` when missing or undecodable) and returns
/// the new data, or `None` to leave the cache untouched. Returns whether the
/// entry was rewritten.
///
/// # Errors
///
/// Returns the serde error if the variables or the new data cannot be
/// serialized; the cache is left untouched in that case.
pub fn update_query<O, F>(cache: &dyn QueryCache, variables: &O::Variables, mut f: F) -> Result<bool, serde_json::Error>
where
    O: Operation,
    F: FnMut(Option<O::Data>) -> Option<O::Data>,
{
    let key = QueryKey::of::<O>(variables)?;
    let mut encode_error = None;

    let written = cache.update(&key, &mut |current: Option<&Value>| {
        let decoded = current.and_then(|value| match serde_json::from_value(value.clone()) {
            Ok(data) => Some(data),
            Err(error) => {
                tracing::warn!(key = %key, error = %error, "Cached entry does not match operation data, ignoring");
                None
            },
        });
        let next = f(decoded)?;
        match serde_json::to_value(&next) {
            Ok(value) => Some(value),
            Err(error) => {
                encode_error = Some(error);
                None
            },
        }
    });

    match encode_error {
        Some(error) => Err(error),
        None => {
            if written {
                tracing::trace!(key = %key, "Updated cached query result");
            }
            Ok(written)
        },
    }
}

/// In-memory [`QueryCache`] backed by a `HashMap`
///
/// Lock poisoning is recovered. An update computes the new value before
/// touching the map, so the map is consistent even if a writer panicked.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<QueryKey, Value>>,
}

impl InMemoryCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if nothing is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys currently cached
    #[must_use]
    pub fn keys(&self) -> Vec<QueryKey> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl QueryCache for InMemoryCache {
    fn read(&self, key: &QueryKey) -> Option<Value> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn write(&self, key: QueryKey, data: Value) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, data);
    }

    fn update(&self, key: &QueryKey, f: &mut dyn FnMut(Option<&Value>) -> Option<Value>) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match f(entries.get(key)) {
            Some(value) => {
                entries.insert(key.clone(), value);
                true
            },
            None => false,
        }
    }

    fn evict(&self, key: &QueryKey) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationKind;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Names {
        names: Vec<String>,
    }

    #[derive(Serialize)]
    struct ById {
        id: String,
    }

    struct ListNames;

    impl Operation for ListNames {
        const NAME: &'static str = "ListNames";
        const DOCUMENT: &'static str = "query ListNames { names }";
        const KIND: OperationKind = OperationKind::Query;
        type Variables = ();
        type Data = Names;
    }

    struct NameById;

    impl Operation for NameById {
        const NAME: &'static str = "NameById";
        const DOCUMENT: &'static str = "query NameById($id: ID!) { names }";
        const KIND: OperationKind = OperationKind::Query;
        type Variables = ById;
        type Data = Names;
    }

    #[test]
    fn key_includes_variables() {
        let a = QueryKey::of::<NameById>(&ById { id: "1".into() }).unwrap();
        let b = QueryKey::of::<NameById>(&ById { id: "2".into() }).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.operation(), "NameById");
        assert_eq!(a.to_string(), r#"NameById({"id":"1"})"#);
    }

    #[test]
    fn zero_argument_key_displays_bare_name() {
        let key = QueryKey::of::<ListNames>(&()).unwrap();
        assert_eq!(key.to_string(), "ListNames");
    }

    #[test]
    fn typed_round_trip_through_cache() {
        let cache = InMemoryCache::new();
        assert!(read_query::<ListNames>(&cache, &()).is_none());

        let data = Names { names: vec!["a".into(), "b".into()] };
        write_query::<ListNames>(&cache, &(), &data).unwrap();

        assert_eq!(read_query::<ListNames>(&cache, &()), Some(data));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn write_replaces_entry() {
        let cache = InMemoryCache::new();
        let key = QueryKey::new("ListNames", &Value::Null);
        cache.write(key.clone(), json!({ "names": ["a"] }));
        cache.write(key.clone(), json!({ "names": ["b"] }));

        assert_eq!(cache.read(&key), Some(json!({ "names": ["b"] })));
        assert_eq!(cache.keys(), vec![key]);
    }

    #[test]
    fn undecodable_entry_reads_as_miss() {
        let cache = InMemoryCache::new();
        cache.write(QueryKey::new("ListNames", &Value::Null), json!({ "unexpected": true }));
        assert!(read_query::<ListNames>(&cache, &()).is_none());
    }

    #[test]
    fn update_query_skips_when_closure_declines() {
        let cache = InMemoryCache::new();
        assert!(!update_query::<ListNames, _>(&cache, &(), |current| current).unwrap());
        assert!(cache.is_empty());

        let data = Names { names: vec!["a".into()] };
        write_query::<ListNames>(&cache, &(), &data).unwrap();
        let written = update_query::<ListNames, _>(&cache, &(), |current| {
            let mut names = current?;
            names.names.push("b".into());
            Some(names)
        })
        .unwrap();

        assert!(written);
        assert_eq!(
            read_query::<ListNames>(&cache, &()).unwrap().names,
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let cache = std::sync::Arc::new(InMemoryCache::new());
        write_query::<ListNames>(&*cache, &(), &Names { names: Vec::new() }).unwrap();

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let cache = std::sync::Arc::clone(&cache);
                std::thread::spawn(move || {
                    for j in 0..25 {
                        update_query::<ListNames, _>(&*cache, &(), |current| {
                            let mut names = current?;
                            // Widen the window between read and write
                            std::thread::yield_now();
                            names.names.push(format!("{i}-{j}"));
                            Some(names)
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(read_query::<ListNames>(&*cache, &()).unwrap().names.len(), 200);
    }

    #[test]
    fn evict_and_clear() {
        let cache = InMemoryCache::new();
        let key = QueryKey::new("ListNames", &Value::Null);
        cache.write(key.clone(), json!({ "names": [] }));

        assert!(cache.evict(&key));
        assert!(!cache.evict(&key));

        cache.write(key, json!({ "names": [] }));
        cache.clear();
        assert!(cache.is_empty());
    }
}
