use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Durable string-keyed mapping with write-through persistence.
///
/// Every mutation persists the full mapping synchronously. Implementations are
/// the sole writers to their storage medium; reading happens once at
/// construction.
pub trait KvStore<V> {
    fn get(&self, key: &str) -> Option<&V>;

    /// Upserts, then persists.
    fn set(&mut self, key: &str, value: V);

    /// Removes if present, then persists. Returns whether a value was removed.
    fn delete(&mut self, key: &str) -> bool;

    /// Bulk-removes every key matching the predicate, persisting once.
    /// Returns the number of removed entries.
    fn delete_where(&mut self, pred: &dyn Fn(&str) -> bool) -> usize;

    /// Read-only view of the whole mapping, in deterministic key order.
    fn entries(&self) -> &BTreeMap<String, V>;
}

/// JSON-file-backed store. The file holds a single JSON object mapping keys to
/// values, e.g. `{"Regulations-2": "B"}`.
///
/// A missing file yields an empty mapping; an unreadable or unparsable file is
/// logged and also yields an empty mapping, so a corrupt store can never take
/// the application down. Write failures are logged and otherwise ignored; the
/// in-memory mapping stays authoritative for the rest of the session.
#[derive(Debug)]
pub struct JsonFileStore<V> {
    path: PathBuf,
    map: BTreeMap<String, V>,
}

impl<V> JsonFileStore<V>
where
    V: Serialize + DeserializeOwned,
{
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        let map = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "discarding unreadable store");
                    BTreeMap::new()
                }
            },
            // Missing file is the normal first-run case.
            Err(_) => BTreeMap::new(),
        };

        Self { path, map }
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(path = %self.path.display(), error = %e, "could not create store directory");
                return;
            }
        }

        match serde_json::to_string_pretty(&self.map) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    tracing::warn!(path = %self.path.display(), error = %e, "could not persist store");
                }
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "could not serialize store");
            }
        }
    }
}

impl<V> KvStore<V> for JsonFileStore<V>
where
    V: Serialize + DeserializeOwned,
{
    fn get(&self, key: &str) -> Option<&V> {
        self.map.get(key)
    }

    fn set(&mut self, key: &str, value: V) {
        self.map.insert(key.to_string(), value);
        self.persist();
    }

    fn delete(&mut self, key: &str) -> bool {
        let removed = self.map.remove(key).is_some();
        if removed {
            self.persist();
        }
        removed
    }

    fn delete_where(&mut self, pred: &dyn Fn(&str) -> bool) -> usize {
        let before = self.map.len();
        self.map.retain(|key, _| !pred(key));
        let removed = before - self.map.len();
        if removed > 0 {
            self.persist();
        }
        removed
    }

    fn entries(&self) -> &BTreeMap<String, V> {
        &self.map
    }
}

/// In-memory store used as the test fake.
#[derive(Debug, Default)]
pub struct MemoryStore<V> {
    map: BTreeMap<String, V>,
}

impl<V> MemoryStore<V> {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }
}

impl<V> KvStore<V> for MemoryStore<V> {
    fn get(&self, key: &str) -> Option<&V> {
        self.map.get(key)
    }

    fn set(&mut self, key: &str, value: V) {
        self.map.insert(key.to_string(), value);
    }

    fn delete(&mut self, key: &str) -> bool {
        self.map.remove(key).is_some()
    }

    fn delete_where(&mut self, pred: &dyn Fn(&str) -> bool) -> usize {
        let before = self.map.len();
        self.map.retain(|key, _| !pred(key));
        before - self.map.len()
    }

    fn entries(&self) -> &BTreeMap<String, V> {
        &self.map
    }
}
