use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use web4_core::error::LedgerError;

/// Persistent ledger state backed by sled (pure-Rust, no C dependencies).
///
/// A single tree holds every collection; logical collections are key-prefix
/// namespaces (see [`crate::keys`]). Using one tree means a sealed block and
/// all its state changes commit in one `sled::Batch`; readers observe the
/// pre-batch or post-batch state, never a mix.
pub struct Store {
    db: sled::Db,
}

impl Store {
    /// Open or create the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let db = sled::open(path).map_err(|e| LedgerError::Storage(e.to_string()))?;
        Ok(Self { db })
    }

    /// In-memory store for tests; removed when dropped.
    pub fn temporary() -> Result<Self, LedgerError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        Ok(Self { db })
    }

    pub fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, LedgerError> {
        self.db
            .get(key)
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }

    pub fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), LedgerError> {
        self.db
            .insert(key, value)
            .map(|_| ())
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }

    pub fn delete_raw(&self, key: &[u8]) -> Result<(), LedgerError> {
        self.db
            .remove(key)
            .map(|_| ())
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }

    pub fn has(&self, key: &[u8]) -> Result<bool, LedgerError> {
        self.db
            .contains_key(key)
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }

    /// All (key, value) pairs under `prefix`, in key order.
    pub fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, LedgerError> {
        let mut out = Vec::new();
        for item in self.db.scan_prefix(prefix) {
            let (k, v) = item.map_err(|e| LedgerError::Storage(e.to_string()))?;
            out.push((k.to_vec(), v.to_vec()));
        }
        Ok(out)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, LedgerError> {
        match self.get_raw(key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put<T: Serialize>(&self, key: &[u8], value: &T) -> Result<(), LedgerError> {
        self.put_raw(key, &encode(value)?)
    }

    /// Typed variant of [`Store::scan_prefix`].
    pub fn scan_prefix_as<T: DeserializeOwned>(
        &self,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, T)>, LedgerError> {
        self.scan_prefix(prefix)?
            .into_iter()
            .map(|(k, v)| decode(&v).map(|t| (k, t)))
            .collect()
    }

    /// Apply a set of writes atomically.
    pub fn apply_batch(
        &self,
        writes: impl IntoIterator<Item = (Vec<u8>, Option<Vec<u8>>)>,
    ) -> Result<(), LedgerError> {
        let mut batch = sled::Batch::default();
        for (key, value) in writes {
            match value {
                Some(v) => batch.insert(key, v),
                None => batch.remove(key),
            }
        }
        self.db
            .apply_batch(batch)
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), LedgerError> {
        self.db
            .flush()
            .map(|_| ())
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, LedgerError> {
    bincode::serialize(value).map_err(|e| LedgerError::Serialization(e.to_string()))
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LedgerError> {
    bincode::deserialize(bytes).map_err(|e| LedgerError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_round_trip() {
        let store = Store::temporary().unwrap();
        store.put(b"meta/head", &42u64).unwrap();
        assert_eq!(store.get::<u64>(b"meta/head").unwrap(), Some(42));
        assert_eq!(store.get::<u64>(b"meta/none").unwrap(), None);
    }

    #[test]
    fn scan_prefix_is_ordered() {
        let store = Store::temporary().unwrap();
        store.put_raw(b"q/2", b"c").unwrap();
        store.put_raw(b"q/1", b"b").unwrap();
        store.put_raw(b"r/1", b"x").unwrap();
        let pairs = store.scan_prefix(b"q/").unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, b"q/1");
        assert_eq!(pairs[1].0, b"q/2");
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let store = Store::temporary().unwrap();
        store.put_raw(b"a", b"1").unwrap();
        store
            .apply_batch(vec![
                (b"a".to_vec(), None),
                (b"b".to_vec(), Some(b"2".to_vec())),
            ])
            .unwrap();
        assert!(!store.has(b"a").unwrap());
        assert_eq!(store.get_raw(b"b").unwrap(), Some(b"2".to_vec()));
    }
}
