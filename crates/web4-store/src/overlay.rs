use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

use web4_core::error::LedgerError;

use crate::store::{decode, encode, Store};

/// Buffered writes staged on top of a [`Store`].
///
/// All keeper mutations go through an overlay. A transaction checkpoints the
/// overlay before it runs and restores on failure, so a rejected transaction
/// leaves no trace; the block worker flattens the surviving writes into one
/// atomic batch when it seals the block.
pub struct Overlay<'a> {
    store: &'a Store,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

/// Saved overlay state for per-transaction rollback.
pub struct Checkpoint(BTreeMap<Vec<u8>, Option<Vec<u8>>>);

impl<'a> Overlay<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self {
            store,
            writes: BTreeMap::new(),
        }
    }

    pub fn store(&self) -> &Store {
        self.store
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.writes.clone())
    }

    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.writes = checkpoint.0;
    }

    pub fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, LedgerError> {
        if let Some(staged) = self.writes.get(key) {
            return Ok(staged.clone());
        }
        self.store.get_raw(key)
    }

    pub fn has(&self, key: &[u8]) -> Result<bool, LedgerError> {
        Ok(self.get_raw(key)?.is_some())
    }

    pub fn put_raw(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    pub fn delete_raw(&mut self, key: Vec<u8>) {
        self.writes.insert(key, None);
    }

    pub fn get<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, LedgerError> {
        match self.get_raw(key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put<T: Serialize>(&mut self, key: Vec<u8>, value: &T) -> Result<(), LedgerError> {
        self.put_raw(key, encode(value)?);
        Ok(())
    }

    /// Merged prefix scan: staged writes shadow stored pairs, staged
    /// deletions hide them. Key order is preserved.
    pub fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, LedgerError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.store.scan_prefix(prefix)?.into_iter().collect();
        for (key, value) in self.writes.range(prefix.to_vec()..) {
            if !key.starts_with(prefix) {
                break;
            }
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    /// Typed variant of [`Overlay::scan_prefix`].
    pub fn scan_prefix_as<T: DeserializeOwned>(
        &self,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, T)>, LedgerError> {
        self.scan_prefix(prefix)?
            .into_iter()
            .map(|(k, v)| decode(&v).map(|t| (k, t)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Consume the overlay into the write set for an atomic batch.
    pub fn into_writes(self) -> Vec<(Vec<u8>, Option<Vec<u8>>)> {
        self.writes.into_iter().collect()
    }

    /// Commit the staged writes to the store in one atomic batch.
    pub fn commit(self) -> Result<(), LedgerError> {
        let store = self.store;
        store.apply_batch(self.writes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_shadows_store() {
        let store = Store::temporary().unwrap();
        store.put_raw(b"k", b"old").unwrap();
        let mut overlay = Overlay::new(&store);
        assert_eq!(overlay.get_raw(b"k").unwrap(), Some(b"old".to_vec()));
        overlay.put_raw(b"k".to_vec(), b"new".to_vec());
        assert_eq!(overlay.get_raw(b"k").unwrap(), Some(b"new".to_vec()));
        // The store itself is untouched until commit.
        assert_eq!(store.get_raw(b"k").unwrap(), Some(b"old".to_vec()));
        overlay.commit().unwrap();
        assert_eq!(store.get_raw(b"k").unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn checkpoint_restores_pre_transaction_state() {
        let store = Store::temporary().unwrap();
        let mut overlay = Overlay::new(&store);
        overlay.put_raw(b"a".to_vec(), b"1".to_vec());
        let cp = overlay.checkpoint();
        overlay.put_raw(b"b".to_vec(), b"2".to_vec());
        overlay.delete_raw(b"a".to_vec());
        overlay.restore(cp);
        assert_eq!(overlay.get_raw(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(overlay.get_raw(b"b").unwrap(), None);
    }

    #[test]
    fn scan_merges_and_hides_deletions() {
        let store = Store::temporary().unwrap();
        store.put_raw(b"p/1", b"stored").unwrap();
        store.put_raw(b"p/2", b"stored").unwrap();
        let mut overlay = Overlay::new(&store);
        overlay.put_raw(b"p/3".to_vec(), b"staged".to_vec());
        overlay.delete_raw(b"p/1".to_vec());
        overlay.put_raw(b"q/1".to_vec(), b"other".to_vec());
        let pairs = overlay.scan_prefix(b"p/").unwrap();
        let keys: Vec<_> = pairs.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![b"p/2".to_vec(), b"p/3".to_vec()]);
    }
}
