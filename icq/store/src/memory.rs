use core::convert::Infallible;

use sha2::{Digest, Sha256};
use tracing::trace;

use crate::context::Store;
use crate::types::{Height, Path, State};

/// An in-memory store backed by an ordered map.
#[derive(Clone, Debug)]
pub struct InMemoryStore {
    /// collection of states corresponding to every committed block height
    store: Vec<State>,
    /// staged changes waiting to be committed
    /// these changes are from successful transactions
    staged: State,
    /// dirty changes that are not complete
    /// middle of a transaction which may fail
    pending: State,
}

impl InMemoryStore {
    #[inline]
    fn get_state(&self, height: Height) -> Option<&State> {
        match height {
            Height::Pending => Some(&self.pending),
            Height::Latest => self.store.last(),
            Height::Stable(height) => {
                if height == 0 {
                    None
                } else {
                    let h = height as usize;
                    self.store.get(h - 1)
                }
            }
        }
    }

    fn root_hash(&self, state: &State) -> Vec<u8> {
        let mut hasher = Sha256::new();
        for (path, value) in state {
            hasher.update(path.to_string().as_bytes());
            hasher.update(value);
        }
        hasher.finalize().to_vec()
    }
}

impl Default for InMemoryStore {
    /// The store starts out with an empty state. We also initialize the pending location as empty.
    fn default() -> Self {
        Self {
            store: vec![],
            staged: State::new(),
            pending: State::new(),
        }
    }
}

impl Store for InMemoryStore {
    type Error = Infallible;

    fn set(&mut self, path: Path, value: Vec<u8>) -> Result<Option<Vec<u8>>, Self::Error> {
        trace!("set at path = {}", path.to_string());
        Ok(self.pending.insert(path, value))
    }

    fn get(&self, height: Height, path: &Path) -> Option<Vec<u8>> {
        trace!(
            "get at path = {} at height = {:?}",
            path.to_string(),
            height
        );
        self.get_state(height).and_then(|v| v.get(path).cloned())
    }

    fn delete(&mut self, path: &Path) {
        trace!("delete at path = {}", path.to_string());
        self.pending.remove(path);
    }

    fn commit(&mut self) -> Result<Vec<u8>, Self::Error> {
        self.apply()?;
        trace!("committing height: {}", self.current_height());
        self.store.push(self.staged.clone());
        Ok(self.root_hash(&self.staged))
    }

    fn apply(&mut self) -> Result<(), Self::Error> {
        trace!("applying height: {}", self.current_height());
        self.staged = self.pending.clone();
        Ok(())
    }

    fn reset(&mut self) {
        trace!("resetting height: {}", self.current_height());
        self.pending = self.staged.clone();
    }

    fn current_height(&self) -> u64 {
        self.store.len() as u64
    }

    fn get_keys(&self, key_prefix: &Path) -> Vec<Path> {
        let key_prefix = key_prefix.to_string();
        self.pending
            .keys()
            .filter(|key| key.to_string().starts_with(&key_prefix))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_store() {
        let mut store = InMemoryStore::default();
        assert_eq!(store.current_height(), 0);

        let path = Path::from("a".to_owned());
        let value1 = vec![1, 2, 3];
        let value2 = vec![4, 5, 6];

        store.set(path.clone(), value1.clone()).unwrap();
        assert_eq!(store.get(Height::Pending, &path), Some(value1.clone()));
        assert_eq!(store.get(Height::Latest, &path), None);
        assert_eq!(store.get(Height::Stable(1), &path), None);

        store.apply().unwrap();
        store.commit().unwrap();

        assert_eq!(store.get(Height::Pending, &path), Some(value1.clone()));
        assert_eq!(store.get(Height::Latest, &path), Some(value1.clone()));
        assert_eq!(store.get(Height::Stable(1), &path), Some(value1.clone()));
        assert_eq!(store.get(Height::Stable(2), &path), None);
        assert_eq!(store.current_height(), 1);

        store.set(path.clone(), value2.clone()).unwrap();
        assert_eq!(store.get(Height::Pending, &path), Some(value2.clone()));
        assert_eq!(store.get(Height::Latest, &path), Some(value1.clone()));

        store.apply().unwrap();
        store.commit().unwrap();

        assert_eq!(store.get(Height::Pending, &path), Some(value2.clone()));
        assert_eq!(store.get(Height::Latest, &path), Some(value2.clone()));
        assert_eq!(store.get(Height::Stable(1), &path), Some(value1.clone()));
        assert_eq!(store.get(Height::Stable(2), &path), Some(value2.clone()));
        assert_eq!(store.current_height(), 2);
    }

    #[test]
    fn test_delete_and_prefix_iteration() {
        let mut store = InMemoryStore::default();

        store
            .set("registered_query/1".to_owned().into(), vec![1])
            .unwrap();
        store
            .set("registered_query/2".to_owned().into(), vec![2])
            .unwrap();
        store.set("query_result/1".to_owned().into(), vec![3]).unwrap();

        let keys = store.get_keys(&"registered_query".to_owned().into());
        assert_eq!(keys.len(), 2);

        store.delete(&"registered_query/1".to_owned().into());
        let keys = store.get_keys(&"registered_query".to_owned().into());
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].to_string(), "registered_query/2");
    }

    #[test]
    fn test_commit_hash_tracks_state() {
        let mut store = InMemoryStore::default();
        store.set("a".to_owned().into(), vec![1]).unwrap();
        let first = store.commit().unwrap();

        let unchanged = store.commit().unwrap();
        assert_eq!(first, unchanged);

        store.set("a".to_owned().into(), vec![2]).unwrap();
        let changed = store.commit().unwrap();
        assert_ne!(first, changed);
    }
}
