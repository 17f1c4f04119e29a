use tracing::trace;

use crate::context::Store;
use crate::types::{Height, Path, RawHeight};

/// A wrapper store that implements rudimentary `apply()`/`reset()` support for other stores
#[derive(Clone, Debug)]
pub struct RevertibleStore<S> {
    /// backing store
    store: S,
    /// operation log for recording rollback operations in preserved order
    op_log: Vec<RevertOp>,
}

#[derive(Clone, Debug)]
enum RevertOp {
    Delete(Path),
    Set(Path, Vec<u8>),
}

impl<S> RevertibleStore<S>
where
    S: Store,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            op_log: vec![],
        }
    }
}

impl<S> Default for RevertibleStore<S>
where
    S: Default + Store,
{
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> Store for RevertibleStore<S>
where
    S: Store,
{
    type Error = S::Error;

    #[inline]
    fn set(&mut self, path: Path, value: Vec<u8>) -> Result<Option<Vec<u8>>, Self::Error> {
        let old_value = self.store.set(path.clone(), value)?;
        match old_value {
            // None implies this was an insert op, so we record the revert op as delete op
            None => self.op_log.push(RevertOp::Delete(path)),
            // Some old value implies this was an update op, so we record the revert op as a set op
            // with the old value
            Some(ref old_value) => self.op_log.push(RevertOp::Set(path, old_value.clone())),
        }
        Ok(old_value)
    }

    #[inline]
    fn get(&self, height: Height, path: &Path) -> Option<Vec<u8>> {
        self.store.get(height, path)
    }

    #[inline]
    fn delete(&mut self, path: &Path) {
        if let Some(old_value) = self.store.get(Height::Pending, path) {
            self.op_log.push(RevertOp::Set(path.clone(), old_value));
        }
        self.store.delete(path)
    }

    #[inline]
    fn commit(&mut self) -> Result<Vec<u8>, Self::Error> {
        // call `apply()` before `commit()` to make sure all operations are applied
        self.apply()?;
        self.store.commit()
    }

    #[inline]
    fn apply(&mut self) -> Result<(), Self::Error> {
        // note that we do NOT call the backing store's apply here - this allows users to create
        // multilayered `RevertibleStore`s
        self.op_log.clear();
        Ok(())
    }

    #[inline]
    fn reset(&mut self) {
        trace!("rollback operation log changes");
        while let Some(op) = self.op_log.pop() {
            match op {
                RevertOp::Delete(path) => self.store.delete(&path),
                RevertOp::Set(path, value) => {
                    // safety - reset failures are unrecoverable
                    self.store.set(path, value).expect("rollback must not fail");
                }
            }
        }
    }

    #[inline]
    fn current_height(&self) -> RawHeight {
        self.store.current_height()
    }

    #[inline]
    fn get_keys(&self, key_prefix: &Path) -> Vec<Path> {
        self.store.get_keys(key_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    #[test]
    fn reset_rolls_back_sets_and_deletes() {
        let mut store = RevertibleStore::new(InMemoryStore::default());
        let kept: Path = "kept".to_owned().into();
        let doomed: Path = "doomed".to_owned().into();

        store.set(kept.clone(), vec![1]).unwrap();
        store.set(doomed.clone(), vec![2]).unwrap();
        store.apply().unwrap();

        // a failed transaction: one overwrite, one delete, one insert
        store.set(kept.clone(), vec![9]).unwrap();
        store.delete(&doomed);
        store.set("fresh".to_owned().into(), vec![3]).unwrap();
        store.reset();

        assert_eq!(store.get(Height::Pending, &kept), Some(vec![1]));
        assert_eq!(store.get(Height::Pending, &doomed), Some(vec![2]));
        assert_eq!(store.get(Height::Pending, &"fresh".to_owned().into()), None);
    }
}
