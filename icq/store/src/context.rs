use crate::types::{Height, Path, RawHeight};

/// Store trait - the minimal interface expected of all concrete stores.
///
/// Keys are [`Path`]s, values are opaque byte vectors. A store distinguishes
/// between the `Pending` (uncommitted) state, the `Latest` committed state,
/// and `Stable` historical states, see [`Height`].
pub trait Store: Clone + Send + Sync {
    /// Error type - expected to envelope all possible errors in the store
    type Error: core::fmt::Debug;

    /// Set `value` for `path`, returning the previous value (if any)
    fn set(&mut self, path: Path, value: Vec<u8>) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Get the value associated with `path` at the given `height`
    fn get(&self, height: Height, path: &Path) -> Option<Vec<u8>>;

    /// Delete the value associated with `path` from the pending state
    fn delete(&mut self, path: &Path);

    /// Commit the pending state, making it the new latest stable state.
    /// Returns a hash identifying the committed state.
    fn commit(&mut self) -> Result<Vec<u8>, Self::Error>;

    /// Apply accumulated changes from a successfully completed transaction
    fn apply(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Discard changes accumulated since the last `apply()`
    fn reset(&mut self) {}

    /// Height of the latest committed state
    fn current_height(&self) -> RawHeight;

    /// All keys in the pending state that start with `key_prefix`
    fn get_keys(&self, key_prefix: &Path) -> Vec<Path>;
}
