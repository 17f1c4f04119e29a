use icq_store::impls::SharedStore;
use icq_store::types::{Height, Path};
use serde_json::Value;

use crate::error::Error;
use crate::types::QueryResult;

/// The interface every module exposes to the enclosing application.
///
/// State-changing operations are module-specific keeper methods; this trait
/// only covers the surface the dispatch layer drives uniformly: genesis
/// initialization and read-only queries.
pub trait Module {
    /// The module's store type.
    type Store;

    /// Initialize module state from the genesis app state.
    /// Implementations are encouraged to panic on error, a chain must not
    /// start from an invalid genesis config.
    fn init(&mut self, _app_state: Value) {}

    /// Serve a read-only query against module state.
    ///
    /// ## Return
    /// * `Error::NotHandled` if the path isn't known to this module
    /// * Other errors iff the query was meant for this module but failed
    /// * Query result on success
    fn query(
        &self,
        _data: &[u8],
        _path: Option<&Path>,
        _height: Height,
    ) -> Result<QueryResult, Error> {
        Err(Error::NotHandled)
    }

    /// Return a mutable reference to the module's store
    fn store_mut(&mut self) -> &mut SharedStore<Self::Store>;

    /// Return a reference to the module's store
    fn store(&self) -> &SharedStore<Self::Store>;
}
