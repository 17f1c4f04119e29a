use std::collections::BTreeMap;
use std::marker::PhantomData;

use displaydoc::Display as DisplayDoc;

use crate::context::Store;
use crate::impls::{RevertibleStore, SharedStore};
use crate::types::{Height, Path, RawHeight};
use crate::utils::codec::{JsonCodec, NullCodec};
use crate::utils::Codec;

// A state type that represents a snapshot of the store at every block.
// The value is a `Vec<u8>` to allow stored types to choose their own serde.
pub type State = BTreeMap<Path, Vec<u8>>;

pub type MainStore<S> = SharedStore<RevertibleStore<S>>;

/// A `TypedStore` that uses the `JsonCodec`
pub type JsonStore<S, K, V> = TypedStore<S, K, JsonCodec<V>>;

/// A `TypedSet` that stores only paths and no values
pub type TypedSet<S, K> = TypedStore<S, K, NullCodec>;

/// Failures surfaced by [`TypedStore`] accessors. Decoding failures indicate
/// a corrupted stored value and must never be ignored by callers.
#[derive(Debug, DisplayDoc)]
pub enum StoreError {
    /// failed to encode value for path `{path}`
    Encode { path: String },
    /// stored value at path `{path}` is corrupted and cannot be decoded
    Decode { path: String },
    /// backing store rejected the operation at path `{path}`: `{reason}`
    Backend { path: String, reason: String },
}

#[derive(Clone, Debug)]
pub struct TypedStore<S, P, C> {
    store: S,
    _key: PhantomData<P>,
    _codec: PhantomData<C>,
}

impl<S, K, V, C> TypedStore<S, K, C>
where
    S: Store,
    C: Codec<Value = V>,
    K: ToString,
{
    #[inline]
    pub fn new(store: S) -> Self {
        Self {
            store,
            _codec: PhantomData,
            _key: PhantomData,
        }
    }

    #[inline]
    pub fn set(&mut self, path: K, value: V) -> Result<Option<V>, StoreError> {
        let path = path.to_string();
        let bytes = C::encode(&value)
            .ok_or_else(|| StoreError::Encode { path: path.clone() })?
            .as_ref()
            .to_vec();
        self.store
            .set(path.clone().into(), bytes)
            .map_err(|e| StoreError::Backend {
                path: path.clone(),
                reason: format!("{e:?}"),
            })?
            .map(|v| C::decode(&v).ok_or(StoreError::Decode { path }))
            .transpose()
    }

    #[inline]
    pub fn delete(&mut self, path: K) {
        self.store.delete(&path.to_string().into())
    }

    #[inline]
    pub fn get(&self, height: Height, path: &K) -> Result<Option<V>, StoreError> {
        let path = path.to_string();
        self.store
            .get(height, &path.clone().into())
            .map(|v| C::decode(&v).ok_or(StoreError::Decode { path }))
            .transpose()
    }

    #[inline]
    pub fn get_keys(&self, key_prefix: &Path) -> Vec<Path> {
        self.store.get_keys(key_prefix)
    }

    #[inline]
    pub fn current_height(&self) -> RawHeight {
        self.store.current_height()
    }
}

impl<S, K> TypedStore<S, K, NullCodec>
where
    S: Store,
    K: ToString,
{
    #[inline]
    pub fn set_path(&mut self, path: K) -> Result<(), StoreError> {
        let path = path.to_string();
        self.store
            .set(path.clone().into(), NullCodec::encode(&()).expect("no error"))
            .map(|_| ())
            .map_err(|e| StoreError::Backend {
                path,
                reason: format!("{e:?}"),
            })
    }

    #[inline]
    pub fn is_path_set(&self, height: Height, path: &K) -> bool {
        self.store.get(height, &path.to_string().into()).is_some()
    }
}
