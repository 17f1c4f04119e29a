#![forbid(unsafe_code)]
#![deny(
    warnings,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications,
    rust_2018_idioms
)]

pub mod context;
pub mod impls;
pub mod memory;
pub mod types;
pub mod utils;

pub use context::Store;
pub use impls::{RevertibleStore, SharedStore};
pub use memory::InMemoryStore;
pub use types::{
    Height, Identifier, JsonStore, MainStore, Path, RawHeight, State, StoreError, TypedSet,
    TypedStore,
};
pub use utils::Codec;
