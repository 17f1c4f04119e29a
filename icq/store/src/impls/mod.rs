pub(crate) mod revertible;
pub(crate) mod shared;

pub use revertible::RevertibleStore;
pub use shared::SharedStore;
