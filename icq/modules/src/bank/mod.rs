mod context;
mod error;
mod impls;
mod util;

pub use context::*;
pub use error::*;
pub use impls::*;
pub use util::*;
