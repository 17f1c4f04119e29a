mod context;
mod error;
mod impls;
mod msg;
mod path;
mod types;

pub use context::*;
pub use error::*;
pub use impls::*;
pub use msg::*;
pub use path::*;
pub use types::*;

/// Module name, used for genesis namespacing and the escrow account derivation.
pub const MODULE_NAME: &str = "interchainqueries";

/// Upper bound on the number of KV keys a single query may watch.
pub const MAX_KV_QUERY_KEYS_COUNT: usize = 32;

/// Upper bound on the number of conditions in a transactions filter.
pub const MAX_TRANSACTIONS_FILTERS: usize = 32;

/// Default number of local blocks after which a query without accepted
/// submissions may be removed by anyone.
pub const DEFAULT_QUERY_SUBMIT_TIMEOUT: u64 = 1036800;
