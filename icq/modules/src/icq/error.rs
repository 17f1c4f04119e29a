use displaydoc::Display;

use super::types::Height;
use crate::bank::Error as BankError;

#[derive(Debug, Display)]
pub enum Error {
    /// there is no registered query with id `{0}`
    QueryNotFound(u64),
    /// sender is not authorized to manage query `{query_id}`
    Unauthorized { query_id: u64 },
    /// invalid query parameters: `{reason}`
    InvalidRequest { reason: String },
    /// could not resolve a client: `{reason}`
    InvalidClientId { reason: String },
    /// client has an unexpected type: `{reason}`
    InvalidClientType { reason: String },
    /// submitted remote height `{submitted}` is not above the last accepted height `{last}`
    StaleHeight { submitted: Height, last: Height },
    /// proof verification failed: `{reason}`
    ProofVerificationFailed { reason: String },
    /// no result has been stored for query `{0}`
    NoQueryResult(u64),
    /// bank failure while moving deposit funds: `{0}`
    Deposit(BankError),
    /// store failure: `{0}`
    Store(icq_store::types::StoreError),
}

impl From<icq_store::types::StoreError> for Error {
    fn from(e: icq_store::types::StoreError) -> Self {
        Error::Store(e)
    }
}
