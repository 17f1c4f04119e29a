use core::fmt::{Display, Formatter};
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cosmrs::AccountId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::Error;
use super::{DEFAULT_QUERY_SUBMIT_TIMEOUT, MAX_TRANSACTIONS_FILTERS};
use crate::bank::Coin;

/// A remote-chain height. Heights are only comparable within the same
/// revision; a revision bump supersedes every height of older revisions.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Height {
    pub revision: u64,
    pub height: u64,
}

impl Height {
    pub fn new(revision: u64, height: u64) -> Self {
        Self { revision, height }
    }
}

impl Default for Height {
    /// The smallest valid height, `(1, 1)`. Queries without any accepted
    /// submission carry this sentinel rather than an absent value, so
    /// downstream consumers never observe a null height.
    fn default() -> Self {
        Self {
            revision: 1,
            height: 1,
        }
    }
}

impl Display for Height {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{}", self.revision, self.height)
    }
}

/// One watched key of a KV query: a module storage prefix on the remote
/// chain plus the raw key bytes under that prefix.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KvKey {
    pub storage_prefix: String,
    pub key: Vec<u8>,
}

impl Display for KvKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.storage_prefix, BASE64.encode(&self.key))
    }
}

/// What a registered query watches on the remote chain.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Reads of specific storage keys, proven by membership proofs.
    Kv { keys: Vec<KvKey> },
    /// Transaction inclusion matching a filter expression.
    Tx { transactions_filter: String },
}

/// A single condition of a transactions filter.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TransactionsFilterItem {
    pub field: String,
    pub op: FilterOp,
    pub value: serde_json::Value,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Parses and bounds-checks a transactions filter expression.
pub fn parse_transactions_filter(filter: &str) -> Result<Vec<TransactionsFilterItem>, Error> {
    let conditions: Vec<TransactionsFilterItem> =
        serde_json::from_str(filter).map_err(|e| Error::InvalidRequest {
            reason: format!("failed to parse transactions filter: {e}"),
        })?;
    if conditions.is_empty() {
        return Err(Error::InvalidRequest {
            reason: "transactions filter is empty".to_owned(),
        });
    }
    if conditions.len() > MAX_TRANSACTIONS_FILTERS {
        return Err(Error::InvalidRequest {
            reason: format!(
                "too many transactions filter conditions: {} > {}",
                conditions.len(),
                MAX_TRANSACTIONS_FILTERS
            ),
        });
    }
    Ok(conditions)
}

/// A query registered against the state of a remote chain.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RegisteredQuery {
    /// Unique identifier, assigned at registration and never reused.
    pub id: u64,
    /// Address that registered the query; authorizes updates and removal.
    pub owner: String,
    /// What the query watches, see [`QueryKind`].
    pub kind: QueryKind,
    /// IBC connection the query targets.
    pub connection_id: String,
    /// Minimal interval of blocks between query result submissions.
    pub update_period: u64,
    /// Amount escrowed at registration, refunded on removal.
    pub deposit: Vec<Coin>,
    /// Number of local blocks after which the query is considered abandoned
    /// and may be removed by anyone.
    pub submit_timeout: u64,
    /// Local chain height at registration.
    pub registered_at_height: u64,
    /// Local chain height of the last accepted result submission, 0 if none.
    pub last_submitted_result_local_height: u64,
    /// Remote chain height of the last accepted result submission; the
    /// sentinel `Height::default()` if none.
    pub last_submitted_result_remote_height: Height,
}

impl RegisteredQuery {
    pub fn owner_address(&self) -> Result<AccountId, Error> {
        AccountId::from_str(&self.owner).map_err(|e| Error::InvalidRequest {
            reason: format!("malformed query owner address: {e}"),
        })
    }

    /// Local height after which anyone may remove the query.
    pub fn timeout_at_height(&self) -> u64 {
        self.registered_at_height
            .max(self.last_submitted_result_local_height)
            .saturating_add(self.submit_timeout)
    }
}

/// A single proven storage read from the remote chain. The proof is checked
/// at submission time and stripped before the value is persisted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageValue {
    pub storage_prefix: String,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub proof: Option<Vec<u8>>,
}

/// A relayer-submitted query result. For KV queries `kv_results` is
/// populated; for TX queries `block` carries the transaction evidence.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryResult {
    pub kv_results: Vec<StorageValue>,
    pub block: Option<Block>,
    pub height: u64,
    pub revision: u64,
}

/// Transaction evidence for a TX query: a remote block header, the header of
/// the following block, and the transactions claimed to be included. Header
/// bytes are opaque to the engine and interpreted only by the verification
/// capability.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub header: Vec<u8>,
    pub next_block_header: Vec<u8>,
    pub txs: Vec<TxValue>,
}

/// One transaction with its inclusion and delivery proofs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxValue {
    pub data: Vec<u8>,
    pub inclusion_proof: Vec<u8>,
    pub delivery_proof: Vec<u8>,
}

impl TxValue {
    /// Hash identifying this transaction for replay protection.
    pub fn hash(&self) -> Vec<u8> {
        Sha256::digest(&self.data).to_vec()
    }
}

/// Module parameters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Params {
    /// Default number of local blocks after which a query without accepted
    /// submissions may be removed by anyone.
    pub query_submit_timeout: u64,
    /// Smallest deposit accepted at registration.
    pub min_query_deposit: Vec<Coin>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            query_submit_timeout: DEFAULT_QUERY_SUBMIT_TIMEOUT,
            min_query_deposit: vec![],
        }
    }
}

/// The module's genesis document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub last_registered_query_id: u64,
    #[serde(default)]
    pub registered_queries: Vec<RegisteredQuery>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_ordering_is_revision_first() {
        assert!(Height::new(2, 1) > Height::new(1, 100));
        assert!(Height::new(1, 101) > Height::new(1, 100));
        assert!(Height::new(1, 100) >= Height::new(1, 100));
        assert!(Height::new(1, 99) < Height::new(1, 100));
    }

    #[test]
    fn default_height_is_the_sentinel() {
        assert_eq!(Height::default(), Height::new(1, 1));
    }

    #[test]
    fn transactions_filter_parsing() {
        let filter = r#"[{"field":"transfer.recipient","op":"eq","value":"cosmos1xyz"}]"#;
        let parsed = parse_transactions_filter(filter).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].op, FilterOp::Eq);

        assert!(parse_transactions_filter("[]").is_err());
        assert!(parse_transactions_filter("not json").is_err());
        assert!(parse_transactions_filter(r#"[{"field":"f","op":"between","value":1}]"#).is_err());
    }
}
