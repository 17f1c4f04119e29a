use cosmrs::AccountId;

use super::types::{KvKey, QueryKind, QueryResult};
use crate::bank::Coin;

/// Registers a new interchain query.
#[derive(Clone, Debug)]
pub struct MsgRegisterInterchainQuery {
    pub sender: AccountId,
    pub kind: QueryKind,
    pub connection_id: String,
    pub update_period: u64,
    pub deposit: Vec<Coin>,
}

/// Updates the parameters of a registered query. Only supplied fields are
/// touched; `None` leaves the current value in place.
#[derive(Clone, Debug)]
pub struct MsgUpdateInterchainQuery {
    pub sender: AccountId,
    pub query_id: u64,
    pub new_keys: Option<Vec<KvKey>>,
    pub new_transactions_filter: Option<String>,
    pub new_update_period: Option<u64>,
}

/// Removes a registered query and refunds its deposit.
#[derive(Clone, Debug)]
pub struct MsgRemoveInterchainQuery {
    pub sender: AccountId,
    pub query_id: u64,
}

/// A relayer submission: the result claimed for a registered query, together
/// with the proofs the verification gateway will check.
#[derive(Clone, Debug)]
pub struct MsgSubmitQueryResult {
    pub sender: AccountId,
    pub query_id: u64,
    pub result: QueryResult,
}
