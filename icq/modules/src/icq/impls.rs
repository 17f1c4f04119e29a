use std::str::FromStr;

use cosmrs::AccountId;
use ibc::core::host::types::identifiers::ConnectionId;
use icq_store::context::Store;
use icq_store::impls::SharedStore;
use icq_store::types::{Height as StoreHeight, JsonStore, Path, TypedSet, TypedStore};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::context::VerificationHost;
use super::error::Error;
use super::msg::{
    MsgRegisterInterchainQuery, MsgRemoveInterchainQuery, MsgSubmitQueryResult,
    MsgUpdateInterchainQuery,
};
use super::path::{
    LastRegisteredQueryIdPath, ParamsPath, QueryResultPath, RegisteredQueryPath, SubmittedTxPath,
};
use super::types::{
    parse_transactions_filter, GenesisState, Height, KvKey, Params, QueryKind, QueryResult,
    RegisteredQuery, StorageValue,
};
use super::{MAX_KV_QUERY_KEYS_COUNT, MODULE_NAME};
use crate::bank::{BankKeeper, Coin, Error as BankError, ACCOUNT_PREFIX};
use crate::context::Module;
use crate::error::Error as AppError;
use crate::types::QueryResult as ModuleQueryResult;

/// The interchain-queries module: registry of queries against remote chains,
/// deposit bookkeeping tied to the query lifecycle, and the verification
/// gateway relayer submissions must pass before any result is persisted.
#[derive(Clone)]
pub struct InterchainQueries<S, V, BK>
where
    S: Store,
{
    /// Handle to store instance.
    /// The module is guaranteed exclusive access to all paths in the store key-space.
    store: SharedStore<S>,
    /// A typed-store for the query id counter
    last_query_id: JsonStore<SharedStore<S>, LastRegisteredQueryIdPath, u64>,
    /// A typed-store for registered queries
    query_store: JsonStore<SharedStore<S>, RegisteredQueryPath, RegisteredQuery>,
    /// A typed-store for the latest accepted KV result per query
    result_store: JsonStore<SharedStore<S>, QueryResultPath, QueryResult>,
    /// A typed-store for transaction replay-protection markers
    submitted_tx_store: TypedSet<SharedStore<S>, SubmittedTxPath>,
    /// A typed-store for module parameters
    params_store: JsonStore<SharedStore<S>, ParamsPath, Params>,
    /// Light-client capability used to verify submissions
    verification_host: V,
    /// Bank capability used to move deposits
    bank_keeper: BK,
}

impl<S, V, BK> InterchainQueries<S, V, BK>
where
    S: Store,
    V: VerificationHost,
    BK: BankKeeper<Error = BankError, Address = AccountId, Coin = Coin>,
{
    pub fn new(store: SharedStore<S>, verification_host: V, bank_keeper: BK) -> Self {
        let mut last_query_id: JsonStore<SharedStore<S>, LastRegisteredQueryIdPath, u64> =
            TypedStore::new(store.clone());
        let mut params_store: JsonStore<SharedStore<S>, ParamsPath, Params> =
            TypedStore::new(store.clone());

        // seed the counter and params on first boot only
        if last_query_id
            .get(StoreHeight::Pending, &LastRegisteredQueryIdPath)
            .expect("no error")
            .is_none()
        {
            last_query_id
                .set(LastRegisteredQueryIdPath, 0)
                .expect("no error");
        }
        if params_store
            .get(StoreHeight::Pending, &ParamsPath)
            .expect("no error")
            .is_none()
        {
            params_store
                .set(ParamsPath, Params::default())
                .expect("no error");
        }

        Self {
            last_query_id,
            params_store,
            query_store: TypedStore::new(store.clone()),
            result_store: TypedStore::new(store.clone()),
            submitted_tx_store: TypedStore::new(store.clone()),
            verification_host,
            bank_keeper,
            store,
        }
    }

    /// Address of the module escrow account that holds query deposits:
    /// the first 20 bytes of `sha256(module name)`, bech32-encoded.
    pub fn module_address() -> AccountId {
        let digest = Sha256::digest(MODULE_NAME.as_bytes());
        // safety - the derived bytes are a valid address by construction
        AccountId::new(ACCOUNT_PREFIX, &digest[..20]).expect("valid module address")
    }

    /// Local chain height as of the latest committed state transition.
    pub fn current_local_height(&self) -> u64 {
        self.store.current_height()
    }

    pub fn params(&self) -> Result<Params, Error> {
        Ok(self
            .params_store
            .get(StoreHeight::Pending, &ParamsPath)?
            .unwrap_or_default())
    }

    pub fn set_params(&mut self, params: Params) -> Result<(), Error> {
        self.params_store.set(ParamsPath, params)?;
        Ok(())
    }

    pub fn last_registered_query_id(&self) -> Result<u64, Error> {
        Ok(self
            .last_query_id
            .get(StoreHeight::Pending, &LastRegisteredQueryIdPath)?
            .unwrap_or(0))
    }

    /// Registers a new query, escrows the deposit and returns the assigned id.
    pub fn register_interchain_query(
        &mut self,
        msg: MsgRegisterInterchainQuery,
    ) -> Result<u64, Error> {
        if msg.update_period == 0 {
            return Err(Error::InvalidRequest {
                reason: "update period cannot be zero".to_owned(),
            });
        }
        validate_query_kind(&msg.kind)?;
        ConnectionId::from_str(&msg.connection_id).map_err(|e| Error::InvalidRequest {
            reason: format!("malformed connection id {}: {e}", msg.connection_id),
        })?;

        let params = self.params()?;
        if !crate::bank::coins_cover(&msg.deposit, &params.min_query_deposit) {
            return Err(Error::InvalidRequest {
                reason: format!(
                    "deposit [{}] is below the minimum [{}]",
                    render_coins(&msg.deposit),
                    render_coins(&params.min_query_deposit)
                ),
            });
        }

        // escrow first: an uncovered deposit aborts before any registry write
        self.collect_deposit(&msg.sender, &msg.deposit)?;

        let id = self.last_registered_query_id()? + 1;
        self.last_query_id.set(LastRegisteredQueryIdPath, id)?;

        let query = RegisteredQuery {
            id,
            owner: msg.sender.to_string(),
            kind: msg.kind,
            connection_id: msg.connection_id,
            update_period: msg.update_period,
            deposit: msg.deposit,
            submit_timeout: params.query_submit_timeout,
            registered_at_height: self.current_local_height(),
            last_submitted_result_local_height: 0,
            last_submitted_result_remote_height: Height::default(),
        };
        self.save_query(&query)?;

        debug!(
            "registered interchain query {} for connection {}",
            id, query.connection_id
        );
        Ok(id)
    }

    /// Updates the watched keys/filter and/or update period of a query.
    /// Only the owner may update; untouched fields keep their values.
    pub fn update_interchain_query(&mut self, msg: MsgUpdateInterchainQuery) -> Result<(), Error> {
        let mut query = self.registered_query(msg.query_id)?;
        if query.owner_address()? != msg.sender {
            return Err(Error::Unauthorized {
                query_id: msg.query_id,
            });
        }

        if let Some(period) = msg.new_update_period {
            if period == 0 {
                return Err(Error::InvalidRequest {
                    reason: "update period cannot be zero".to_owned(),
                });
            }
            query.update_period = period;
        }
        if let Some(keys) = msg.new_keys {
            if !matches!(query.kind, QueryKind::Kv { .. }) {
                return Err(Error::InvalidRequest {
                    reason: "cannot set KV keys on a TX query".to_owned(),
                });
            }
            validate_kv_keys(&keys)?;
            query.kind = QueryKind::Kv { keys };
        }
        if let Some(filter) = msg.new_transactions_filter {
            if !matches!(query.kind, QueryKind::Tx { .. }) {
                return Err(Error::InvalidRequest {
                    reason: "cannot set a transactions filter on a KV query".to_owned(),
                });
            }
            parse_transactions_filter(&filter)?;
            query.kind = QueryKind::Tx {
                transactions_filter: filter,
            };
        }

        self.save_query(&query)?;
        debug!("updated interchain query {}", query.id);
        Ok(())
    }

    /// Removes a query, deletes its stored result and refunds the deposit to
    /// the sender. The owner may always remove; any other sender only once
    /// the query has timed out without accepted submissions.
    pub fn remove_interchain_query(&mut self, msg: MsgRemoveInterchainQuery) -> Result<(), Error> {
        let query = self.registered_query(msg.query_id)?;

        let is_owner = query.owner_address()? == msg.sender;
        if !is_owner && self.current_local_height() <= query.timeout_at_height() {
            return Err(Error::Unauthorized {
                query_id: msg.query_id,
            });
        }

        self.must_pay_out_deposit(&query.deposit, &msg.sender);
        self.query_store.delete(RegisteredQueryPath(query.id));
        self.remove_query_results(query.id);

        debug!(
            "removed interchain query {}, deposit refunded to {}",
            query.id, msg.sender
        );
        Ok(())
    }

    /// The verification gateway: the single entry point a relayer submission
    /// must pass. Validation (steps 1-4) is side-effect free; state is only
    /// written once the whole submission has been verified.
    pub fn submit_query_result(&mut self, msg: MsgSubmitQueryResult) -> Result<(), Error> {
        // 1. lookup
        let mut query = self.registered_query(msg.query_id)?;

        // 2. resolve the light client bound to the query's connection
        let connection_id =
            ConnectionId::from_str(&query.connection_id).map_err(|e| Error::InvalidClientId {
                reason: format!("malformed connection id {}: {e}", query.connection_id),
            })?;
        let client_id = self.verification_host.connection_client(&connection_id)?;
        let client_state = self.verification_host.client_state(&client_id)?;

        let submitted_height = Height::new(msg.result.revision, msg.result.height);

        match query.kind.clone() {
            QueryKind::Kv { keys } => {
                let kv_results = &msg.result.kv_results;
                if kv_results.is_empty() {
                    return Err(Error::InvalidRequest {
                        reason: "submitted KV result contains no storage values".to_owned(),
                    });
                }
                if kv_results.len() != keys.len() {
                    return Err(Error::InvalidRequest {
                        reason: format!(
                            "submitted KV result has {} values while the query watches {} keys",
                            kv_results.len(),
                            keys.len()
                        ),
                    });
                }

                // 3. proof verification, one membership proof per watched key
                for (value, key) in kv_results.iter().zip(keys.iter()) {
                    if value.storage_prefix != key.storage_prefix || value.key != key.key {
                        return Err(Error::InvalidRequest {
                            reason: format!(
                                "storage value does not correspond to the registered key {key}"
                            ),
                        });
                    }
                    self.verification_host.verify_storage_entry(
                        &client_state,
                        submitted_height,
                        value,
                    )?;
                }

                // 4. height ordering
                check_last_remote_height(&query, submitted_height)?;

                // 5-6. commit
                self.save_kv_query_result(&mut query, &msg.result)
            }
            QueryKind::Tx {
                transactions_filter,
            } => {
                let block = msg.result.block.as_ref().ok_or_else(|| Error::InvalidRequest {
                    reason: "submitted TX result carries no block".to_owned(),
                })?;
                if block.txs.is_empty() {
                    return Err(Error::InvalidRequest {
                        reason: "submitted block contains no transactions".to_owned(),
                    });
                }
                let filter = parse_transactions_filter(&transactions_filter)?;

                // 3. proof verification: headers first, then every
                // not-yet-processed transaction. Nothing is written until the
                // whole submission has verified.
                self.verification_host
                    .verify_headers(&client_state, block)?;

                let mut fresh_hashes: Vec<Vec<u8>> = vec![];
                for tx in &block.txs {
                    let tx_hash = tx.hash();
                    if self.is_tx_processed(query.id, &tx_hash) || fresh_hashes.contains(&tx_hash) {
                        // overlapping submissions are expected, a known
                        // transaction is skipped rather than rejected
                        debug!(
                            "transaction {} already processed for query {}, skipping",
                            hex::encode(&tx_hash),
                            query.id
                        );
                        continue;
                    }
                    self.verification_host
                        .verify_transaction(&client_state, block, tx, &filter)?;
                    fresh_hashes.push(tx_hash);
                }

                if fresh_hashes.is_empty() {
                    debug!(
                        "all transactions of the submission for query {} were already processed",
                        query.id
                    );
                    return Ok(());
                }

                // 5-6. commit
                for tx_hash in &fresh_hashes {
                    self.mark_tx_processed(query.id, tx_hash)?;
                }
                // the recorded remote height only ever moves forward
                if check_last_remote_height(&query, submitted_height).is_ok() {
                    self.update_last_remote_height(&mut query, submitted_height);
                }
                self.update_last_local_height(&mut query);
                self.save_query(&query)
            }
        }
    }

    pub fn registered_query(&self, id: u64) -> Result<RegisteredQuery, Error> {
        self.query_store
            .get(StoreHeight::Pending, &RegisteredQueryPath(id))?
            .ok_or(Error::QueryNotFound(id))
    }

    /// Returns all registered queries, in store iteration order.
    pub fn registered_queries(&self) -> Result<Vec<RegisteredQuery>, Error> {
        let prefix: Path = "registered_query".to_owned().into();
        let mut queries = vec![];
        for path in self.query_store.get_keys(&prefix) {
            if let Ok(RegisteredQueryPath(id)) = path.try_into() {
                queries.push(self.registered_query(id)?);
            }
        }
        Ok(queries)
    }

    /// Returns the latest accepted result of a KV query.
    pub fn query_result(&self, id: u64) -> Result<QueryResult, Error> {
        self.result_store
            .get(StoreHeight::Pending, &QueryResultPath(id))?
            .ok_or(Error::NoQueryResult(id))
    }

    pub fn is_tx_processed(&self, query_id: u64, tx_hash: &[u8]) -> bool {
        self.submitted_tx_store
            .is_path_set(StoreHeight::Pending, &SubmittedTxPath::new(query_id, tx_hash))
    }

    /// Records a transaction as processed. Idempotent.
    pub fn mark_tx_processed(&mut self, query_id: u64, tx_hash: &[u8]) -> Result<(), Error> {
        self.submitted_tx_store
            .set_path(SubmittedTxPath::new(query_id, tx_hash))?;
        Ok(())
    }

    /// Deletes everything the result store holds for a query. Replay markers
    /// for the id are left in place: lookups are always scoped by query id
    /// and ids are never reused.
    fn remove_query_results(&mut self, query_id: u64) {
        self.result_store.delete(QueryResultPath(query_id));
    }

    fn save_query(&mut self, query: &RegisteredQuery) -> Result<(), Error> {
        self.query_store
            .set(RegisteredQueryPath(query.id), query.clone())?;
        Ok(())
    }

    /// Persists the cleaned result and moves the query's heights forward.
    /// Callers must have run the height-ordering check beforehand.
    fn save_kv_query_result(
        &mut self,
        query: &mut RegisteredQuery,
        result: &QueryResult,
    ) -> Result<(), Error> {
        let clean_result = clear_query_result(result);
        self.result_store
            .set(QueryResultPath(query.id), clean_result)?;

        self.update_last_remote_height(query, Height::new(result.revision, result.height));
        self.update_last_local_height(query);
        self.save_query(query)?;

        debug!("successfully saved result for query {}", query.id);
        Ok(())
    }

    fn update_last_local_height(&self, query: &mut RegisteredQuery) {
        query.last_submitted_result_local_height = self.current_local_height();
        debug!(
            "updated last local height of query {} to {}",
            query.id, query.last_submitted_result_local_height
        );
    }

    fn update_last_remote_height(&self, query: &mut RegisteredQuery, height: Height) {
        query.last_submitted_result_remote_height = height;
        debug!(
            "updated last remote height of query {} to {}",
            query.id, height
        );
    }

    fn collect_deposit(&mut self, owner: &AccountId, deposit: &[Coin]) -> Result<(), Error> {
        self.bank_keeper
            .send_coins(owner.clone(), Self::module_address(), deposit.to_vec())
            .map_err(Error::Deposit)
    }

    fn must_pay_out_deposit(&mut self, deposit: &[Coin], payee: &AccountId) {
        self.bank_keeper
            .send_coins(Self::module_address(), payee.clone(), deposit.to_vec())
            // safety - a failed refund would strand escrowed funds, which is unrecoverable
            .expect("deposit refund must not fail");
    }
}

impl<S, V, BK> Module for InterchainQueries<S, V, BK>
where
    S: Store,
    V: VerificationHost,
    BK: BankKeeper<Error = BankError, Address = AccountId, Coin = Coin>,
{
    type Store = S;

    fn init(&mut self, app_state: Value) {
        let state = match app_state.get(MODULE_NAME) {
            Some(state) => state.clone(),
            None => return,
        };
        debug!("initializing interchain-queries module");

        // safety - we panic on errors to prevent chain creation with invalid genesis config
        let genesis: GenesisState =
            serde_json::from_value(state).expect("invalid interchain-queries genesis state");
        self.params_store
            .set(ParamsPath, genesis.params)
            .expect("genesis params must persist");
        self.last_query_id
            .set(LastRegisteredQueryIdPath, genesis.last_registered_query_id)
            .expect("genesis query id counter must persist");
        for query in genesis.registered_queries {
            self.save_query(&query)
                .expect("genesis queries must persist");
        }
    }

    fn query(
        &self,
        _data: &[u8],
        path: Option<&Path>,
        height: StoreHeight,
    ) -> Result<ModuleQueryResult, AppError> {
        let path = path.ok_or(AppError::NotHandled)?;
        let path_str = path.to_string();
        if !(path_str.starts_with("registered_query/")
            || path_str.starts_with("query_result/")
            || path_str == "params")
        {
            return Err(AppError::NotHandled);
        }

        let data = self.store.get(height, path).ok_or(AppError::Custom {
            reason: "data not found".to_owned(),
        })?;
        Ok(ModuleQueryResult { data })
    }

    fn store_mut(&mut self) -> &mut SharedStore<S> {
        &mut self.store
    }

    fn store(&self) -> &SharedStore<S> {
        &self.store
    }
}

/// The height-ordering guard: a submitted remote height is admitted only if
/// it is strictly above the query's last accepted height, where the revision
/// is the primary ordering key and heights are not comparable across
/// revisions.
fn check_last_remote_height(query: &RegisteredQuery, submitted: Height) -> Result<(), Error> {
    let last = query.last_submitted_result_remote_height;
    if submitted.revision > last.revision {
        return Ok(());
    }
    if submitted.revision == last.revision && submitted.height > last.height {
        return Ok(());
    }
    Err(Error::StaleHeight { submitted, last })
}

/// We don't need to store proofs or block payloads, so we just remove
/// the unnecessary fields.
fn clear_query_result(result: &QueryResult) -> QueryResult {
    let kv_results = result
        .kv_results
        .iter()
        .map(|value| StorageValue {
            storage_prefix: value.storage_prefix.clone(),
            key: value.key.clone(),
            value: value.value.clone(),
            proof: None,
        })
        .collect();

    QueryResult {
        kv_results,
        block: None,
        height: result.height,
        revision: result.revision,
    }
}

fn validate_query_kind(kind: &QueryKind) -> Result<(), Error> {
    match kind {
        QueryKind::Kv { keys } => validate_kv_keys(keys),
        QueryKind::Tx {
            transactions_filter,
        } => parse_transactions_filter(transactions_filter).map(|_| ()),
    }
}

fn validate_kv_keys(keys: &[KvKey]) -> Result<(), Error> {
    if keys.is_empty() {
        return Err(Error::InvalidRequest {
            reason: "query keys cannot be empty".to_owned(),
        });
    }
    if keys.len() > MAX_KV_QUERY_KEYS_COUNT {
        return Err(Error::InvalidRequest {
            reason: format!(
                "too many query keys: {} > {}",
                keys.len(),
                MAX_KV_QUERY_KEYS_COUNT
            ),
        });
    }
    for key in keys {
        if key.storage_prefix.is_empty() {
            return Err(Error::InvalidRequest {
                reason: "query key storage prefix cannot be empty".to_owned(),
            });
        }
        if key.key.is_empty() {
            return Err(Error::InvalidRequest {
                reason: "query key cannot be empty".to_owned(),
            });
        }
    }
    Ok(())
}

fn render_coins(coins: &[Coin]) -> String {
    coins
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
