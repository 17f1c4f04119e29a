use ibc::core::host::types::identifiers::{ClientId, ConnectionId};

use super::error::Error;
use super::types::{Block, Height, StorageValue, TransactionsFilterItem, TxValue};

/// Light-client capability the verification gateway delegates to.
///
/// Implementations resolve IBC identifiers and check cryptographic proofs;
/// the engine never inspects client states or proof bytes itself. Methods
/// return the module's error type so that failures carry their
/// classification (`InvalidClientId`, `InvalidClientType`,
/// `ProofVerificationFailed`) all the way to the caller.
pub trait VerificationHost {
    /// Client state representation, opaque to the engine.
    type ClientState;

    /// Resolves the client bound to the given connection.
    fn connection_client(&self, connection_id: &ConnectionId) -> Result<ClientId, Error>;

    /// Loads the current state of the given client.
    fn client_state(&self, client_id: &ClientId) -> Result<Self::ClientState, Error>;

    /// Checks the membership proof carried by a single storage read, at the
    /// given remote height.
    fn verify_storage_entry(
        &self,
        client_state: &Self::ClientState,
        height: Height,
        entry: &StorageValue,
    ) -> Result<(), Error>;

    /// Checks that a block's header and next-block header are valid and
    /// consecutive under the given client.
    fn verify_headers(&self, client_state: &Self::ClientState, block: &Block) -> Result<(), Error>;

    /// Checks inclusion and delivery proofs for one transaction of the block,
    /// and that the transaction satisfies the query's filter.
    fn verify_transaction(
        &self,
        client_state: &Self::ClientState,
        block: &Block,
        tx: &TxValue,
        filter: &[TransactionsFilterItem],
    ) -> Result<(), Error>;
}
