use std::collections::HashMap;
use std::str::FromStr;

use cosmrs::AccountId;
use icq_store::context::Store;
use icq_store::impls::SharedStore;
use icq_store::types::{Height, JsonStore, Path, TypedStore};
use icq_store::utils::codec::JsonCodec;
use icq_store::utils::Codec;
use primitive_types::U256;
use serde_json::Value;
use tracing::{debug, trace};

use super::context::{BankKeeper, BankReader};
use super::error::Error;
use super::util::{Balances, BalancesPath, Coin, Denom, ACCOUNT_PREFIX};
use crate::context::Module;
use crate::error::Error as AppError;
use crate::types::QueryResult;

#[derive(Clone, Debug)]
pub struct BankBalanceReader<S> {
    balance_store: JsonStore<SharedStore<S>, BalancesPath, Balances>,
}

impl<S: Store> BankReader for BankBalanceReader<S> {
    type Address = AccountId;
    type Denom = Denom;
    type Coin = Coin;
    type Coins = Vec<Coin>;

    fn get_all_balances_at_height(&self, height: Height, address: Self::Address) -> Self::Coins {
        self.balance_store
            .get(height, &BalancesPath(address))
            .unwrap_or_default()
            .map(|b| b.0)
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
pub struct BankBalanceKeeper<S> {
    balance_store: JsonStore<SharedStore<S>, BalancesPath, Balances>,
}

impl<S: Store> BankBalanceKeeper<S> {
    fn balances_of(&self, address: AccountId) -> Result<Vec<Coin>, Error> {
        self.balance_store
            .get(Height::Pending, &BalancesPath(address))
            .map(|b| b.map(|b| b.0).unwrap_or_default())
            .map_err(|e| Error::Store {
                reason: format!("{e:?}"),
            })
    }

    fn put_balances(&mut self, address: AccountId, balances: Vec<Coin>) -> Result<(), Error> {
        self.balance_store
            .set(BalancesPath(address), Balances(balances))
            .map(|_| ())
            .map_err(|e| Error::Store {
                reason: format!("{e:?}"),
            })
    }
}

impl<S: Store> BankKeeper for BankBalanceKeeper<S> {
    type Error = Error;
    type Address = AccountId;
    type Denom = Denom;
    type Coin = Coin;

    fn send_coins(
        &mut self,
        from: Self::Address,
        to: Self::Address,
        amount: impl IntoIterator<Item = Self::Coin>,
    ) -> Result<(), Self::Error> {
        let mut src_balances = self.balances_of(from.clone())?;
        let mut dst_balances = self.balances_of(to.clone())?;

        for Coin { denom, amount } in amount {
            let src_balance = src_balances
                .iter_mut()
                .find(|c| c.denom == denom)
                .filter(|c| c.amount >= amount)
                .ok_or_else(|| Error::InsufficientFunds {
                    account: from.to_string(),
                })?;

            let dst_balance =
                if let Some(i) = dst_balances.iter_mut().position(|c| c.denom == denom) {
                    &mut dst_balances[i]
                } else {
                    dst_balances.push(Coin::new_empty(denom));
                    dst_balances.last_mut().expect("just pushed")
                };

            if dst_balance.amount > U256::MAX - amount {
                return Err(Error::DestFundOverflow);
            }

            src_balance.amount -= amount;
            dst_balance.amount += amount;
        }

        // Store the updated account balances
        self.put_balances(from, src_balances)?;
        self.put_balances(to, dst_balances)?;

        Ok(())
    }

    fn mint_coins(
        &mut self,
        account: Self::Address,
        amount: impl IntoIterator<Item = Self::Coin>,
    ) -> Result<(), Self::Error> {
        let mut balances = self.balances_of(account.clone())?;

        for Coin { denom, amount } in amount {
            let balance = if let Some(i) = balances.iter_mut().position(|c| c.denom == denom) {
                &mut balances[i]
            } else {
                balances.push(Coin::new_empty(denom));
                balances.last_mut().expect("just pushed")
            };

            if balance.amount > U256::MAX - amount {
                return Err(Error::DestFundOverflow);
            }

            balance.amount += amount;
        }

        self.put_balances(account, balances)
    }
}

/// The bank module
#[derive(Clone, Debug)]
pub struct Bank<S> {
    /// Handle to store instance.
    /// The module is guaranteed exclusive access to all paths in the store key-space.
    store: SharedStore<S>,
    balance_reader: BankBalanceReader<S>,
    balance_keeper: BankBalanceKeeper<S>,
}

impl<S: Store> Bank<S> {
    pub fn new(store: SharedStore<S>) -> Self {
        Self {
            store: store.clone(),
            balance_reader: BankBalanceReader {
                balance_store: TypedStore::new(store.clone()),
            },
            balance_keeper: BankBalanceKeeper {
                balance_store: TypedStore::new(store),
            },
        }
    }

    pub fn bank_reader(&self) -> &BankBalanceReader<S> {
        &self.balance_reader
    }

    pub fn bank_keeper(&self) -> &BankBalanceKeeper<S> {
        &self.balance_keeper
    }
}

impl<S: Store> Module for Bank<S> {
    type Store = S;

    fn init(&mut self, app_state: Value) {
        let accounts = match app_state.get("bank") {
            Some(accounts) => accounts.clone(),
            None => return,
        };
        debug!("initializing bank module");

        // safety - we panic on errors to prevent chain creation with invalid genesis config
        let accounts: HashMap<String, HashMap<Denom, U256>> =
            serde_json::from_value(accounts).expect("invalid bank genesis state");
        for (account, balances) in accounts {
            trace!("adding account ({}) => {:?}", account, balances);

            let account_id = AccountId::from_str(&account).expect("invalid genesis account id");
            self.balance_keeper
                .mint_coins(
                    account_id,
                    balances.into_iter().map(|b| b.into()).collect::<Vec<Coin>>(),
                )
                .expect("failed to mint genesis balances");
        }
    }

    fn query(
        &self,
        data: &[u8],
        _path: Option<&Path>,
        height: Height,
    ) -> Result<QueryResult, AppError> {
        let account_id = match String::from_utf8(data.to_vec()) {
            Ok(s) if s.starts_with(ACCOUNT_PREFIX) => s,
            _ => return Err(AppError::NotHandled),
        };

        let account_id = AccountId::from_str(&account_id).map_err(|_| AppError::NotHandled)?;

        trace!("attempting to get balances for account {}", account_id);

        let balance = self
            .balance_reader
            .get_all_balances_at_height(height, account_id);

        Ok(QueryResult {
            data: JsonCodec::<Vec<Coin>>::encode(&balance)
                .ok_or(AppError::Custom {
                    reason: "failed to encode balances".to_owned(),
                })?
                .into_bytes(),
        })
    }

    fn store_mut(&mut self) -> &mut SharedStore<S> {
        &mut self.store
    }

    fn store(&self) -> &SharedStore<S> {
        &self.store
    }
}
