use core::fmt::{Display, Formatter};

use cosmrs::AccountId;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Bech32 prefix of every account address on this chain.
pub const ACCOUNT_PREFIX: &str = "cosmos";

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, Hash, Eq)]
#[serde(transparent)]
pub struct Denom(pub String);

impl Display for Denom {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Coin {
    pub denom: Denom,
    pub amount: U256,
}

impl Coin {
    pub fn new(denom: Denom, amount: impl Into<U256>) -> Self {
        Self {
            denom,
            amount: amount.into(),
        }
    }

    pub fn new_empty(denom: Denom) -> Self {
        Self {
            denom,
            amount: 0u64.into(),
        }
    }
}

impl Display for Coin {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl From<(Denom, U256)> for Coin {
    fn from((denom, amount): (Denom, U256)) -> Self {
        Self { denom, amount }
    }
}

/// Whether `have` covers `need`, per denomination.
pub fn coins_cover(have: &[Coin], need: &[Coin]) -> bool {
    need.iter().all(|required| {
        let available: U256 = have
            .iter()
            .filter(|c| c.denom == required.denom)
            .fold(0u64.into(), |acc: U256, c| acc.saturating_add(c.amount));
        available >= required.amount
    })
}

/// A mapping of currency denomination identifiers to balances.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(transparent)]
pub struct Balances(pub Vec<Coin>);

#[derive(Clone, Debug, derive_more::Display)]
#[display(fmt = "balances/{}", _0)]
pub(super) struct BalancesPath(pub AccountId);

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(denom: &str, amount: u64) -> Coin {
        Coin::new(Denom(denom.to_owned()), amount)
    }

    #[test]
    fn coins_cover_per_denom() {
        let have = vec![coin("stake", 100), coin("atom", 5)];
        assert!(coins_cover(&have, &[coin("stake", 100)]));
        assert!(coins_cover(&have, &[coin("stake", 50), coin("atom", 5)]));
        assert!(!coins_cover(&have, &[coin("stake", 101)]));
        assert!(!coins_cover(&have, &[coin("osmo", 1)]));
        assert!(coins_cover(&have, &[]));
    }
}
