use std::str::FromStr;

use derive_more::Display;

/// Path of the counter backing query id assignment.
#[derive(Clone, Debug, Display)]
#[display(fmt = "last_registered_id")]
pub struct LastRegisteredQueryIdPath;

/// Path of a serialized [`super::RegisteredQuery`].
#[derive(Clone, Debug, Display, PartialEq, Eq)]
#[display(fmt = "registered_query/{}", _0)]
pub struct RegisteredQueryPath(pub u64);

impl FromStr for RegisteredQueryPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .strip_prefix("registered_query/")
            .ok_or_else(|| format!("not a registered query path: {s}"))?;
        let id = id
            .parse::<u64>()
            .map_err(|e| format!("malformed query id in path {s}: {e}"))?;
        Ok(Self(id))
    }
}

/// Path of the latest accepted result of a KV query.
#[derive(Clone, Debug, Display)]
#[display(fmt = "query_result/{}", _0)]
pub struct QueryResultPath(pub u64);

/// Path of the replay-protection marker of one submitted transaction.
#[derive(Clone, Debug, Display)]
#[display(fmt = "submitted_tx/{}/{}", query_id, tx_hash)]
pub struct SubmittedTxPath {
    query_id: u64,
    tx_hash: String,
}

impl SubmittedTxPath {
    pub fn new(query_id: u64, tx_hash: &[u8]) -> Self {
        Self {
            query_id,
            tx_hash: hex::encode(tx_hash),
        }
    }
}

/// Path of the module parameters.
#[derive(Clone, Debug, Display)]
#[display(fmt = "params")]
pub struct ParamsPath;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_the_persisted_layout() {
        assert_eq!(LastRegisteredQueryIdPath.to_string(), "last_registered_id");
        assert_eq!(RegisteredQueryPath(7).to_string(), "registered_query/7");
        assert_eq!(QueryResultPath(7).to_string(), "query_result/7");
        assert_eq!(
            SubmittedTxPath::new(7, &[0xab, 0xcd]).to_string(),
            "submitted_tx/7/abcd"
        );
        assert_eq!(ParamsPath.to_string(), "params");
    }

    #[test]
    fn registered_query_path_roundtrip() {
        let path = RegisteredQueryPath(42);
        assert_eq!(
            RegisteredQueryPath::from_str(&path.to_string()).unwrap(),
            path
        );
        assert!(RegisteredQueryPath::from_str("query_result/42").is_err());
    }
}
