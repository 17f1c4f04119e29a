use displaydoc::Display;

use crate::bank::Error as BankError;
use crate::icq::Error as IcqError;

#[derive(Debug, Display)]
pub enum Error {
    /// no module could handle specified query
    NotHandled,
    /// custom error: `{reason}`
    Custom { reason: String },
    /// bank module error: `{0}`
    Bank(BankError),
    /// interchain-queries module error: `{0}`
    InterchainQueries(IcqError),
}

impl From<BankError> for Error {
    fn from(e: BankError) -> Self {
        Error::Bank(e)
    }
}

impl From<IcqError> for Error {
    fn from(e: IcqError) -> Self {
        Error::InterchainQueries(e)
    }
}
