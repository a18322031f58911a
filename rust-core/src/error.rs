use crate::types::Amount;
use thiserror::Error;

/// Every rejected call maps to exactly one of these; the call leaves no trace in state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger is not operational")]
    NotOperational,

    #[error("caller is not the contract owner")]
    NotOwner,

    #[error("caller is not authorized")]
    NotAuthorized,

    #[error("airline is not registered")]
    AirlineNotFound,

    #[error("airline has not been accepted")]
    AirlineNotAccepted,

    #[error("airline has not deposited its stake")]
    AirlineNotFunded,

    #[error("elector already voted for this airline")]
    AlreadyVoted,

    #[error("airline is already funded")]
    AlreadyFunded,

    #[error("flight is already registered")]
    FlightAlreadyExists,

    #[error("flight is not registered")]
    FlightNotFound,

    #[error("insurance does not exist")]
    InsuranceNotFound,

    #[error("insurance is no longer valid")]
    InsuranceNotValid,

    #[error("stake below minimum: required {required}, offered {offered}")]
    InsufficientStake { required: Amount, offered: Amount },

    #[error("oracle fee below minimum: required {required}, offered {offered}")]
    InsufficientFee { required: Amount, offered: Amount },

    #[error("index does not match any index assigned to the oracle")]
    IndexMismatch,

    #[error("no open request for this flight and index")]
    RequestNotOpen,

    #[error("passenger has no credit to withdraw")]
    NoCreditBalance,

    #[error("premium {amount} outside accepted range (max {max:?})")]
    PremiumOutOfRange { amount: Amount, max: Option<Amount> },

    #[error("oracle is already registered")]
    OracleAlreadyRegistered,

    #[error("unknown flight status code {0}")]
    UnknownStatusCode(u8),

    #[error("treasury cannot cover payout: required {required}, available {available}")]
    TreasuryExhausted { required: Amount, available: Amount },

    #[error("call scheduled more than one outbound transfer")]
    DuplicateTransfer,

    #[error("outbound transfer failed: {0}")]
    TransferFailed(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
