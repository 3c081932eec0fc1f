use std::fmt::Display;

use alloy::{contract, primitives::{Address, U256}, transports};

use crate::{coingecko::TokenListError, gas_oracle::GasOracleError, zeroex::ZeroExError};

/// Caller input rejected before any network round trip,
/// or a client constructed for a network it can not serve.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount {0:?} for token with {1} decimals")]
    InvalidAmount(String, u8),

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("token {0} is missing from the token map")]
    UnknownToken(Address),

    #[error("component {component} is not a position of set {set}")]
    ComponentNotFound { set: Address, component: Address },

    #[error("unsupported chain id: {0}")]
    UnsupportedChain(u64),

    #[error("request chain id {requested} does not match configured chain id {configured}")]
    ChainMismatch { requested: u64, configured: u64 },

    #[error("invalid percentage for {0}: must be within [0, 100]")]
    InvalidPercentage(&'static str),
}

/// Position checked against the dust threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DustPosition {
    /// Units of the sold component left in the Set.
    Remaining,
    /// Units of the bought component the Set ends up with.
    New,
}

impl Display for DustPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DustPosition::Remaining => f.write_str("remaining"),
            DustPosition::New => f.write_str("new"),
        }
    }
}

/// Error returned by [`crate::quote::TradeQuoter::generate`].
#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    #[error("requested amount {requested} exceeds available {available}")]
    Capacity { requested: U256, available: U256 },

    #[error("{position} position of {units} units is below the dust threshold of {threshold}")]
    Dust {
        position: DustPosition,
        units: U256,
        threshold: U256,
    },

    #[error("0x quote failed: {0}")]
    UpstreamQuote(#[from] ZeroExError),

    #[error("gas price fetch failed: {0}")]
    GasPrice(#[from] GasOracleError),

    #[error("token list fetch failed: {0}")]
    TokenList(#[from] TokenListError),

    #[error("chain read failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("arithmetic overflow in unit conversion")]
    Overflow,
}

/// Error returned by the RPC provider as a result of a contract call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unexpected empty RPC response")]
    NullResp,

    #[error("call reverted: {0}")]
    Reverted(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<contract::Error> for ProviderError {
    fn from(value: contract::Error) -> Self {
        match value {
            contract::Error::UnknownFunction(_) => Self::Fatal(value.to_string()),
            contract::Error::UnknownSelector(_) => Self::Fatal(value.to_string()),
            contract::Error::NotADeploymentTransaction => Self::Fatal(value.to_string()),
            contract::Error::ContractNotDeployed => Self::Fatal(value.to_string()),
            contract::Error::ZeroData(_, _) => Self::Fatal(value.to_string()),
            contract::Error::AbiError(_) => Self::Fatal(value.to_string()),
            contract::Error::TransportError(rpc_err) => Self::from(rpc_err),
            contract::Error::PendingTransactionError(_) => Self::Transport(value.to_string()),
        }
    }
}

impl<E: Display> From<transports::RpcError<E>> for ProviderError {
    fn from(value: transports::RpcError<E>) -> Self {
        match value {
            transports::RpcError::ErrorResp(ref resp) => {
                let msg = resp.message.to_ascii_lowercase();
                if (resp.code == -32600 || resp.code == -32601 || resp.code == -32602)
                    && (msg.contains("invalid") || msg.contains("not found"))
                {
                    Self::InvalidRequest(msg)
                } else if resp.code == 3 && msg.contains("reverted") {
                    Self::Reverted(value.to_string())
                } else {
                    Self::Transport(value.to_string())
                }
            }
            transports::RpcError::NullResp => Self::NullResp,
            _ => Self::Transport(value.to_string()),
        }
    }
}
