//! Error types raised by the engine and by its callers.

use rust_decimal::Decimal;
use thiserror::Error;

/// The head data handed to the engine cannot support the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("no salary heads resolved for {requested} selected head id(s)")]
    NoHeadsResolved { requested: usize },
    /// The configured values produce an amount outside the decimal range.
    #[error("amount overflowed while computing {context}")]
    AmountOverflow { context: String },
}

impl ConfigurationError {
    pub(crate) fn overflow(context: impl Into<String>) -> Self {
        ConfigurationError::AmountOverflow {
            context: context.into(),
        }
    }
}

/// A request rejected before the engine is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid salary mode {0:?} (expected \"CTC\" or \"GROSS\")")]
    InvalidMode(String),
    #[error("input amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("input amount {0} exceeds the supported maximum of {1}")]
    AmountTooLarge(Decimal, Decimal),
}
