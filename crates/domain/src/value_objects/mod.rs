//! Small validated value types shared across the domain.

/// Gas price normalization helpers.
pub mod gas_price;
/// Slippage tolerance.
pub mod slippage;
/// Source/destination token pair.
pub mod token_pair;

pub use slippage::Slippage;
pub use token_pair::TokenPair;
