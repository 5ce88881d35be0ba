use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The source/destination token pair of a recurring trade.
///
/// The guard requires an attempt's pair to match the strategy's pair
/// exactly, so equality here is exact symbol equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPair {
    pub source: String,
    pub destination: String,
}

impl TokenPair {
    /// Builds a pair from two token symbols.
    ///
    /// # Errors
    /// Rejects empty symbols and identical source/destination.
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let source = source.into().trim().to_string();
        let destination = destination.into().trim().to_string();

        if source.is_empty() || destination.is_empty() {
            return Err(ValidationError::EmptyTokenSymbol);
        }
        if source == destination {
            return Err(ValidationError::IdenticalTokens(source));
        }

        Ok(Self {
            source,
            destination,
        })
    }
}

impl fmt::Display for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_trims_symbols() {
        let pair = TokenPair::new(" USDC ", "ETH").unwrap();
        assert_eq!(pair.source, "USDC");
        assert_eq!(pair.destination, "ETH");
    }

    #[test]
    fn test_pair_rejects_empty() {
        assert_eq!(
            TokenPair::new("", "ETH"),
            Err(ValidationError::EmptyTokenSymbol)
        );
        assert_eq!(
            TokenPair::new("USDC", "  "),
            Err(ValidationError::EmptyTokenSymbol)
        );
    }

    #[test]
    fn test_pair_rejects_identical() {
        assert_eq!(
            TokenPair::new("ETH", "ETH"),
            Err(ValidationError::IdenticalTokens("ETH".to_string()))
        );
    }
}
