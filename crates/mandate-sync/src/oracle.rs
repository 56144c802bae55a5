//! The existence oracle: the only remote capability the crawler relies on.

use async_trait::async_trait;

use crate::OracleError;

/// Reports whether a symbol exists remotely and produces its raw bytes.
///
/// Every error is treated as transient: the crawler retries a bounded number
/// of times and never records an errored position as a miss.
#[async_trait]
pub trait ExistenceOracle: Send + Sync {
    async fn exists(&self, symbol: &str) -> Result<bool, OracleError>;

    async fn fetch(&self, symbol: &str) -> Result<Vec<u8>, OracleError>;
}

#[async_trait]
impl<T: ExistenceOracle + ?Sized> ExistenceOracle for std::sync::Arc<T> {
    async fn exists(&self, symbol: &str) -> Result<bool, OracleError> {
        (**self).exists(symbol).await
    }

    async fn fetch(&self, symbol: &str) -> Result<Vec<u8>, OracleError> {
        (**self).fetch(symbol).await
    }
}
