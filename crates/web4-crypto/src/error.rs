use thiserror::Error;

/// Internal crypto error detail. Keepers collapse every variant to the
/// opaque `LedgerError::CryptoFailure` before it crosses a public interface;
/// only `AuthFailed` semantics (vs. success) may influence control flow.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("authentication failed")]
    AuthFailed,

    #[error("random number generator unavailable")]
    Rng,

    #[error("invalid key material")]
    InvalidKey,

    #[error("invalid input length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
}
