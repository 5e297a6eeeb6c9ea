//! Error taxonomy for deployment operations.
//!
//! Every failure propagates to the invocation boundary. Nothing here is
//! retried internally: ledger transactions are not idempotent, so the
//! caller decides using [`Error::retry_safety`].

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Whether repeating the failed step is safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrySafety {
    /// Nothing reached the ledger; the step can be repeated as-is.
    Safe,
    /// Something may have reached the ledger. Check its state first.
    InspectLedgerFirst,
    /// An internal invariant broke; retrying will not help.
    Never,
}

#[derive(Error, Debug)]
pub enum Error {
    /// External compiler exited non-zero or produced unparseable output.
    #[error("Build failed:\n{diagnostics}")]
    BuildFailed { diagnostics: String },

    /// Hardware device is absent, locked, or its app is not open.
    #[error("Signing device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The user declined the request on the device.
    #[error("Request rejected on the signing device")]
    UserRejected,

    /// The device did not answer within the configured window.
    #[error("Signing device timed out after {0:?}")]
    Timeout(Duration),

    /// Device answered with an unexpected status word.
    #[error("Signing device returned status 0x{status_word:04x}")]
    DeviceResponse { status_word: u16 },

    /// Ledger executed the transaction and reported a non-success status.
    #[error("Transaction failed with status {status}: {detail}")]
    TransactionFailed { status: String, detail: String },

    /// A publish result did not contain exactly one published package.
    #[error("Expected exactly one published package in result, found {count}")]
    AmbiguousPublishResult { count: usize },

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Invalid identity '{input}': {reason}")]
    InvalidIdentity { input: String, reason: String },

    #[error("Signature does not verify against {0}")]
    SignatureMismatch(String),

    #[error("Object not found on ledger: {0}")]
    ObjectNotFound(String),

    #[error("No gas coin owned by {owner} covers budget {budget}")]
    NoGasCoins { owner: String, budget: u64 },

    /// Transport or protocol failure talking to the ledger endpoint.
    #[error("Ledger RPC error: {0}")]
    Rpc(String),

    #[error("Transaction encoding failed: {0}")]
    Encoding(#[from] bcs::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn retry_safety(&self) -> RetrySafety {
        match self {
            Self::BuildFailed { .. }
            | Self::DeviceUnavailable(_)
            | Self::UserRejected
            | Self::Timeout(_)
            | Self::DeviceResponse { .. }
            | Self::InvalidKey(_)
            | Self::InvalidIdentity { .. }
            | Self::ObjectNotFound(_)
            | Self::NoGasCoins { .. }
            | Self::Io(_) => RetrySafety::Safe,
            Self::TransactionFailed { .. } | Self::Rpc(_) => RetrySafety::InspectLedgerFirst,
            Self::AmbiguousPublishResult { .. }
            | Self::SignatureMismatch(_)
            | Self::Encoding(_) => RetrySafety::Never,
        }
    }

    /// Device failures the user can fix by reconnecting or re-confirming.
    pub fn is_device_failure(&self) -> bool {
        matches!(
            self,
            Self::DeviceUnavailable(_)
                | Self::UserRejected
                | Self::Timeout(_)
                | Self::DeviceResponse { .. }
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Rpc(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_device_failures_are_safe_to_retry() {
        let build = Error::BuildFailed {
            diagnostics: "error[E01001]".to_string(),
        };
        assert_eq!(build.retry_safety(), RetrySafety::Safe);
        assert_eq!(Error::UserRejected.retry_safety(), RetrySafety::Safe);
        assert_eq!(
            Error::Timeout(Duration::from_secs(1)).retry_safety(),
            RetrySafety::Safe
        );
    }

    #[test]
    fn transaction_failures_require_inspection() {
        let err = Error::TransactionFailed {
            status: "failure".to_string(),
            detail: "InsufficientGas".to_string(),
        };
        assert_eq!(err.retry_safety(), RetrySafety::InspectLedgerFirst);
        assert!(!err.is_device_failure());
    }

    #[test]
    fn ambiguous_publish_is_never_retried() {
        let err = Error::AmbiguousPublishResult { count: 2 };
        assert_eq!(err.retry_safety(), RetrySafety::Never);
        assert!(err.to_string().contains("found 2"));
    }
}
