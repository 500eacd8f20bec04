//! Cooperative cancellation for dialect conversion

use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

use super::error::ConversionError;

const DEFAULT_REASON: &str = "operation was cancelled";

/// Cancellation token carrying the reason it was triggered with
///
/// Clones share state: cancelling any clone cancels all of them.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    token: CancellationToken,
    reason: Arc<OnceLock<String>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel with the default reason
    pub fn cancel(&self) {
        self.cancel_with(DEFAULT_REASON);
    }

    /// Cancel with a reason; the first reason given wins
    pub fn cancel_with(&self, reason: impl Into<String>) {
        let _ = self.reason.set(reason.into());
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Reason the token was cancelled with, if it was
    pub fn reason(&self) -> Option<&str> {
        if !self.is_cancelled() {
            return None;
        }
        Some(self.reason.get().map(String::as_str).unwrap_or(DEFAULT_REASON))
    }

    /// Fail with [`ConversionError::Cancelled`] once the token has fired
    pub fn check(&self) -> Result<(), ConversionError> {
        match self.reason() {
            Some(reason) => Err(ConversionError::Cancelled {
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Wait until the token is cancelled
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Underlying token, for use with `tokio::select!` and friends
    pub fn as_cancellation_token(&self) -> &CancellationToken {
        &self.token
    }
}

impl From<CancellationToken> for CancelToken {
    fn from(token: CancellationToken) -> Self {
        Self {
            token,
            reason: Arc::default(),
        }
    }
}
