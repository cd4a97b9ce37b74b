//! Request context: deadline and cancellation for outbound calls

use crate::error::{DirectoryError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Deadline and cancellation carried through a single lookup
///
/// Every outbound directory call is driven through [`RequestContext::run`],
/// which returns as soon as the context is cancelled or its deadline passes
/// instead of waiting for the in-flight request to finish.
#[derive(Debug, Clone)]
pub struct RequestContext {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl RequestContext {
    /// A context with no deadline that is never cancelled
    pub fn background() -> Self {
        Self {
            deadline: None,
            token: CancellationToken::new(),
        }
    }

    /// A context cancelled through the given token
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            deadline: None,
            token,
        }
    }

    /// Derive a child context that expires at `deadline` or earlier
    ///
    /// Cancelling the parent cancels the child; cancelling the child leaves
    /// the parent untouched.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            token: self.token.child_token(),
        }
    }

    /// Derive a child context that expires after `timeout`
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Deadline of this context, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Token observed by this context
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancel this context and all contexts derived from it
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the context was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fail immediately if the context is already done
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(DirectoryError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(DirectoryError::DeadlineExceeded);
            }
        }
        Ok(())
    }

    /// Drive `fut` until it completes, the context is cancelled, or the
    /// deadline passes, whichever happens first
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;

        let expiry = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(DirectoryError::Cancelled),
            _ = expiry => Err(DirectoryError::DeadlineExceeded),
            out = fut => out,
        }
    }

    /// Sleep for `duration` unless the context ends first
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        self.run(async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::background()
    }
}
