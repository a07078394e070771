//! Caller-supplied deadlines and cancellation.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, Result};

/// Bounds the lifetime of a request.
///
/// A context carries an optional deadline and a [`CancellationToken`]. When
/// either fires, the in-flight request future is dropped, which tears down the
/// connection attempt (including any SOCKS handshake) immediately.
///
/// Contexts are cheap to clone; clones share the same token.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use egress_client::RequestContext;
///
/// let ctx = RequestContext::with_timeout(Duration::from_secs(5));
/// let token = ctx.cancellation_token().clone();
///
/// // Some other task can abort the request:
/// token.cancel();
/// assert!(ctx.is_done());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context that never expires and is only cancelled explicitly.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().with_deadline(Instant::now() + timeout)
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Uses an existing cancellation token, e.g. one shared with a server shutdown.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Derives a context that is cancelled together with this one but can
    /// also be cancelled on its own. The deadline is inherited.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    /// The token that aborts requests running under this context.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the context has been cancelled or its deadline has passed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Runs `fut` until it completes, the token is cancelled, or the deadline passes.
    ///
    /// Cancellation takes priority over the deadline, and both take priority
    /// over a result that becomes ready at the same time.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Cancelled`] or [`ClientError::Timeout`] if the
    /// context fires first, otherwise whatever `fut` returns.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let deadline = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ClientError::Cancelled),
            () = deadline => Err(ClientError::Timeout),
            result = fut => result,
        }
    }
}
