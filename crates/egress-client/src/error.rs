//! Error types for the client factory.

use thiserror::Error;

/// Errors that can occur when building a proxy-aware client or issuing a request.
///
/// Descriptor problems ([`InvalidDescriptor`](Self::InvalidDescriptor),
/// [`UnsupportedProxyScheme`](Self::UnsupportedProxyScheme),
/// [`ProxyDialerError`](Self::ProxyDialerError)) are detected before any
/// socket is opened.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The proxy descriptor is not a valid URL.
    #[error("Invalid proxy descriptor: {0}")]
    InvalidDescriptor(#[from] url::ParseError),

    /// The descriptor's scheme is neither `http(s)` nor `socks*`.
    ///
    /// Unknown schemes never fall back to a direct connection.
    #[error("Unsupported proxy scheme: {0}")]
    UnsupportedProxyScheme(String),

    /// The SOCKS dialer could not be constructed from the descriptor.
    ///
    /// Covers unknown SOCKS versions, a missing host and invalid credentials.
    #[error("Proxy dialer error: {0}")]
    ProxyDialerError(String),

    /// The underlying HTTP transport could not be initialized.
    #[error("Transport initialization failed: {0}")]
    TransportInit(#[source] reqwest::Error),

    /// Transport failure while performing a request.
    ///
    /// DNS resolution, refused connections, TLS failures and proxy handshake
    /// failures all surface here with the underlying error attached.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The request deadline or the configured client timeout elapsed.
    #[error("Request timed out")]
    Timeout,

    /// The caller cancelled the request.
    #[error("Request cancelled")]
    Cancelled,
}

impl ClientError {
    /// Classifies an error returned by the transport.
    ///
    /// Client-level timeouts become [`ClientError::Timeout`]; everything else
    /// is wrapped unchanged in [`ClientError::NetworkError`].
    #[must_use]
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::NetworkError(err)
        }
    }

    /// Check if this error was caused by the proxy descriptor or client setup.
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDescriptor(_)
                | Self::UnsupportedProxyScheme(_)
                | Self::ProxyDialerError(_)
                | Self::TransportInit(_)
        )
    }

    /// Check if this is a timeout.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Check if the request was cancelled by the caller.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this error is potentially retryable.
    ///
    /// Nothing in this crate retries; callers can use this to drive their own policy.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError(_) | Self::Timeout)
    }
}

/// Result type alias using `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;
