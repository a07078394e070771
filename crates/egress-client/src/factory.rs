//! Proxy-aware client construction.
//!
//! [`ProxyClientFactory`] turns a proxy descriptor into a [`ProxyClient`] whose
//! transport matches the descriptor's [`TransportMode`]. Clients are rebuilt
//! per call; nothing is cached here.

use std::fmt;
use std::sync::Arc;

use egress_common::ClientConfig;
use log::debug;
use reqwest::{Client, Method, RequestBuilder, Response};

use crate::context::RequestContext;
use crate::descriptor::TransportMode;
use crate::error::{ClientError, Result};

/// Builds HTTP clients for proxy descriptors.
///
/// Timeouts and the user agent come from the factory's [`ClientConfig`]; the
/// transport comes from the descriptor passed to each call.
///
/// # Examples
///
/// ```
/// use egress_client::{ProxyClientFactory, TransportMode};
/// use egress_common::ClientConfig;
///
/// let factory = ProxyClientFactory::new(ClientConfig::default().with_timeout_secs(30));
///
/// let direct = factory.build_client("")?;
/// assert!(matches!(direct.mode(), TransportMode::Direct));
///
/// let socks = factory.build_client("socks5h://127.0.0.1:1080")?;
/// assert!(socks.mode().is_proxied());
/// # Ok::<(), egress_client::ClientError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProxyClientFactory {
    config: ClientConfig,
}

impl ProxyClientFactory {
    /// Creates a factory applying `config` to every client it builds.
    #[must_use]
    pub const fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// The configuration applied to built clients.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Builds a client for `descriptor`.
    ///
    /// An empty descriptor yields a direct client and never fails.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The descriptor is not a valid URL
    /// - The scheme is neither `http(s)` nor `socks*`
    /// - The SOCKS dialer cannot be built
    /// - The underlying HTTP client fails to build
    pub fn build_client(&self, descriptor: &str) -> Result<ProxyClient> {
        let mode = TransportMode::classify(descriptor)?;
        self.build_for_mode(mode)
    }

    /// Builds a client for the descriptor stored in the factory's configuration.
    ///
    /// # Errors
    ///
    /// Same as [`build_client`](Self::build_client).
    pub fn build_configured_client(&self) -> Result<ProxyClient> {
        self.build_client(self.config.proxy_descriptor())
    }

    /// Builds a client for an already classified transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy or the underlying HTTP client cannot be built.
    pub fn build_for_mode(&self, mode: TransportMode) -> Result<ProxyClient> {
        let mut builder = Client::builder()
            .connect_timeout(self.config.connect_timeout())
            .user_agent(self.config.user_agent.as_str());

        if let Some(timeout) = self.config.timeout() {
            builder = builder.timeout(timeout);
        }

        builder = match &mode {
            TransportMode::Direct => builder.no_proxy(),
            TransportMode::HttpProxy(endpoint) => {
                builder.proxy(endpoint.to_proxy().map_err(ClientError::TransportInit)?)
            }
            TransportMode::SocksProxy(dialer) => builder.proxy(dialer.to_proxy()?),
        };

        let inner = builder.build().map_err(ClientError::TransportInit)?;
        debug!("built outbound client ({mode})");

        Ok(ProxyClient {
            inner,
            mode: Arc::new(mode),
        })
    }

    /// Builds a fresh client for `descriptor` and issues a single GET.
    ///
    /// # Errors
    ///
    /// Returns a descriptor error before any I/O, a [`ClientError::NetworkError`]
    /// for transport failures, or [`ClientError::Timeout`] /
    /// [`ClientError::Cancelled`] when `ctx` fires first.
    pub async fn get_resource(
        &self,
        url: &str,
        descriptor: &str,
        ctx: &RequestContext,
    ) -> Result<Response> {
        self.build_client(descriptor)?.get(url, ctx).await
    }

    /// Builds a fresh client for `descriptor` and issues a single HEAD.
    ///
    /// # Errors
    ///
    /// Same as [`get_resource`](Self::get_resource).
    pub async fn head_resource(
        &self,
        url: &str,
        descriptor: &str,
        ctx: &RequestContext,
    ) -> Result<Response> {
        self.build_client(descriptor)?.head(url, ctx).await
    }
}

/// An HTTP client bound to one transport.
///
/// The client is cheaply cloneable and can be shared across multiple tasks.
/// It never changes after construction.
#[derive(Clone)]
pub struct ProxyClient {
    inner: Client,
    mode: Arc<TransportMode>,
}

impl ProxyClient {
    /// The transport this client was built for.
    #[must_use]
    pub fn mode(&self) -> &TransportMode {
        &self.mode
    }

    /// The underlying `reqwest` client, for callers that need its full API.
    #[must_use]
    pub const fn inner(&self) -> &Client {
        &self.inner
    }

    /// Starts an arbitrary request through this client's transport.
    ///
    /// Send it with [`execute`](Self::execute) to honor a [`RequestContext`].
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.inner.request(method, url)
    }

    /// Makes a GET request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or `ctx` fires first.
    pub async fn get(&self, url: &str, ctx: &RequestContext) -> Result<Response> {
        self.execute(self.request(Method::GET, url), ctx).await
    }

    /// Makes a HEAD request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or `ctx` fires first.
    pub async fn head(&self, url: &str, ctx: &RequestContext) -> Result<Response> {
        self.execute(self.request(Method::HEAD, url), ctx).await
    }

    /// Sends a request under `ctx`. No retries are attempted.
    ///
    /// `ctx` bounds the request until the response headers arrive. Reading
    /// the body afterwards is not bounded by it; use [`read_text`] to keep
    /// the body read under the same context.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NetworkError`] if the request cannot be built or sent
    /// - [`ClientError::Timeout`] if the deadline or client timeout elapses
    /// - [`ClientError::Cancelled`] if the context is cancelled
    pub async fn execute(&self, builder: RequestBuilder, ctx: &RequestContext) -> Result<Response> {
        let request = builder.build()?;
        debug!(
            "{} {} via {}",
            request.method(),
            request.url(),
            self.mode
        );

        ctx.run(async {
            self.inner
                .execute(request)
                .await
                .map_err(ClientError::from_transport)
        })
        .await
    }
}

/// Reads the response body as text under `ctx`.
///
/// # Errors
///
/// - [`ClientError::NetworkError`] if the body cannot be read or decoded
/// - [`ClientError::Timeout`] if the deadline or client timeout elapses
/// - [`ClientError::Cancelled`] if the context is cancelled
pub async fn read_text(response: Response, ctx: &RequestContext) -> Result<String> {
    ctx.run(async { response.text().await.map_err(ClientError::from_transport) })
        .await
}

impl fmt::Debug for ProxyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyClient")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
