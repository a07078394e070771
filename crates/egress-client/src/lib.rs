//! # egress-client
//!
//! Proxy-aware outbound HTTP clients.
//!
//! A proxy descriptor selects the transport:
//! - `""`: direct connection (proxy environment variables are ignored)
//! - `http://host:port`, `https://host:port`: HTTP proxy (absolute-form or CONNECT)
//! - `socks4://`, `socks4a://`, `socks5://`, `socks5h://`: SOCKS proxy
//!
//! Credentials may be embedded with the usual `user:pass@` syntax. Any other
//! scheme is rejected; there is no silent fallback to a direct connection.
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use egress_client::{ProxyClientFactory, RequestContext};
//! use egress_common::ClientConfig;
//!
//! # async fn example() -> Result<(), egress_client::ClientError> {
//! let factory = ProxyClientFactory::new(ClientConfig::from_env().unwrap_or_default());
//! let ctx = RequestContext::with_timeout(Duration::from_secs(10));
//!
//! let response = factory
//!     .get_resource("https://example.com/", "socks5h://127.0.0.1:1080", &ctx)
//!     .await?;
//! println!("status: {}", response.status());
//! # Ok(())
//! # }
//! ```

use reqwest::Response;

pub mod context;
pub mod descriptor;
pub mod error;
pub mod factory;

pub use context::RequestContext;
pub use descriptor::{ProxyEndpoint, SocksDialer, SocksVersion, TransportMode};
pub use error::{ClientError, Result};
pub use factory::{ProxyClient, ProxyClientFactory, read_text};

/// Builds a client for `descriptor` with default settings.
///
/// # Errors
///
/// See [`ProxyClientFactory::build_client`].
pub fn build_client(descriptor: &str) -> Result<ProxyClient> {
    ProxyClientFactory::default().build_client(descriptor)
}

/// Builds a fresh client for `descriptor` and issues a single GET to `url`.
///
/// The request is bounded only by the default connect timeout; use
/// [`ProxyClientFactory::get_resource`] to pass a [`RequestContext`].
///
/// # Errors
///
/// See [`ProxyClientFactory::get_resource`].
pub async fn get_resource(url: &str, descriptor: &str) -> Result<Response> {
    ProxyClientFactory::default()
        .get_resource(url, descriptor, &RequestContext::background())
        .await
}

/// Builds a fresh client for `descriptor` and issues a single HEAD to `url`.
///
/// # Errors
///
/// See [`ProxyClientFactory::head_resource`].
pub async fn head_resource(url: &str, descriptor: &str) -> Result<Response> {
    ProxyClientFactory::default()
        .head_resource(url, descriptor, &RequestContext::background())
        .await
}
