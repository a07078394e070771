//! Proxy descriptor parsing and transport selection.
//!
//! A descriptor is classified exactly once into a [`TransportMode`]. The
//! classification is pure: it never touches the network.

use std::borrow::Cow;
use std::fmt;

use url::Url;

use crate::error::{ClientError, Result};

/// Port used for SOCKS proxies when the descriptor does not name one.
pub const DEFAULT_SOCKS_PORT: u16 = 1080;

/// RFC 1929 caps SOCKS5 username and password at 255 bytes each.
const SOCKS5_MAX_CREDENTIAL_LEN: usize = 255;

/// The scheme token of a descriptor, as written.
enum Scheme<'a> {
    Http,
    Socks,
    Unsupported(&'a str),
}

impl<'a> Scheme<'a> {
    fn of(raw: &'a str) -> Self {
        match raw {
            "http" | "https" => Self::Http,
            s if s.starts_with("socks") => Self::Socks,
            s => Self::Unsupported(s),
        }
    }
}

/// SOCKS protocol variants understood by the dialer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocksVersion {
    /// SOCKS4, target resolved locally.
    V4,
    /// SOCKS4a, target hostname resolved by the proxy.
    V4a,
    /// SOCKS5, target resolved locally.
    V5,
    /// SOCKS5, target hostname resolved by the proxy.
    V5h,
}

impl SocksVersion {
    fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "socks4" => Some(Self::V4),
            "socks4a" => Some(Self::V4a),
            "socks5" => Some(Self::V5),
            "socks5h" => Some(Self::V5h),
            _ => None,
        }
    }

    /// The URL scheme for this version.
    #[must_use]
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::V4 => "socks4",
            Self::V4a => "socks4a",
            Self::V5 => "socks5",
            Self::V5h => "socks5h",
        }
    }

    /// Whether the proxy, rather than the client, resolves target hostnames.
    #[must_use]
    pub const fn resolves_remotely(self) -> bool {
        matches!(self, Self::V4a | Self::V5h)
    }

    const fn supports_credentials(self) -> bool {
        matches!(self, Self::V5 | Self::V5h)
    }
}

/// A parsed proxy endpoint.
///
/// Holds the full descriptor URL, including any credentials. `Display` and
/// `Debug` only ever show `scheme://host:port`.
#[derive(Clone)]
pub struct ProxyEndpoint {
    url: Url,
}

impl ProxyEndpoint {
    const fn new(url: Url) -> Self {
        Self { url }
    }

    /// The descriptor scheme (`http`, `https`, `socks5`, ...).
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// The proxy host.
    #[must_use]
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// The proxy port, falling back to the scheme's default.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.url.port_or_known_default()
    }

    /// Whether the descriptor carries a username or password.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.url.username().is_empty() || self.url.password().is_some()
    }

    /// Percent-decoded username, empty when absent.
    #[must_use]
    pub fn username(&self) -> String {
        decode(self.url.username())
    }

    fn password(&self) -> Option<String> {
        self.url.password().map(decode)
    }

    /// Converts the endpoint into a `reqwest` proxy routing all schemes.
    ///
    /// Embedded credentials are carried over as proxy authentication.
    pub(crate) fn to_proxy(&self) -> std::result::Result<reqwest::Proxy, reqwest::Error> {
        reqwest::Proxy::all(self.url.as_str())
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme(), self.host())?;
        if let Some(port) = self.port() {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyEndpoint")
            .field("endpoint", &self.to_string())
            .field("credentials", &self.has_credentials().then_some("[REDACTED]"))
            .finish()
    }
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), Cow::into_owned)
}

/// A SOCKS dialer bound to a single proxy endpoint.
///
/// The proxy dials the origin directly; there is no chaining. The handshake
/// runs inside the request future, so dropping that future (on cancellation
/// or deadline) aborts the handshake as well.
#[derive(Debug, Clone)]
pub struct SocksDialer {
    version: SocksVersion,
    endpoint: ProxyEndpoint,
}

impl SocksDialer {
    /// Builds a dialer from a parsed descriptor whose scheme starts with `socks`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ProxyDialerError`] if:
    /// - The scheme is not `socks4`, `socks4a`, `socks5` or `socks5h`
    /// - The descriptor has no host
    /// - Credentials are given for SOCKS4
    /// - A SOCKS5 password is given without a username
    /// - A SOCKS5 username or password exceeds 255 bytes
    pub fn from_url(mut url: Url) -> Result<Self> {
        let version = SocksVersion::from_scheme(url.scheme()).ok_or_else(|| {
            ClientError::ProxyDialerError(format!(
                "unsupported SOCKS version in scheme {:?}",
                url.scheme()
            ))
        })?;

        if url.host_str().is_none_or(str::is_empty) {
            return Err(ClientError::ProxyDialerError(
                "missing proxy host".to_string(),
            ));
        }

        if url.port().is_none() {
            url.set_port(Some(DEFAULT_SOCKS_PORT)).map_err(|()| {
                ClientError::ProxyDialerError("cannot assign default SOCKS port".to_string())
            })?;
        }

        let endpoint = ProxyEndpoint::new(url);
        Self::check_credentials(version, &endpoint)?;

        Ok(Self { version, endpoint })
    }

    fn check_credentials(version: SocksVersion, endpoint: &ProxyEndpoint) -> Result<()> {
        if !endpoint.has_credentials() {
            return Ok(());
        }

        if !version.supports_credentials() {
            return Err(ClientError::ProxyDialerError(format!(
                "{} does not support authentication",
                version.scheme()
            )));
        }

        let username = endpoint.username();
        let password = endpoint.password().unwrap_or_default();

        if username.is_empty() {
            return Err(ClientError::ProxyDialerError(
                "SOCKS5 password given without a username".to_string(),
            ));
        }

        if username.len() > SOCKS5_MAX_CREDENTIAL_LEN
            || password.len() > SOCKS5_MAX_CREDENTIAL_LEN
        {
            return Err(ClientError::ProxyDialerError(format!(
                "SOCKS5 credentials must be at most {SOCKS5_MAX_CREDENTIAL_LEN} bytes"
            )));
        }

        Ok(())
    }

    /// The SOCKS protocol version.
    #[must_use]
    pub const fn version(&self) -> SocksVersion {
        self.version
    }

    /// The proxy endpoint the dialer connects to.
    #[must_use]
    pub const fn endpoint(&self) -> &ProxyEndpoint {
        &self.endpoint
    }

    pub(crate) fn to_proxy(&self) -> Result<reqwest::Proxy> {
        self.endpoint
            .to_proxy()
            .map_err(|e| ClientError::ProxyDialerError(e.to_string()))
    }
}

/// How an outbound client reaches the network.
#[derive(Debug, Clone)]
pub enum TransportMode {
    /// Connect to origins directly. Proxy environment variables are ignored.
    Direct,
    /// Route every request through an HTTP(S) proxy.
    HttpProxy(ProxyEndpoint),
    /// Dial origins through a SOCKS proxy.
    SocksProxy(SocksDialer),
}

impl TransportMode {
    /// Classifies a proxy descriptor.
    ///
    /// The scheme is matched as written (case-sensitive):
    /// - `""` selects [`TransportMode::Direct`] and never fails
    /// - `http` and `https` select [`TransportMode::HttpProxy`]
    /// - schemes starting with `socks` select [`TransportMode::SocksProxy`]
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidDescriptor`] if the descriptor is not a URL
    /// - [`ClientError::UnsupportedProxyScheme`] for any other scheme
    /// - [`ClientError::ProxyDialerError`] if the SOCKS dialer cannot be built
    ///
    /// # Examples
    ///
    /// ```
    /// use egress_client::{ClientError, TransportMode};
    ///
    /// assert!(matches!(TransportMode::classify(""), Ok(TransportMode::Direct)));
    /// assert!(matches!(
    ///     TransportMode::classify("http://127.0.0.1:3128"),
    ///     Ok(TransportMode::HttpProxy(_))
    /// ));
    /// assert!(matches!(
    ///     TransportMode::classify("ftp://mirror.local:21"),
    ///     Err(ClientError::UnsupportedProxyScheme(_))
    /// ));
    /// ```
    pub fn classify(descriptor: &str) -> Result<Self> {
        if descriptor.is_empty() {
            return Ok(Self::Direct);
        }

        let url = Url::parse(descriptor)?;
        // URL parsing strips leading C0 controls and spaces; do the same here.
        let trimmed = descriptor.trim_start_matches(|c: char| c <= ' ');
        let raw_scheme = trimmed
            .split_once(':')
            .map_or(trimmed, |(scheme, _)| scheme);

        match Scheme::of(raw_scheme) {
            Scheme::Http => Ok(Self::HttpProxy(ProxyEndpoint::new(url))),
            Scheme::Socks => SocksDialer::from_url(url).map(Self::SocksProxy),
            Scheme::Unsupported(scheme) => {
                Err(ClientError::UnsupportedProxyScheme(scheme.to_string()))
            }
        }
    }

    /// Whether requests go through a proxy.
    #[must_use]
    pub const fn is_proxied(&self) -> bool {
        !matches!(self, Self::Direct)
    }

    /// The proxy endpoint, if any.
    #[must_use]
    pub const fn endpoint(&self) -> Option<&ProxyEndpoint> {
        match self {
            Self::Direct => None,
            Self::HttpProxy(endpoint) => Some(endpoint),
            Self::SocksProxy(dialer) => Some(dialer.endpoint()),
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::HttpProxy(endpoint) => write!(f, "http proxy {endpoint}"),
            Self::SocksProxy(dialer) => write!(f, "socks proxy {}", dialer.endpoint()),
        }
    }
}
