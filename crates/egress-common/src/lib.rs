//! # egress-common
//!
//! Shared building blocks for outbound connectivity:
//! - [`ClientConfig`]: proxy descriptor, timeouts and user agent, loadable from
//!   TOML and `EGRESS_*` environment variables
//! - [`TokenGenerator`]: fixed-length, high-entropy opaque tokens
//!
//! ## Example
//!
//! ```
//! use egress_common::{ClientConfig, TokenGenerator};
//!
//! let config = ClientConfig::from_toml_str(r#"proxy = "socks5://127.0.0.1:1080""#)?;
//! assert_eq!(config.proxy_descriptor(), "socks5://127.0.0.1:1080");
//!
//! let token = TokenGenerator::new().generate();
//! assert_eq!(token.as_str().len(), 48);
//! # Ok::<(), egress_common::ConfigError>(())
//! ```

/// Client configuration and environment overrides.
pub mod config;
/// Configuration error types.
pub mod error;
/// Opaque token generation.
pub mod token;

pub use config::ClientConfig;
pub use error::ConfigError;
pub use token::{Token, TokenGenerator, generate_token, uuid_hex};
