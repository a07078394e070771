//! Opaque token generation.
//!
//! Tokens are 48 ASCII characters: a 16-character block sampled uniformly from
//! `0-9a-zA-Z`, followed by the 32-character hex rendering of a random (v4) UUID
//! in which every even-indexed lowercase letter is upper-cased.
//!
//! # Examples
//!
//! ```
//! use egress_common::token::{TOKEN_LEN, TokenGenerator};
//!
//! let generator = TokenGenerator::new();
//! let token = generator.generate();
//! assert_eq!(token.as_str().len(), TOKEN_LEN);
//! ```

use std::fmt;
use std::sync::{Mutex, PoisonError};

use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use uuid::Uuid;

/// Total length of a generated token.
pub const TOKEN_LEN: usize = 48;

/// Length of the uniformly sampled prefix.
pub const RANDOM_SEGMENT_LEN: usize = 16;

/// Symbols the random prefix is drawn from.
pub const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A generated opaque token.
///
/// Tokens are typically used as credentials, so the `Debug` representation
/// never shows the value. Use [`Token::as_str`] or `Display` to read it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token, returning the underlying string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// The uniformly sampled 16-character prefix.
    #[must_use]
    pub fn random_segment(&self) -> &str {
        &self.0[..RANDOM_SEGMENT_LEN]
    }

    /// The 32-character segment derived from the UUID.
    #[must_use]
    pub fn uuid_segment(&self) -> &str {
        &self.0[RANDOM_SEGMENT_LEN..]
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token").field(&"[REDACTED]").finish()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl PartialEq<str> for Token {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Generates tokens from an injected random source.
///
/// The source sits behind a mutex so a single generator can be shared across
/// threads. The default source is a [`StdRng`] seeded from OS entropy; tests
/// can inject a seeded RNG for reproducible output.
///
/// ```
/// use egress_common::token::TokenGenerator;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let a = TokenGenerator::with_rng(StdRng::seed_from_u64(7));
/// let b = TokenGenerator::with_rng(StdRng::seed_from_u64(7));
/// assert_eq!(a.generate(), b.generate());
/// ```
pub struct TokenGenerator<R = StdRng> {
    rng: Mutex<R>,
}

impl TokenGenerator<StdRng> {
    /// Creates a generator backed by a cryptographically secure RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Default for TokenGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore> TokenGenerator<R> {
    /// Creates a generator drawing from `rng`.
    pub const fn with_rng(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Generates a new 48-character token.
    pub fn generate(&self) -> Token {
        self.with_source(compose_token)
    }

    /// Returns a random UUID as 32 lowercase hex characters without dashes.
    pub fn uuid_hex(&self) -> String {
        self.with_source(|rng| random_uuid(rng).simple().to_string())
    }

    /// Returns a uniformly distributed integer in `[0, max)`.
    ///
    /// Returns `None` when `max` is zero, since the range is empty.
    pub fn random_below(&self, max: u32) -> Option<u32> {
        if max == 0 {
            return None;
        }
        Some(self.with_source(|rng| rng.gen_range(0..max)))
    }

    fn with_source<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        // A panic while holding the lock cannot leave the RNG in an invalid state.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *rng)
    }
}

impl<R> fmt::Debug for TokenGenerator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGenerator").finish_non_exhaustive()
    }
}

/// Generates a token using the calling thread's CSPRNG.
#[must_use]
pub fn generate_token() -> Token {
    compose_token(&mut rand::thread_rng())
}

/// Returns a random UUID as 32 lowercase hex characters without dashes,
/// using the calling thread's CSPRNG.
#[must_use]
pub fn uuid_hex() -> String {
    random_uuid(&mut rand::thread_rng()).simple().to_string()
}

fn random_uuid<R: RngCore>(rng: &mut R) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

fn compose_token<R: RngCore>(rng: &mut R) -> Token {
    let mut token = String::with_capacity(TOKEN_LEN);

    for _ in 0..RANDOM_SEGMENT_LEN {
        let idx = rng.gen_range(0..ALPHABET.len());
        token.push(char::from(ALPHABET[idx]));
    }

    let hex = random_uuid(rng).simple().to_string();
    token.extend(hex.chars().enumerate().map(|(i, c)| {
        if i % 2 == 0 && c.is_ascii_lowercase() {
            c.to_ascii_uppercase()
        } else {
            c
        }
    }));

    trace!("generated token ({} chars)", token.len());
    Token(token)
}
