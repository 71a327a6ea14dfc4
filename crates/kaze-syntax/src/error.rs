//! Error handling types shared by the Kaze toolchain.
//!
//! Every stage (lexer diagnostics, parser, evaluator, builtins) reports
//! failures as an [`Error`] carrying a textual message. The interpreter keeps
//! runtime errors strictly in the `Err` channel of [`Result`], so an error can
//! never be stored inside user-visible data structures.
//!
//! ```rust
//! use kaze_syntax::error::{error, Error, Result};
//!
//! fn parse_digit(s: &str) -> Result<i64> {
//!     s.parse()
//!         .map_err(|_| Error::new(format!("could not parse {:?} as integer", s)))
//! }
//!
//! fn positive(n: i64) -> Result<i64> {
//!     if n < 0 {
//!         error("number must be positive")
//!     } else {
//!         Ok(n)
//!     }
//! }
//! ```

use std::fmt;

/// An error produced while lexing, parsing or evaluating a Kaze program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// Human-readable error message.
    pub msg: String,
}

impl Error {
    /// Creates a new error with the given message.
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::new(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::new(s)
    }
}

/// A specialized `Result` type for Kaze operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Shorthand for `Err(Error::new(msg))`.
pub fn error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::new(msg))
}
