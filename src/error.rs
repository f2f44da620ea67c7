//! Typed errors for failures callers match on. Everything else travels as `anyhow::Error`.

use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// A dispatcher source `syn` could not parse
    InvalidSyntax(String),
    /// A version name that is not one of the known aliases
    UnknownVersion(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidSyntax(msg) => write!(f, "Invalid Rust syntax: {}", msg),
            Error::UnknownVersion(v) => write!(
                f,
                "Unknown API version '{}' (expected one of: v1, legacy, v2, v20, v2-dev, v20-dev)",
                v
            ),
        }
    }
}

impl std::error::Error for Error {}

impl From<syn::Error> for Error {
    fn from(err: syn::Error) -> Self {
        Error::InvalidSyntax(err.to_string())
    }
}
