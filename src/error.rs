//! Error type for conversions and the operations built on them.

use std::io;

/// Errors returned by code page conversions.
///
/// Operating system wrappers (registry, files, resources) report plain
/// [`io::Error`]s; this type wraps those when a conversion and an I/O call
/// are combined, as in `TextFile::read_text`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The code page has no converter on this system.
    #[error("code page {0} is not supported on this system")]
    UnsupportedCodePage(u32),

    /// A single-attempt conversion produced no characters.
    #[error("conversion with code page {code_page} produced no characters")]
    Conversion {
        /// Code page the conversion was attempted with.
        code_page: u32,
    },

    /// The requested code page and every fallback code page failed.
    #[error("no code page could decode the input (tried {tried:?})")]
    FallbackExhausted {
        /// Code pages attempted, in order.
        tried: Vec<u32>,
    },

    /// An I/O error.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias for conversions.
pub type Result<T> = std::result::Result<T, Error>;
