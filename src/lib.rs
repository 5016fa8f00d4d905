//! Diagnostics and text utilities for Windows applications
//!
//! This crate wraps the Windows APIs an application needs to report problems
//! and move text between encodings: code page conversion with fallback,
//! registry-configured diagnostic output, whole-file I/O, string table
//! resources and well-known directories.
//!
//! On other targets the same API is backed by portable implementations:
//! `encoding_rs` for code pages, an in-memory configuration store in place of
//! the registry, and `tracing` in place of the debugger and message boxes.
//!
//! # Features
//!
//! - `full` - Enable all features
//! - `diagnostics` - Diagnostic output routed to a log file, the console and message boxes
//! - `file` - Whole-file reads and writes, including encoded text
//! - `registry` - Registry access behind the [`ConfigStore`](registry::ConfigStore) trait
//! - `resource` - Localized strings from module string tables
//! - `string` - Code page conversion with a fallback chain
//! - `tracing` - Log internal failures through [`tracing`](https://docs.rs/tracing)
//!
//! # Examples
//!
//! ## Diagnostics
//!
//! Report to a log file and the console, unless the registry says otherwise:
//!
//! ```no_run
//! # #[cfg(feature = "diagnostics")]
//! # {
//! use zenutils::diagnostics::{Diagnostics, OutputLevel};
//!
//! let mut diagnostics = Diagnostics::new(Some("Setup.log"), "1.2.3.4");
//! if !diagnostics.set_output(OutputLevel::FROM_REGISTRY) {
//!     diagnostics.set_output(OutputLevel::LOG_FILE | OutputLevel::CONSOLE);
//! }
//! diagnostics.report("setup started");
//! diagnostics.report_value("files copied", 42);
//! # }
//! ```
//!
//! See [diagnostics].
//!
//! ## Strings
//!
//! Decode text whose label may be wrong:
//!
//! ```
//! # #[cfg(feature = "string")]
//! # {
//! use zenutils::string::{to_unicode, CodePage};
//!
//! // Not 7-bit ASCII, so this is decoded by the UTF-8 fallback
//! let text = to_unicode(c"Caf\xc3\xa9", CodePage::UsAscii)?;
//! assert_eq!(text.to_string_lossy(), "Café");
//! # }
//! # Ok::<(), zenutils::Error>(())
//! ```
//!
//! See [string].

#[macro_use]
mod trace;

#[cfg(feature = "diagnostics")]
pub mod diagnostics;
mod error;
#[cfg(feature = "file")]
pub mod file;
pub mod platform;
#[cfg(feature = "registry")]
pub mod registry;
#[cfg(feature = "resource")]
pub mod resource;
#[cfg(feature = "string")]
pub mod string;
pub mod sys;
pub mod text;
mod util;

pub use error::{Error, Result};
