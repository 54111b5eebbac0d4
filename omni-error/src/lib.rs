//! # omni-error
//!
//! Unified error handling for Omni Coder.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., CredentialsMissing, InferenceFailed)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary, Persistent)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use omni_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::CredentialsMissing, "GROQ_API_KEY is missing")
//!         .with_operation("coder::solve")
//!         .with_context("provider", "groq"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All library functions return `Result<T, omni_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using the Omni Coder error
pub type Result<T> = std::result::Result<T, Error>;
