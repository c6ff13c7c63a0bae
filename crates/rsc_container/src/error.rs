//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::store::Store;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// Transparent warpper for [`std::string::FromUtf8Error`]
    #[error(transparent)]
    UTF8Error(#[from] std::string::FromUtf8Error),

    /// The block tree violates the container layout
    #[error("invalid container at offset {offset:#x}: {reason}")]
    #[diagnostic(code(rsc_container::format))]
    Format {
        /// Offset into the structure store (or the store being resolved)
        offset: u64,
        /// Which invariant was violated
        reason: String,
    },

    /// A pointer references a store which does not exist
    #[error("{store} store {location} is referenced but missing")]
    #[diagnostic(
        code(rsc_container::missing_store),
        help("load without strict mode to continue with empty data")
    )]
    MissingStore {
        /// The absent store
        store: Store,
        /// Where the store was expected
        location: String,
    },

    /// A store grew beyond what a 32 bit pointer can address
    #[error("{0} store exceeds 4 GiB")]
    StoreOverflow(Store),

    /// Requested resource name is absent from the container
    #[error("resource {0:?} not found in container")]
    #[diagnostic(code(rsc_container::resource_mismatch))]
    ResourceMismatch(String),

    /// A deferred pointer field was never filled in
    #[error("patch site {0} was never resolved")]
    PatchUnresolved(&'static str),
}

impl Error {
    pub(crate) fn format(offset: u64, reason: impl Into<String>) -> Self {
        Error::Format {
            offset,
            reason: reason.into(),
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
