//! Error types for AES-GCM-SIV operations.

use core::fmt;

/// Result type alias for AES-GCM-SIV operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur during AES-GCM-SIV operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Plaintext too long (maximum 2^36 bytes).
    PlaintextTooLong,

    /// Associated data too long (maximum 2^36 bytes).
    AssociatedDataTooLong,

    /// Output buffer length does not match the input length.
    OutputLengthMismatch,

    /// The CPU lacks AES and carry-less multiply instructions.
    CpuNotSupported,

    /// Authentication tag verification failed.
    AuthenticationFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PlaintextTooLong => write!(f, "plaintext too long (maximum 2^36 bytes)"),
            Error::AssociatedDataTooLong => {
                write!(f, "associated data too long (maximum 2^36 bytes)")
            }
            Error::OutputLengthMismatch => {
                write!(f, "output buffer length does not match input length")
            }
            Error::CpuNotSupported => {
                write!(f, "CPU lacks AES and carry-less multiply instructions")
            }
            Error::AuthenticationFailed => write!(f, "authentication tag verification failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
