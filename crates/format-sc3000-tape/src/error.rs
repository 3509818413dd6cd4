//! Error types for tape encoding and decoding.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for tape operations.
pub type Result<T> = std::result::Result<T, TapeError>;

/// Everything that can stop an encode or decode.
///
/// Encoding is correct-or-rejected: every variant is terminal.
#[derive(Debug, Error)]
pub enum TapeError {
    /// Malformed command-line arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// BASIC tapes need a tokeniser that does not exist yet.
    #[error("BASIC support not yet implemented")]
    UnsupportedMode,

    /// Start address does not fit the 16-bit header field.
    #[error("start address '{address}' is too high (maximum is $FFFF)")]
    AddressOutOfRange { address: String },

    /// Program does not fit the 16-bit length field.
    #[error("program is too large: {len} bytes (maximum is 65535)")]
    InputTooLarge { len: usize },

    #[error("input file '{}' not found", path.display())]
    InputNotFound { path: PathBuf },

    #[error("failed to read input file '{}': {source}", path.display())]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output file '{}' must have a '.wav' extension", path.display())]
    OutputExtensionInvalid { path: PathBuf },

    #[error("failed to write output file '{}': {source}", path.display())]
    OutputUnwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The sample sink failed mid-stream.
    #[error("sample sink write failed: {0}")]
    Sink(#[from] io::Error),

    /// The WAV container is unreadable or not in the tape sample format.
    #[error("invalid tape container: {0}")]
    InvalidContainer(String),

    /// Sample stream ended in the middle of a record.
    #[error("tape truncated at sample {offset}")]
    Truncated { offset: usize },

    /// A byte frame had a bad start or stop bit.
    #[error("framing error at sample {offset}")]
    Framing { offset: usize },

    #[error("unknown key-code ${code:02X}")]
    UnknownKeyCode { code: u8 },

    #[error("{record} record checksum mismatch (expected ${expected:02X}, got ${found:02X})")]
    ChecksumMismatch {
        record: &'static str,
        expected: u8,
        found: u8,
    },
}
