//! Error types for mojoflash.

use std::io;
use thiserror::Error;

/// Result type for mojoflash operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Protocol phase in which a reply gate failed.
///
/// Every phase of the bootloader conversation is gated by a single
/// acknowledgment byte; this names the gate for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the erase acknowledgment.
    Erase,
    /// Waiting for the bootloader to accept a verified-write request.
    WriteRequest,
    /// Waiting for the size handshake acknowledgment.
    SizeAck,
    /// Waiting for the all-chunks-written acknowledgment.
    WriteComplete,
    /// Waiting for the start-of-verify marker.
    VerifyStart,
    /// Waiting for the post-verify load acknowledgment.
    Load,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Erase => "erase",
            Self::WriteRequest => "write request",
            Self::SizeAck => "size handshake",
            Self::WriteComplete => "write completion",
            Self::VerifyStart => "verify start",
            Self::Load => "load",
        };
        f.write_str(name)
    }
}

/// Error type for mojoflash operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Serial port could not be opened or configured.
    #[error("Cannot open serial port {port}: {source}")]
    Connection {
        /// Name of the port that failed to open.
        port: String,
        /// Underlying serial driver error.
        source: serialport::Error,
    },

    /// I/O error (serial port, file operations).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Communication timeout.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Bitstream does not fit the 4-byte size field.
    #[error("Bitstream too large: {size} bytes exceeds the 4 GiB protocol limit")]
    SizeOverflow {
        /// Size of the rejected bitstream in bytes.
        size: u64,
    },

    /// Bootloader answered a gate with the wrong byte.
    #[error("Unexpected reply during {phase}: expected {expected:#04x}, got {actual:#04x}")]
    UnexpectedReply {
        /// Phase whose gate failed.
        phase: Phase,
        /// Byte the bootloader was required to send.
        expected: u8,
        /// Byte the bootloader actually sent.
        actual: u8,
    },

    /// Size echoed back during verification disagrees with the image size.
    #[error("Flash size mismatch: expected {expected} bytes, got {actual}")]
    VerifySizeMismatch {
        /// Image size plus the flash framing overhead.
        expected: u64,
        /// Size the bootloader reported.
        actual: u64,
    },

    /// A flash byte read back during verification differs from the image.
    #[error("Verification failed at offset {offset:#x}: expected {expected:#04x}, got {actual:#04x}")]
    VerifyMismatch {
        /// Absolute offset of the first differing byte.
        offset: u64,
        /// Byte the image holds at that offset.
        expected: u8,
        /// Byte read back from flash.
        actual: u8,
    },
}
