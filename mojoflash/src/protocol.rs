//! Mojo bootloader wire protocol.
//!
//! The bootloader speaks a single-byte command/acknowledgment protocol
//! over the serial link:
//!
//! ```text
//! host sends              device answers
//! ----------              --------------
//! 'E'                     'D'                         erase flash
//! 'V'                     'R'                         verified-write request
//! size (4 bytes LE)       'O'                         size accepted
//! data (256-byte chunks)  'D' after the last chunk    image payload
//! 'S'                     0xAA, size+5 (4 bytes LE),  read back flash
//!                         flash contents (256-byte chunks)
//! 'L'                     'D'                         load from flash
//! ```
//!
//! Every exchange is gated: the host must read the expected acknowledgment
//! byte before moving on, and any other value aborts the run.

use crate::error::{Error, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::time::Duration;

/// Command bytes the host sends to open a protocol phase.
pub mod command {
    /// Erase the flash.
    pub const ERASE: u8 = b'E';
    /// Write to flash, with a verification pass to follow.
    pub const WRITE_VERIFIED: u8 = b'V';
    /// Read the flash contents back for verification.
    pub const VERIFY: u8 = b'S';
    /// Load the design from flash.
    pub const LOAD: u8 = b'L';
}

/// Acknowledgment bytes the bootloader answers with.
pub mod reply {
    /// Generic done/acknowledged.
    pub const DONE: u8 = b'D';
    /// Write request accepted, ready for the size.
    pub const READY: u8 = b'R';
    /// Size accepted, ready for data.
    pub const SIZE_OK: u8 = b'O';
    /// Marker preceding the size echo in the verify phase.
    pub const VERIFY_START: u8 = 0xAA;
}

/// Chunk size in bytes, identical for the write and verify passes.
pub const CHUNK_SIZE: usize = 256;

/// Framing overhead the bootloader adds to the size it echoes back
/// during verification.
pub const FLASH_SIZE_OVERHEAD: u64 = 5;

/// Fixed baud rate the bootloader listens at.
pub const BAUD_RATE: u32 = 115_200;

/// How long to wait for each bootloader reply.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of low/high reset line toggles that force the bootloader.
pub const RESET_PULSES: usize = 5;

/// Hold time at each reset line level.
pub const RESET_HOLD: Duration = Duration::from_millis(5);

/// Encode an image size for the size handshake.
///
/// The wire field is 4 bytes little-endian; a size that does not fit
/// fails with [`Error::SizeOverflow`] before anything goes out on the
/// wire.
#[allow(clippy::unwrap_used)] // Writing to Vec<u8> cannot fail
pub fn encode_size(size: u64) -> Result<Vec<u8>> {
    let Ok(size) = u32::try_from(size) else {
        return Err(Error::SizeOverflow { size });
    };

    let mut buf = Vec::with_capacity(4);
    buf.write_u32::<LittleEndian>(size).unwrap();
    Ok(buf)
}

/// Decode the 4-byte little-endian size echo from the verify phase.
pub fn decode_size(buf: [u8; 4]) -> u64 {
    u64::from(u32::from_le_bytes(buf))
}

/// Phase of one programming run.
///
/// Transitions are strictly linear; the only branch is into
/// [`TransferState::Failed`], reachable from every phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// No run in progress.
    Idle,
    /// Pulsing the reset line to drop the board into its bootloader.
    Resetting,
    /// Erase request sent, waiting for the acknowledgment.
    ErasePending,
    /// Flash erased.
    ErasedAck,
    /// Verified-write request sent, waiting for the ready byte.
    WritePending,
    /// Sending the 4-byte image size.
    SendingSize,
    /// Size accepted by the bootloader.
    SizeAck,
    /// Streaming image chunks.
    SendingChunks,
    /// All chunks written and acknowledged.
    WriteAck,
    /// Verify request sent, waiting for the start marker.
    VerifyRequested,
    /// Start-of-verify marker received.
    VerifyStartAck,
    /// Reading the 4-byte size echo.
    ReceivingSizeEcho,
    /// Comparing flash contents against the image.
    VerifyingChunks,
    /// Run finished, flash contents verified.
    VerifyDone,
    /// Run aborted; the transport state is undefined.
    Failed,
}

impl TransferState {
    /// The phase that follows this one in a successful run, or `None`
    /// from the two terminal states.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Resetting),
            Self::Resetting => Some(Self::ErasePending),
            Self::ErasePending => Some(Self::ErasedAck),
            Self::ErasedAck => Some(Self::WritePending),
            Self::WritePending => Some(Self::SendingSize),
            Self::SendingSize => Some(Self::SizeAck),
            Self::SizeAck => Some(Self::SendingChunks),
            Self::SendingChunks => Some(Self::WriteAck),
            Self::WriteAck => Some(Self::VerifyRequested),
            Self::VerifyRequested => Some(Self::VerifyStartAck),
            Self::VerifyStartAck => Some(Self::ReceivingSizeEcho),
            Self::ReceivingSizeEcho => Some(Self::VerifyingChunks),
            Self::VerifyingChunks => Some(Self::VerifyDone),
            Self::VerifyDone | Self::Failed => None,
        }
    }

    /// Whether the run has finished, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::VerifyDone | Self::Failed)
    }
}
