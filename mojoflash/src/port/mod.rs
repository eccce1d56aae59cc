//! Port abstraction for the serial link to the board.
//!
//! The protocol engine is written against the [`Port`] trait so it stays
//! I/O-agnostic and testable without hardware:
//!
//! ```text
//! +-------------------+
//! |  Protocol Engine  |
//! |     (flasher)     |
//! +---------+---------+
//!           |
//!           v
//! +---------+---------+
//! |    Port Trait     |
//! +---------+---------+
//!           |
//!           v
//! +---------+---------+
//! | Native SerialPort |
//! |   (serialport)    |
//! +-------------------+
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use mojoflash::port::Port;
//!
//! fn into_bootloader<P: Port>(port: &mut P) -> mojoflash::Result<()> {
//!     port.pulse_reset()?;
//!     port.flush()?;
//!     port.discard_input()?;
//!     Ok(())
//! }
//! ```

pub mod native;

use crate::error::Result;
use crate::protocol::{RESET_HOLD, RESET_PULSES};
use std::io::{Read, Write};
use std::thread;

/// Byte-oriented transport to the board, plus reset line control.
pub trait Port: Read + Write + Send {
    /// Set the reset control line level.
    fn set_reset(&mut self, level: bool) -> Result<()>;

    /// Throw away any bytes sitting in the input buffer.
    fn discard_input(&mut self) -> Result<()>;

    /// Get the port name/path.
    fn name(&self) -> &str;

    /// Close the port and release the exclusive claim.
    ///
    /// Safe to call more than once. Dropping the port releases the claim
    /// as well, so every exit path closes exactly once.
    fn close(&mut self) -> Result<()>;

    /// Pulse the reset line to drop the board into its bootloader.
    ///
    /// Toggles the line low and high [`RESET_PULSES`] times, holding each
    /// level for [`RESET_HOLD`]. The board reboots; nothing is read back.
    fn pulse_reset(&mut self) -> Result<()> {
        for _ in 0..RESET_PULSES {
            self.set_reset(false)?;
            thread::sleep(RESET_HOLD);
            self.set_reset(true)?;
            thread::sleep(RESET_HOLD);
        }
        Ok(())
    }
}

pub use native::NativePort;
