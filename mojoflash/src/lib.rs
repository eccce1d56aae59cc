//! # mojoflash
//!
//! A library for programming the Mojo FPGA development board's flash
//! memory over its serial bootloader.
//!
//! The bootloader speaks a small byte-oriented protocol: the host pulses
//! the reset line, erases the flash, streams the bitstream in 256-byte
//! chunks, then reads the flash back for a byte-for-byte comparison.
//! This crate provides:
//!
//! - The bootloader protocol state machine ([`MojoFlasher`])
//! - Bitstream loading ([`Bitstream`])
//! - A [`Port`] transport trait with a native `serialport` implementation
//!
//! ## Example
//!
//! ```rust,no_run
//! use mojoflash::{Bitstream, MojoFlasher};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bitstream = Bitstream::from_file("design.bin")?;
//!
//!     let mut flasher = MojoFlasher::open("/dev/ttyACM0")?;
//!     flasher.program(&bitstream, |stage, done, total| {
//!         println!("{stage:?}: {done}/{total} chunks");
//!     })?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod flasher;
pub mod image;
pub mod port;
pub mod protocol;

// Re-exports for convenience
pub use {
    error::{Error, Phase, Result},
    flasher::{MojoFlasher, Stage},
    image::Bitstream,
    port::{NativePort, Port},
    protocol::TransferState,
};
