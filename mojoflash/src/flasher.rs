//! Mojo flash programming engine.
//!
//! This module drives the board's serial bootloader through the erase,
//! write, and verify phases of one programming run.
//!
//! ## Generic Port Support
//!
//! The flasher is generic over the [`Port`] trait, so the same engine runs
//! against real hardware via [`NativePort`](crate::port::NativePort) and
//! against scripted mock ports in tests.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mojoflash::{Bitstream, MojoFlasher, Stage};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bitstream = Bitstream::from_file("design.bin")?;
//!
//!     let mut flasher = MojoFlasher::open("/dev/ttyACM0")?;
//!     flasher.program(&bitstream, |stage, done, total| {
//!         let pass = match stage {
//!             Stage::Write => "writing",
//!             Stage::Verify => "verifying",
//!         };
//!         println!("{pass}: chunk {done}/{total}");
//!     })?;
//!
//!     Ok(())
//! }
//! ```

use crate::error::{Error, Phase, Result};
use crate::image::Bitstream;
use crate::port::Port;
use crate::protocol::{
    CHUNK_SIZE, FLASH_SIZE_OVERHEAD, TransferState, command, decode_size, encode_size, reply,
};
use log::{debug, info, trace};

/// Which transfer pass a progress report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Streaming image chunks to the flash.
    Write,
    /// Reading flash contents back and comparing.
    Verify,
}

/// Mojo flash programmer.
///
/// Generic over the port type `P`, which must implement the [`Port`]
/// trait. One flasher owns its port for the lifetime of a run; every
/// protocol deviation aborts the run and leaves the port in an undefined
/// state that only a close (or drop) can clean up.
pub struct MojoFlasher<P: Port> {
    port: P,
    state: TransferState,
}

impl<P: Port> MojoFlasher<P> {
    /// Create a flasher around an already opened port.
    pub fn new(port: P) -> Self {
        Self {
            port,
            state: TransferState::Idle,
        }
    }

    /// The phase the current (or last) run is in.
    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Get a reference to the underlying port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Get a mutable reference to the underlying port.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Consume the flasher and return the underlying port.
    pub fn into_port(self) -> P {
        self.port
    }

    /// Close the underlying port.
    ///
    /// Dropping the flasher releases the port as well; this exists for
    /// callers that want the close error. Calling it twice is fine.
    pub fn close(&mut self) -> Result<()> {
        self.port.close()
    }

    /// Program the bitstream into flash and verify the write.
    ///
    /// Runs the full bootloader conversation: reset, erase, verified
    /// write, chunked transfer, readback comparison, and the final load
    /// request. `progress` is called once per chunk with the pass, the
    /// number of chunks finished, and the chunk total.
    ///
    /// Any wrong acknowledgment, timeout, or mismatch aborts immediately;
    /// nothing is retried.
    pub fn program<F>(&mut self, bitstream: &Bitstream, mut progress: F) -> Result<()>
    where
        F: FnMut(Stage, usize, usize),
    {
        self.state = TransferState::Idle;
        let result = self.run_program(bitstream, &mut progress);
        if result.is_err() {
            self.state = TransferState::Failed;
        }
        result
    }

    /// Erase the flash without writing anything.
    ///
    /// Resets the board into its bootloader and runs the erase exchange
    /// on its own.
    pub fn erase(&mut self) -> Result<()> {
        self.state = TransferState::Idle;
        let result = self.run_erase();
        if result.is_err() {
            self.state = TransferState::Failed;
        }
        result
    }

    fn run_program<F>(&mut self, bitstream: &Bitstream, progress: &mut F) -> Result<()>
    where
        F: FnMut(Stage, usize, usize),
    {
        // The size must fit the 4-byte wire field before anything is
        // sent to the board.
        let encoded_size = encode_size(bitstream.len() as u64)?;

        self.reset_into_bootloader()?;
        self.erase_flash()?;
        self.request_write()?;
        self.send_size(&encoded_size)?;
        self.send_chunks(bitstream, progress)?;
        self.request_verify()?;
        self.check_size_echo(bitstream.len() as u64)?;
        self.verify_chunks(bitstream, progress)?;
        self.load_from_flash()?;

        self.enter(TransferState::VerifyDone);
        info!("Programmed and verified {} bytes", bitstream.len());
        Ok(())
    }

    fn run_erase(&mut self) -> Result<()> {
        self.reset_into_bootloader()?;
        self.erase_flash()
    }

    /// Advance to the next phase of the run.
    fn enter(&mut self, state: TransferState) {
        debug_assert_eq!(self.state.next(), Some(state));
        trace!("State: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Read the single acknowledgment byte gating a phase.
    fn read_reply(&mut self, phase: Phase) -> Result<u8> {
        let mut buf = [0u8; 1];
        match self.port.read_exact(&mut buf) {
            Ok(()) => Ok(buf[0]),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(Error::Timeout(format!(
                "waiting for the {phase} reply"
            ))),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Read a gate byte and require the expected value.
    fn expect_reply(&mut self, phase: Phase, expected: u8) -> Result<()> {
        let actual = self.read_reply(phase)?;
        if actual != expected {
            return Err(Error::UnexpectedReply {
                phase,
                expected,
                actual,
            });
        }
        trace!("Gate passed: {phase} ({actual:#04x})");
        Ok(())
    }

    /// Read exactly `buf.len()` bytes, mapping a driver timeout.
    fn read_exact_or_timeout(&mut self, buf: &mut [u8], what: &str) -> Result<()> {
        match self.port.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                Err(Error::Timeout(format!("waiting for {what}")))
            },
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn reset_into_bootloader(&mut self) -> Result<()> {
        self.enter(TransferState::Resetting);
        info!("Resetting board on {}", self.port.name());
        self.port.pulse_reset()?;

        // The reboot can leave stray bytes in both directions; start the
        // conversation from a clean line.
        self.port.flush()?;
        self.port.discard_input()?;
        Ok(())
    }

    fn erase_flash(&mut self) -> Result<()> {
        self.enter(TransferState::ErasePending);
        info!("Erasing flash");
        self.port.write_all(&[command::ERASE])?;
        self.expect_reply(Phase::Erase, reply::DONE)?;
        self.enter(TransferState::ErasedAck);
        Ok(())
    }

    fn request_write(&mut self) -> Result<()> {
        self.enter(TransferState::WritePending);
        info!("Writing to flash");
        self.port.write_all(&[command::WRITE_VERIFIED])?;
        self.expect_reply(Phase::WriteRequest, reply::READY)?;
        Ok(())
    }

    fn send_size(&mut self, encoded: &[u8]) -> Result<()> {
        self.enter(TransferState::SendingSize);
        self.port.write_all(encoded)?;
        self.port.flush()?;
        self.expect_reply(Phase::SizeAck, reply::SIZE_OK)?;
        self.enter(TransferState::SizeAck);
        Ok(())
    }

    fn send_chunks<F>(&mut self, bitstream: &Bitstream, progress: &mut F) -> Result<()>
    where
        F: FnMut(Stage, usize, usize),
    {
        self.enter(TransferState::SendingChunks);
        let total = bitstream.chunk_count();
        debug!("Sending {} bytes in {total} chunks", bitstream.len());

        for (index, chunk) in bitstream.chunks().enumerate() {
            self.port.write_all(chunk)?;
            self.port.flush()?;
            progress(Stage::Write, index + 1, total);
        }

        self.expect_reply(Phase::WriteComplete, reply::DONE)?;
        self.enter(TransferState::WriteAck);
        Ok(())
    }

    fn request_verify(&mut self) -> Result<()> {
        self.enter(TransferState::VerifyRequested);
        info!("Verifying the write");
        self.port.write_all(&[command::VERIFY])?;
        self.expect_reply(Phase::VerifyStart, reply::VERIFY_START)?;
        self.enter(TransferState::VerifyStartAck);
        Ok(())
    }

    fn check_size_echo(&mut self, image_size: u64) -> Result<()> {
        self.enter(TransferState::ReceivingSizeEcho);
        let mut buf = [0u8; 4];
        self.read_exact_or_timeout(&mut buf, "the flash size echo")?;

        let actual = decode_size(buf);
        let expected = image_size + FLASH_SIZE_OVERHEAD;
        if actual != expected {
            return Err(Error::VerifySizeMismatch { expected, actual });
        }
        debug!("Flash reports {actual} bytes");
        Ok(())
    }

    fn verify_chunks<F>(&mut self, bitstream: &Bitstream, progress: &mut F) -> Result<()>
    where
        F: FnMut(Stage, usize, usize),
    {
        self.enter(TransferState::VerifyingChunks);
        let total = bitstream.chunk_count();
        debug!("Reading back {total} chunks");

        let mut flash = [0u8; CHUNK_SIZE];
        for (index, expected) in bitstream.chunks().enumerate() {
            // The bootloader answers with a full chunk even when the image
            // ends mid-chunk; only the bytes the image covers are compared.
            self.read_exact_or_timeout(&mut flash, "flash contents")?;

            for (i, (&want, &got)) in expected.iter().zip(&flash).enumerate() {
                if want != got {
                    return Err(Error::VerifyMismatch {
                        offset: (index * CHUNK_SIZE + i) as u64,
                        expected: want,
                        actual: got,
                    });
                }
            }

            progress(Stage::Verify, index + 1, total);
        }
        Ok(())
    }

    fn load_from_flash(&mut self) -> Result<()> {
        // The bootloader expects this exchange after a verify; its effect
        // past the acknowledgment is undocumented.
        debug!("Requesting load from flash");
        self.port.write_all(&[command::LOAD])?;
        self.expect_reply(Phase::Load, reply::DONE)?;
        Ok(())
    }
}

impl MojoFlasher<crate::port::NativePort> {
    /// Open the named serial port and build a flasher around it.
    ///
    /// # Arguments
    ///
    /// * `port_name` - Serial port name (e.g., "/dev/ttyACM0" or "COM3")
    pub fn open(port_name: &str) -> Result<Self> {
        Ok(Self::new(crate::port::NativePort::open(port_name)?))
    }
}
