//! mojoflash CLI - Command-line tool for programming the Mojo FPGA board.
//!
//! ## Features
//!
//! - Write FPGA bitstreams to the board's onboard flash
//! - Byte-for-byte verification of every write
//! - Standalone flash erase
//! - Shell completion generation
//! - Environment variable support

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use console::style;
use env_logger::Env;
use log::debug;
use mojoflash::{Error, Phase};
use std::env;
use std::path::PathBuf;

/// Whether stderr is a terminal (set once at startup).
static STDERR_IS_TTY: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Check if emoji/animations should be used (TTY and colors enabled).
fn use_fancy_output() -> bool {
    STDERR_IS_TTY.load(std::sync::atomic::Ordering::Relaxed) && console::colors_enabled_stderr()
}

mod commands;

use commands::completions::cmd_completions;
use commands::flash::{cmd_erase, cmd_flash};

/// mojoflash - A serial bitstream loader for the Mojo FPGA development board.
///
/// Environment variables:
///   MOJOFLASH_PORT   - Default serial port
///   NO_COLOR         - Disable colored output
#[derive(Parser)]
#[command(name = "mojoflash")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output level (-v, -vv for increasing detail).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress non-essential output).
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Write a bitstream to the board's flash and verify it.
    Flash {
        /// Path to the bitstream (.bin) file.
        bitstream: PathBuf,

        /// Serial port the board is attached to.
        #[arg(short, long, env = "MOJOFLASH_PORT")]
        port: String,
    },

    /// Erase the flash without writing a new bitstream.
    Erase {
        /// Serial port the board is attached to.
        #[arg(short, long, env = "MOJOFLASH_PORT")]
        port: String,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type for completions.
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    // --- NO_COLOR and TTY detection ---
    let stderr_is_tty = console::Term::stderr().is_term();
    STDERR_IS_TTY.store(stderr_is_tty, std::sync::atomic::Ordering::Relaxed);

    if env::var("NO_COLOR").is_ok() || !stderr_is_tty {
        // Disable all color output
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_target(cli.verbose >= 2)
        .format_timestamp(if cli.verbose >= 2 {
            Some(env_logger::TimestampPrecision::Millis)
        } else {
            None
        })
        .init();

    debug!(
        "mojoflash v{} (verbose level: {})",
        env!("CARGO_PKG_VERSION"),
        cli.verbose
    );

    if let Err(err) = run(&cli) {
        eprintln!("{} {err:#}", style("Error:").red().bold());
        std::process::exit(exit_code(&err));
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Flash { bitstream, port } => cmd_flash(cli, bitstream, port),
        Commands::Erase { port } => cmd_erase(cli, port),
        Commands::Completions { shell } => {
            cmd_completions(*shell);
            Ok(())
        },
    }
}

/// Map a failed run to its process exit code.
///
/// Serial and bootloader failures map to codes 10 and up; anything else
/// exits 1. Usage errors exit 2 via clap before `run` is reached.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<Error>() {
        Some(Error::Connection { .. }) => 10,
        Some(Error::Io(_)) => 11,
        Some(Error::Timeout(_)) => 12,
        Some(Error::SizeOverflow { .. }) => 13,
        Some(Error::UnexpectedReply { phase, .. }) => match phase {
            Phase::Erase => 20,
            Phase::WriteRequest => 21,
            Phase::SizeAck => 22,
            Phase::WriteComplete => 23,
            Phase::VerifyStart => 24,
            Phase::Load => 25,
        },
        Some(Error::VerifySizeMismatch { .. }) => 26,
        Some(Error::VerifyMismatch { .. }) => 27,
        None => 1,
    }
}
