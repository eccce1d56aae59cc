//! Flash and erase command implementations.

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use mojoflash::protocol::BAUD_RATE;
use mojoflash::{Bitstream, MojoFlasher, Stage};
use std::path::Path;

use crate::{Cli, use_fancy_output};

/// Build the transfer progress bar, hidden when quiet or redirected.
fn progress_bar(cli: &Cli) -> ProgressBar {
    if cli.quiet || !use_fancy_output() {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(100);
        #[allow(clippy::unwrap_used)] // Static template string
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb
    }
}

/// Flash command implementation.
pub(crate) fn cmd_flash(cli: &Cli, bitstream_path: &Path, port: &str) -> Result<()> {
    if !cli.quiet {
        eprintln!(
            "{} Loading bitstream from {}",
            style("📦").cyan(),
            bitstream_path.display()
        );
    }

    let bitstream = Bitstream::from_file(bitstream_path)
        .with_context(|| format!("Failed to load bitstream from {}", bitstream_path.display()))?;

    if !cli.quiet {
        eprintln!(
            "{} {} bytes in {} chunks of 256",
            style("ℹ").blue(),
            bitstream.len(),
            bitstream.chunk_count()
        );
        eprintln!(
            "{} Using port {} at {} baud",
            style("🔌").cyan(),
            port,
            BAUD_RATE
        );
    }

    let mut flasher = MojoFlasher::open(port)?;

    let pb = progress_bar(cli);

    let mut current_stage = None;
    let flash_result = flasher.program(&bitstream, |stage, done, total| {
        if current_stage != Some(stage) {
            current_stage = Some(stage);
            pb.set_position(0);
            pb.set_message(match stage {
                Stage::Write => "writing",
                Stage::Verify => "verifying",
            });
        }
        if total > 0 {
            pb.set_position((done * 100 / total) as u64);
        }
    });

    if let Err(err) = flash_result {
        let _ = flasher.close();
        return Err(err.into());
    }

    pb.finish_with_message("verified");
    flasher.close()?;

    if !cli.quiet {
        eprintln!(
            "\n{} Flashed and verified {} bytes",
            style("🎉").green().bold(),
            bitstream.len()
        );
    }

    Ok(())
}

/// Erase command implementation.
pub(crate) fn cmd_erase(cli: &Cli, port: &str) -> Result<()> {
    if !cli.quiet {
        eprintln!(
            "{} Using port {} at {} baud",
            style("🔌").cyan(),
            port,
            BAUD_RATE
        );
    }

    let mut flasher = MojoFlasher::open(port)?;

    if !cli.quiet {
        eprintln!("{} Erasing flash", style("🗑").red());
    }
    if let Err(err) = flasher.erase() {
        let _ = flasher.close();
        return Err(err.into());
    }
    flasher.close()?;

    if !cli.quiet {
        eprintln!("\n{} Flash erased", style("✓").green().bold());
    }

    Ok(())
}
