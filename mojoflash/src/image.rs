//! Bitstream images.
//!
//! The loader treats a bitstream as an opaque byte sequence: nothing here
//! parses or validates the FPGA configuration data inside it. The only
//! structure imposed is the transfer chunking of the wire protocol.

use crate::error::Result;
use crate::protocol::CHUNK_SIZE;
use log::debug;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// An FPGA bitstream held in memory.
pub struct Bitstream {
    data: Vec<u8>,
}

impl Bitstream {
    /// Load a bitstream from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading bitstream from: {}", path.display());

        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;

        debug!("Loaded {} bytes", data.len());
        Ok(Self::from_bytes(data))
    }

    /// Wrap raw bytes already held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Size of the image in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the image holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The raw image bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Iterate the image in wire-protocol chunks.
    ///
    /// Every chunk is [`CHUNK_SIZE`] bytes except possibly the last.
    /// An empty image yields no chunks.
    pub fn chunks(&self) -> std::slice::Chunks<'_, u8> {
        self.data.chunks(CHUNK_SIZE)
    }

    /// Number of chunks the write and verify passes will use.
    pub fn chunk_count(&self) -> usize {
        self.data.len().div_ceil(CHUNK_SIZE)
    }
}

impl std::fmt::Debug for Bitstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitstream")
            .field("data_len", &self.data.len())
            .finish()
    }
}
