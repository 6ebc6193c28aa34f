/// Sector/block structure of the 1024-byte tag image
use anyhow::{Result, bail};

use crate::hex::sub;

/// Total blocks in an image: 16 sectors of 4.
pub const BLOCK_COUNT: usize = 64;
/// Hex characters per block line in a pristine dump.
pub const BLOCK_CHARS: usize = 32;
/// Line stride in the source text: 32 hex chars plus the line terminator.
pub const LINE_STRIDE: usize = 33;
/// Hex rendering of the 6-byte ASCII marker "AZTEKM". Its presence on a
/// sector trailer means the sector's data blocks are enciphered.
pub const MARKER_HEX: &str = "415A54454B4D";

/// One whole card image as 64 block texts.
///
/// Blocks are addressed 1-based (1..=64), matching the on-card numbering the
/// checksum zone layout is written in. Block 1 carries the card serial.
/// After a checksum rewrite block texts may deviate from 32 chars, so blocks
/// are owned strings rather than fixed-width arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dump {
    blocks: Vec<String>,
}

impl Dump {
    /// Carve a flat dump text into 64 blocks.
    ///
    /// Addressing is positional: block `n` (0-based) lives at chars
    /// `n*33 + 1 ..= n*33 + 32`, 1-based inclusive with clamping, so an
    /// undersized text yields empty trailing blocks rather than an error
    /// here. Downstream stages fail on the first block they cannot decode.
    pub fn parse(text: &str) -> Result<Dump> {
        if !text.is_ascii() {
            bail!("dump text contains non-ASCII characters");
        }
        let rdata = text.trim();
        if rdata.is_empty() {
            bail!("dump text is empty");
        }
        let mut blocks = Vec::with_capacity(BLOCK_COUNT);
        for n in 0..BLOCK_COUNT {
            let start = n * LINE_STRIDE + 1;
            blocks.push(sub(rdata, start, start + BLOCK_CHARS - 1).to_string());
        }
        Ok(Dump { blocks })
    }

    /// Build a dump from already-carved block texts.
    pub fn from_blocks(blocks: Vec<String>) -> Result<Dump> {
        if blocks.len() != BLOCK_COUNT {
            bail!("expected {} blocks, got {}", BLOCK_COUNT, blocks.len());
        }
        Ok(Dump { blocks })
    }

    /// Block text by 1-based index (1..=64).
    pub fn block(&self, n: usize) -> &str {
        &self.blocks[n - 1]
    }

    /// Replace the text of block `n` (1-based) wholesale.
    pub fn set_block(&mut self, n: usize, text: String) {
        self.blocks[n - 1] = text;
    }

    /// The card serial: first 8 hex chars of block 1.
    pub fn uid(&self) -> &str {
        sub(self.block(1), 1, 8)
    }

    /// Whether block `n` (1-based) is a sector trailer.
    pub fn is_trailer(n: usize) -> bool {
        n % 4 == 0
    }

    /// 1-based index of the trailer governing data block `k`.
    pub fn trailer_of(k: usize) -> usize {
        k + 4 - k % 4
    }

    /// Whether the sector owning data block `k` stores its data enciphered.
    ///
    /// Reads the governing trailer, case-normalized, at chars 21-33 and
    /// compares against the marker. The range is one char wider than the
    /// 12-char marker; with a 32-char trailer the clamped slice compares
    /// exactly 12 chars. Existing images depend on this exact window.
    pub fn is_marked(&self, k: usize) -> bool {
        let trailer = self.block(Self::trailer_of(k)).to_uppercase();
        sub(&trailer, 21, 33) == MARKER_HEX
    }

    /// Serialize back to text, one block per line, all 64 lines written.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(BLOCK_COUNT * LINE_STRIDE);
        for block in &self.blocks {
            out.push_str(block);
            out.push('\n');
        }
        out
    }
}
