//! core functionality for deciphering and re-enciphering
//! memory dumps of Aztek contactless tags
//!
//! # Modules
//!
//! - `hex`: text addressing and byte-order helpers
//! - `crc`: CRC-16/ARC engine
//! - `crypto`: XTEA-variant block cipher and key derivation
//! - `dump`: sector/block structure of the 1024-byte image
//! - `codec`: whole-dump transform
//! - `checksum`: checksum-zone rewrite
//! - `wallet`: wallet payload inspection

pub mod checksum;
pub mod codec;
pub mod crc;
pub mod crypto;
pub mod dump;
pub mod hex;
pub mod wallet;

// Re-export commonly used items
pub use codec::{Mode, Transformed, decipher, encipher, transform_dump};
pub use crc::{crc16, crc16_hex};
pub use crypto::{decipher_block, derive_key, encipher_block};
pub use dump::Dump;
pub use wallet::{CardInfo, SegmentCheck, WalletInfo, inspect};
