/// CRC-16/ARC, the checksum every zone on the card uses
use anyhow::Result;

use crate::hex::decode_hex;

/// Compute the reflected CRC-16/ARC of raw bytes (init 0, polynomial 0xA001).
pub fn crc16(bytes: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &b in bytes {
        crc ^= b as u16;
        for _ in 0..8 {
            let lsb = crc & 1;
            crc >>= 1;
            if lsb != 0 {
                crc ^= 0xA001;
            }
        }
    }
    crc
}

/// Checksum a hex-text zone. The zone is decoded to raw bytes first; an
/// unpaired trailing nibble is dropped.
pub fn crc16_hex(zone: &str) -> Result<u16> {
    Ok(crc16(&decode_hex(zone)?))
}
