/// XTEA-variant block cipher and per-card key derivation
///
/// The cipher runs 16 rounds, not the canonical 32; the key schedule indexes
/// with `sum & 3` on one half-round and `(sum >> 11) & 3` on the other. Both
/// are properties of the card firmware, not tunables.
use anyhow::{Result, bail};

use crate::hex::{decode_hex, sub, swap_endianness};

const DELTA: u32 = 0x9E3779B9;
const ROUNDS: u32 = 16;

/// Forward transform of one 8-byte half-block.
pub fn encipher_words(v: &mut [u32; 2], key: &[u32; 4]) {
    let (mut v0, mut v1) = (v[0], v[1]);
    let mut sum: u32 = 0;
    for _ in 0..ROUNDS {
        v0 = v0.wrapping_add(
            (((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1))
                ^ sum.wrapping_add(key[(sum & 3) as usize]),
        );
        sum = sum.wrapping_add(DELTA);
        v1 = v1.wrapping_add(
            (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0))
                ^ sum.wrapping_add(key[((sum >> 11) & 3) as usize]),
        );
    }
    v[0] = v0;
    v[1] = v1;
}

/// Inverse transform of one 8-byte half-block.
pub fn decipher_words(v: &mut [u32; 2], key: &[u32; 4]) {
    let (mut v0, mut v1) = (v[0], v[1]);
    let mut sum = DELTA.wrapping_mul(ROUNDS);
    for _ in 0..ROUNDS {
        v1 = v1.wrapping_sub(
            (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0))
                ^ sum.wrapping_add(key[((sum >> 11) & 3) as usize]),
        );
        sum = sum.wrapping_sub(DELTA);
        v0 = v0.wrapping_sub(
            (((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1))
                ^ sum.wrapping_add(key[(sum & 3) as usize]),
        );
    }
    v[0] = v0;
    v[1] = v1;
}

/// Derive the 4x32-bit cipher key from the card's 4-byte UID.
///
/// The UID is read as two little-endian 16-bit words, interleaved with fixed
/// constants and packed pairwise into the key words. Deterministic: the same
/// UID always yields the same key.
pub fn derive_key(uid_hex: &str) -> Result<[u32; 4]> {
    let buid = decode_hex(uid_hex)?;
    if buid.len() < 4 {
        bail!("UID too short: got {} bytes, need 4", buid.len());
    }
    let uid0 = buid[0] as u32 | (buid[1] as u32) << 8;
    let uid1 = buid[2] as u32 | (buid[3] as u32) << 8;

    let tmp: [u32; 8] = [
        0x198B,
        uid0,
        0x46D8,
        uid1,
        0x5310,
        uid0 ^ 0xA312,
        0xFFCB,
        uid1 ^ 0x55AA,
    ];

    Ok([
        tmp[1] << 16 | tmp[0],
        tmp[3] << 16 | tmp[2],
        tmp[5] << 16 | tmp[4],
        tmp[7] << 16 | tmp[6],
    ])
}

/// Encipher one 32-hex-char block text.
pub fn encipher_block(text: &str, key: &[u32; 4]) -> Result<String> {
    apply_block(text, key, true)
}

/// Decipher one 32-hex-char block text.
pub fn decipher_block(text: &str, key: &[u32; 4]) -> Result<String> {
    apply_block(text, key, false)
}

/// The cipher is applied independently to the two 8-byte halves of a block.
/// Each 4-byte sub-field goes through a 32-bit endianness swap on the way in
/// and again on the way out.
fn apply_block(text: &str, key: &[u32; 4], forward: bool) -> Result<String> {
    let mut v = [
        swap_endianness(sub(text, 1, 8), 32)?,
        swap_endianness(sub(text, 9, 16), 32)?,
    ];
    let mut vv = [
        swap_endianness(sub(text, 17, 24), 32)?,
        swap_endianness(sub(text, 25, 32), 32)?,
    ];
    if forward {
        encipher_words(&mut v, key);
        encipher_words(&mut vv, key);
    } else {
        decipher_words(&mut v, key);
        decipher_words(&mut vv, key);
    }

    let mut out = String::with_capacity(32);
    for w in [v[0], v[1], vv[0], vv[1]] {
        out.push_str(&format!("{:08X}", swap_endianness(&format!("{w:08X}"), 32)?));
    }
    Ok(out)
}
