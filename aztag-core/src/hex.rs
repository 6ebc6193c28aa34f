/// Text addressing and byte-order helpers shared by every stage of the codec
use anyhow::{Result, bail};

/// 1-based inclusive substring, the addressing convention of the dump format.
///
/// `i` below 1 clamps to 1, `i` past the end yields `""`, `j` is clamped to
/// the text length. Every block/char range in this crate goes through here so
/// the convention lives in exactly one place. Positions are byte offsets;
/// dump text is ASCII (enforced at parse time).
pub fn sub(s: &str, i: usize, j: usize) -> &str {
    let n = s.len();
    let i = i.max(1);
    if i > n || j < i {
        return "";
    }
    &s[i - 1..j.min(n)]
}

/// Decode hex text to raw bytes.
///
/// Only complete 2-character groups are consumed; an unpaired trailing nibble
/// is dropped, not an error. A non-hex character inside a group is.
pub fn decode_hex(s: &str) -> Result<Vec<u8>> {
    if !s.is_ascii() {
        bail!("hex text contains non-ASCII characters");
    }
    let mut out = Vec::with_capacity(s.len() / 2);
    for k in 0..s.len() / 2 {
        let pair = &s[k * 2..k * 2 + 2];
        match u8::from_str_radix(pair, 16) {
            Ok(b) => out.push(b),
            Err(_) => bail!("invalid hex pair {:?} at offset {}", pair, k * 2),
        }
    }
    Ok(out)
}

/// Reverse the 2-char byte groups of a hex field and parse the result.
///
/// Supported widths are 16, 24 and 32 bits. Any other width yields `Ok(0)`
/// rather than an error; existing card images rely on that. Empty or non-hex
/// input is an error.
pub fn swap_endianness(s: &str, bit_width: u32) -> Result<u32> {
    if s.is_empty() {
        bail!("cannot swap endianness of empty text");
    }
    if !s.is_ascii() {
        bail!("hex field contains non-ASCII characters");
    }
    let groups: &[(usize, usize)] = match bit_width {
        16 => &[(3, 4), (1, 2)],
        24 => &[(5, 6), (3, 4), (1, 2)],
        32 => &[(7, 8), (5, 6), (3, 4), (1, 2)],
        _ => return Ok(0),
    };
    let mut t = String::with_capacity(8);
    for &(i, j) in groups {
        t.push_str(sub(s, i, j));
    }
    match u32::from_str_radix(&t, 16) {
        Ok(v) => Ok(v),
        Err(_) => bail!("invalid hex field {:?}", s),
    }
}

/// Swap the low and high byte of a value treated as two base-256 digits.
pub fn swap_byte_pair(n: u32) -> u32 {
    let hi = n / 0x100;
    let lo = n - hi * 0x100;
    lo * 0x100 + hi
}

/// Uppercase hex rendering without zero padding.
pub fn to_hex_upper(v: u32) -> String {
    format!("{v:X}")
}
