//! LEB128 variable-length integers used for payload length prefixes.

/// Maximum encoded length of a `u64`
pub const MAX_VARINT_LEN: usize = 10;

/// Number of bytes `value` occupies when encoded
#[must_use]
pub const fn encoded_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// Append the encoding of `value` to `out`
pub fn encode(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Decode a value from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed, or `None` if the
/// input ends mid-value or the encoding overflows 64 bits.
#[must_use]
pub fn decode(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    for (i, &byte) in bytes.iter().take(MAX_VARINT_LEN).enumerate() {
        let chunk = u64::from(byte & 0x7f);
        let shift = 7 * i as u32;
        // The tenth byte may only contribute the top bit
        if i == MAX_VARINT_LEN - 1 && chunk > 1 {
            return None;
        }
        value |= chunk << shift;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}
