//! UTF-7 (RFC 2152), the 7-bit safe Unicode transform behind the `7BIT` transfer encoding.
//!
//! The encoder writes only the directly encoded characters of set D plus space, TAB, CR
//! and LF. Everything else, the optional direct characters of set O included, goes into
//! a Base64 run of UTF-16BE code units that always ends with an explicit `-`.
//!
//! The decoder accepts any 7-bit byte other than `+` as a direct character.

use crate::{config::MalformedPolicy, encoding::EncodingError};

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const SHIFT: u8 = b'+';
const UNSHIFT: u8 = b'-';

/// Set D (`A-Z a-z 0-9 ' ( ) , - . / : ?`) and the whitespace rule 3 lets through.
fn is_direct(c: char) -> bool {
    matches!(c,
        'A'..='Z' | 'a'..='z' | '0'..='9' |
        '\'' | '(' | ')' | ',' | '-' | '.' | '/' | ':' | '?' |
        ' ' | '\t' | '\r' | '\n'
    )
}

fn base64_value(b: u8) -> Option<u32> {
    match b {
        b'A'..=b'Z' => Some((b - b'A') as u32),
        b'a'..=b'z' => Some((b - b'a') as u32 + 26),
        b'0'..=b'9' => Some((b - b'0') as u32 + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Encode `src` as UTF-7. Every Unicode scalar value is representable, so this cannot fail.
pub fn encode(src: &str) -> Vec<u8> {
    let mut dst = Vec::with_capacity(src.len());
    let mut chars = src.chars().peekable();
    let mut units = [0u16; 2];
    while let Some(c) = chars.next() {
        if c == SHIFT as char {
            dst.extend_from_slice(b"+-");
            continue;
        }
        if is_direct(c) {
            dst.push(c as u8);
            continue;
        }

        dst.push(SHIFT);
        let mut bits = 0u32;
        let mut nbits = 0u32;
        let mut next = Some(c);
        while let Some(c) = next {
            for &unit in c.encode_utf16(&mut units).iter() {
                bits = (bits << 16) | unit as u32;
                nbits += 16;
                while nbits >= 6 {
                    nbits -= 6;
                    dst.push(BASE64_ALPHABET[((bits >> nbits) & 0x3F) as usize]);
                }
                bits &= (1 << nbits) - 1;
            }
            next = chars.next_if(|&c| c != SHIFT as char && !is_direct(c));
        }
        // flush the remaining bits, zero padded
        if nbits > 0 {
            dst.push(BASE64_ALPHABET[((bits << (6 - nbits)) & 0x3F) as usize]);
        }
        dst.push(UNSHIFT);
    }
    dst
}

/// Decode UTF-7 bytes.
///
/// Malformed input is a byte outside 7-bit ASCII, a Base64 run whose leftover bits are
/// non-zero or span a whole Base64 digit, or an unpaired UTF-16 surrogate.
pub fn decode(src: &[u8], policy: MalformedPolicy) -> Result<String, EncodingError> {
    let mut dst = String::with_capacity(src.len());
    let mut i = 0;
    while i < src.len() {
        let b = src[i];
        if b != SHIFT {
            if b.is_ascii() {
                dst.push(b as char);
            } else if policy == MalformedPolicy::Strict {
                return Err(EncodingError::Malformed {
                    offset: i,
                    length: 1,
                });
            } else {
                dst.push(char::REPLACEMENT_CHARACTER);
            }
            i += 1;
            continue;
        }

        let start = i;
        i += 1;
        if src.get(i) == Some(&UNSHIFT) {
            dst.push(SHIFT as char);
            i += 1;
            continue;
        }

        let mut bits = 0u32;
        let mut nbits = 0u32;
        let mut units = vec![];
        while let Some(value) = src.get(i).and_then(|&b| base64_value(b)) {
            bits = (bits << 6) | value;
            nbits += 6;
            if nbits >= 16 {
                nbits -= 16;
                units.push((bits >> nbits) as u16);
                bits &= (1 << nbits) - 1;
            }
            i += 1;
        }
        let bad_tail = nbits >= 6 || bits != 0;
        if src.get(i) == Some(&UNSHIFT) {
            i += 1;
        }

        let mut malformed = bad_tail;
        let mut run = String::with_capacity(units.len());
        for c in char::decode_utf16(units) {
            match c {
                Ok(c) => run.push(c),
                Err(_) => {
                    malformed = true;
                    run.push(char::REPLACEMENT_CHARACTER);
                }
            }
        }
        if malformed && policy == MalformedPolicy::Strict {
            return Err(EncodingError::Malformed {
                offset: start,
                length: i - start,
            });
        }
        dst.push_str(&run);
        if bad_tail {
            dst.push(char::REPLACEMENT_CHARACTER);
        }
    }
    Ok(dst)
}
