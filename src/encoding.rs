//! Character set registry.
//!
//! Maps charset names to whole-buffer codecs used to reinterpret decoded bytes as text.
//! Charsets that `encoding_rs` can both decode and encode are served as
//! [`CharEncodingHandler::Predefined`]. UTF-7, UTF-16LE/BE, ISO-8859-1 and strict US-ASCII
//! are not provided exactly by `encoding_rs`, so they are [`CharEncodingHandler::Custom`]
//! handlers backed by plain function pointers.

use std::{
    borrow::Cow,
    collections::BTreeMap,
    fmt::Display,
    str::FromStr,
    sync::{Mutex, PoisonError, RwLock},
};

use encoding_rs::{
    DecoderResult, Encoding, EncoderResult, UTF_8,
    mem::{decode_latin1, encode_latin1_lossy, str_latin1_up_to},
};

use crate::{config::MalformedPolicy, utf7};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharEncoding {
    UTF8,
    UTF7,
    UTF16LE,
    UTF16BE,
    ISO8859_1,
    ASCII,
    /// Any other charset of the WHATWG label table that `encoding_rs` can encode.
    Other(&'static Encoding),
}

impl CharEncoding {
    pub fn get_name(&self) -> &'static str {
        match *self {
            Self::UTF8 => "UTF-8",
            Self::UTF7 => "UTF-7",
            Self::UTF16LE => "UTF-16LE",
            Self::UTF16BE => "UTF-16BE",
            Self::ISO8859_1 => "ISO-8859-1",
            Self::ASCII => "US-ASCII",
            Self::Other(encoding) => encoding.name(),
        }
    }
}

impl FromStr for CharEncoding {
    type Err = EncodingError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = if let Some(alias) = get_encoding_alias(name) {
            alias
        } else {
            name.trim().to_uppercase()
        };
        match name.as_str() {
            "UTF-8" | "UTF8" | "UNICODE-1-1-UTF-8" => Ok(Self::UTF8),
            "UTF-7" | "UTF7" | "UNICODE-1-1-UTF-7" | "CSUNICODE11UTF7" => Ok(Self::UTF7),
            // UTF-16 without a byte order mark is read as little endian.
            "UTF-16" | "UTF16" | "UTF-16LE" | "UTF16LE" => Ok(Self::UTF16LE),
            "UTF-16BE" | "UTF16BE" => Ok(Self::UTF16BE),
            "ISO-8859-1" | "ISO8859-1" | "ISO_8859-1" | "ISO-LATIN-1" | "LATIN1" | "L1" => {
                Ok(Self::ISO8859_1)
            }
            "US-ASCII" | "ASCII" | "ANSI_X3.4-1968" | "US" => Ok(Self::ASCII),
            "" => Err(EncodingError::Other {
                msg: "Empty encoding name.".into(),
            }),
            // `encoding_rs` maps some labels (e.g. "replacement") to decoders
            // whose encoder writes UTF-8. Those cannot round-trip, so skip them.
            name => Encoding::for_label(name.as_bytes())
                .filter(|encoding| encoding.output_encoding() == *encoding)
                .map(Self::Other)
                .ok_or_else(|| EncodingError::Other {
                    msg: "No encoding matches.".into(),
                }),
        }
    }
}

#[derive(Debug, Clone)]
pub enum CharEncodingHandler {
    Predefined(&'static Encoding),
    Custom(CustomEncodingHandler),
}

impl CharEncodingHandler {
    /// Encode `src` into this charset. Characters the charset cannot represent are errors.
    pub fn encode(&self, src: &str) -> Result<Vec<u8>, EncodingError> {
        match self {
            Self::Predefined(encoding) => encode_predefined(encoding, src),
            Self::Custom(handler) => (handler.encode)(src),
        }
    }

    /// Decode `src` from this charset, handling malformed sequences per `policy`.
    pub fn decode(&self, src: &[u8], policy: MalformedPolicy) -> Result<String, EncodingError> {
        match self {
            Self::Predefined(encoding) => decode_predefined(encoding, src, policy),
            Self::Custom(handler) => (handler.decode)(src, policy),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Predefined(encoding) => encoding.name(),
            Self::Custom(handler) => handler.name(),
        }
    }
}

impl From<CharEncoding> for CharEncodingHandler {
    fn from(value: CharEncoding) -> Self {
        get_encoding_handler(value)
    }
}

fn encode_predefined(encoding: &'static Encoding, src: &str) -> Result<Vec<u8>, EncodingError> {
    let mut encoder = encoding.new_encoder();
    let capacity = encoder
        .max_buffer_length_from_utf8_without_replacement(src.len())
        .ok_or_else(|| EncodingError::Other {
            msg: "Input is too long to encode.".into(),
        })?;
    let mut dst = Vec::with_capacity(capacity);
    let (res, read) = encoder.encode_from_utf8_to_vec_without_replacement(src, &mut dst, true);
    match res {
        EncoderResult::InputEmpty => Ok(dst),
        EncoderResult::OutputFull => Err(EncodingError::Other {
            msg: "Output buffer overflowed while encoding.".into(),
        }),
        // `read` includes the unmappable character.
        EncoderResult::Unmappable(c) => Err(EncodingError::Unmappable {
            offset: read.saturating_sub(c.len_utf8()),
            c,
        }),
    }
}

fn decode_predefined(
    encoding: &'static Encoding,
    src: &[u8],
    policy: MalformedPolicy,
) -> Result<String, EncodingError> {
    if policy == MalformedPolicy::Replace {
        return Ok(encoding.decode_without_bom_handling(src).0.into_owned());
    }

    let mut decoder = encoding.new_decoder_without_bom_handling();
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(src.len())
        .ok_or_else(|| EncodingError::Other {
            msg: "Input is too long to decode.".into(),
        })?;
    let mut dst = String::with_capacity(capacity);
    let (res, read) = decoder.decode_to_string_without_replacement(src, &mut dst, true);
    match res {
        DecoderResult::InputEmpty => Ok(dst),
        DecoderResult::OutputFull => Err(EncodingError::Other {
            msg: "Output buffer overflowed while decoding.".into(),
        }),
        // The malformed sequence is `src[read - length - offset..read - offset]`.
        DecoderResult::Malformed(length, offset) => Err(EncodingError::Malformed {
            offset: read.saturating_sub(length as usize + offset as usize),
            length: length as usize,
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// Malformed byte sequence of `length` bytes starting at `offset` of the input.
    ///
    /// Only decoders return this error.
    Malformed { offset: usize, length: usize },
    /// The character `c` at byte `offset` of the input has no mapping in the target charset.
    ///
    /// Only encoders return this error.
    Unmappable { offset: usize, c: char },
    /// The text is not valid standard Base64.
    InvalidBase64 { cause: base64::DecodeError },
    /// Other errors.
    Other { msg: Cow<'static, str> },
}

impl EncodingError {
    pub fn malformed(&self) -> bool {
        matches!(self, EncodingError::Malformed { .. })
    }

    pub fn unmappable(&self) -> bool {
        matches!(self, EncodingError::Unmappable { .. })
    }

    pub fn invalid_base64(&self) -> bool {
        matches!(self, EncodingError::InvalidBase64 { .. })
    }

    pub fn other(&self) -> bool {
        matches!(self, EncodingError::Other { .. })
    }
}

impl Display for EncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Encoding Error: ")?;
        match self {
            Self::Malformed { offset, length } => {
                write!(
                    f,
                    "Malformed byte sequence occurs at {}..{}",
                    offset,
                    offset + length
                )
            }
            Self::Unmappable { offset, c } => {
                write!(f, "Unmappable character '{c}' at {offset}")
            }
            Self::InvalidBase64 { cause } => write!(f, "Invalid Base64 text: {cause}"),
            Self::Other { msg } => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for EncodingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidBase64 { cause } => Some(cause),
            _ => None,
        }
    }
}

pub type EncoderFunc = fn(src: &str) -> Result<Vec<u8>, EncodingError>;
pub type DecoderFunc = fn(src: &[u8], policy: MalformedPolicy) -> Result<String, EncodingError>;

#[derive(Debug, Clone)]
pub struct CustomEncodingHandler {
    /// the name of this encoding
    name: Cow<'static, str>,
    /// encode the UTF-8 string `src` to a byte sequence of this encoding.
    encode: EncoderFunc,
    /// decode the byte sequence `src` of this encoding to a UTF-8 string.
    decode: DecoderFunc,
}

impl CustomEncodingHandler {
    /// Create and register new CustomEncodingHandler.
    ///
    /// If too many handlers are registered (more than 50 handlers specifically), return `Err`.
    /// Otherwise, return `Ok`.
    pub fn new(
        name: &str,
        encode: EncoderFunc,
        decode: DecoderFunc,
    ) -> Result<Self, EncodingError> {
        let name = if let Some(alias) = get_encoding_alias(name) {
            alias
        } else {
            name.trim().to_uppercase()
        };
        if name.is_empty() {
            return Err(EncodingError::Other {
                msg: "Empty encoding name.".into(),
            });
        }
        let new = CustomEncodingHandler {
            name: name.into(),
            encode,
            decode,
        };
        register_encoding_handler(new.clone())?;
        Ok(new)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

const MAX_ENCODING_HANDLERS: usize = 50;
static HANDLERS: Mutex<Vec<CustomEncodingHandler>> = Mutex::new(vec![]);

pub fn register_encoding_handler(handler: CustomEncodingHandler) -> Result<(), EncodingError> {
    let mut handlers = HANDLERS.lock().unwrap_or_else(PoisonError::into_inner);
    if handlers.len() >= MAX_ENCODING_HANDLERS {
        log::warn!(
            "cannot register encoding handler {}: too many handlers, see MAX_ENCODING_HANDLERS",
            handler.name
        );
        return Err(EncodingError::Other {
            msg: "Too many CustomEncodingHandlers are registered.".into(),
        });
    }
    log::trace!("registered encoding handler {}", handler.name);
    handlers.push(handler);
    Ok(())
}

fn encode_utf7(src: &str) -> Result<Vec<u8>, EncodingError> {
    Ok(utf7::encode(src))
}

fn encode_utf16le(src: &str) -> Result<Vec<u8>, EncodingError> {
    Ok(src.encode_utf16().flat_map(u16::to_le_bytes).collect())
}

fn encode_utf16be(src: &str) -> Result<Vec<u8>, EncodingError> {
    Ok(src.encode_utf16().flat_map(u16::to_be_bytes).collect())
}

fn decode_utf16le(src: &[u8], policy: MalformedPolicy) -> Result<String, EncodingError> {
    decode_utf16(src, policy, u16::from_le_bytes)
}

fn decode_utf16be(src: &[u8], policy: MalformedPolicy) -> Result<String, EncodingError> {
    decode_utf16(src, policy, u16::from_be_bytes)
}

fn decode_utf16(
    src: &[u8],
    policy: MalformedPolicy,
    unit: fn([u8; 2]) -> u16,
) -> Result<String, EncodingError> {
    let chunks = src.chunks_exact(2);
    let tail = chunks.remainder().len();
    let mut dst = String::with_capacity(src.len());
    let mut offset = 0;
    for c in char::decode_utf16(chunks.map(|c| unit([c[0], c[1]]))) {
        match c {
            Ok(c) => {
                offset += c.len_utf16() * 2;
                dst.push(c);
            }
            Err(_) => {
                if policy == MalformedPolicy::Strict {
                    return Err(EncodingError::Malformed { offset, length: 2 });
                }
                offset += 2;
                dst.push(char::REPLACEMENT_CHARACTER);
            }
        }
    }
    // An odd trailing byte cannot form a code unit.
    if tail != 0 {
        if policy == MalformedPolicy::Strict {
            return Err(EncodingError::Malformed {
                offset,
                length: tail,
            });
        }
        dst.push(char::REPLACEMENT_CHARACTER);
    }
    Ok(dst)
}

fn encode_latin1(src: &str) -> Result<Vec<u8>, EncodingError> {
    let up_to = str_latin1_up_to(src);
    if let Some(c) = src[up_to..].chars().next() {
        return Err(EncodingError::Unmappable { offset: up_to, c });
    }
    Ok(encode_latin1_lossy(src).into_owned())
}

// Every byte is a Latin-1 character, so `policy` never applies.
fn decode_latin1_str(src: &[u8], _policy: MalformedPolicy) -> Result<String, EncodingError> {
    Ok(decode_latin1(src).into_owned())
}

fn encode_ascii(src: &str) -> Result<Vec<u8>, EncodingError> {
    let up_to = Encoding::ascii_valid_up_to(src.as_bytes());
    if let Some(c) = src[up_to..].chars().next() {
        return Err(EncodingError::Unmappable { offset: up_to, c });
    }
    Ok(src.as_bytes().to_vec())
}

fn decode_ascii(src: &[u8], policy: MalformedPolicy) -> Result<String, EncodingError> {
    let up_to = Encoding::ascii_valid_up_to(src);
    if up_to < src.len() && policy == MalformedPolicy::Strict {
        return Err(EncodingError::Malformed {
            offset: up_to,
            length: 1,
        });
    }
    Ok(src
        .iter()
        .map(|&b| {
            if b.is_ascii() {
                b as char
            } else {
                char::REPLACEMENT_CHARACTER
            }
        })
        .collect())
}

const UTF7_HANDLER: CustomEncodingHandler = CustomEncodingHandler {
    name: Cow::Borrowed("UTF-7"),
    encode: encode_utf7,
    decode: utf7::decode,
};

const UTF16LE_HANDLER: CustomEncodingHandler = CustomEncodingHandler {
    name: Cow::Borrowed("UTF-16LE"),
    encode: encode_utf16le,
    decode: decode_utf16le,
};

const UTF16BE_HANDLER: CustomEncodingHandler = CustomEncodingHandler {
    name: Cow::Borrowed("UTF-16BE"),
    encode: encode_utf16be,
    decode: decode_utf16be,
};

const ISO8859_1_HANDLER: CustomEncodingHandler = CustomEncodingHandler {
    name: Cow::Borrowed("ISO-8859-1"),
    encode: encode_latin1,
    decode: decode_latin1_str,
};

const ASCII_HANDLER: CustomEncodingHandler = CustomEncodingHandler {
    name: Cow::Borrowed("US-ASCII"),
    encode: encode_ascii,
    decode: decode_ascii,
};

pub fn get_encoding_handler(enc: CharEncoding) -> CharEncodingHandler {
    match enc {
        CharEncoding::UTF8 => CharEncodingHandler::Predefined(UTF_8),
        // `encoding_rs` has no UTF-7 at all.
        CharEncoding::UTF7 => CharEncodingHandler::Custom(UTF7_HANDLER),
        // For UTF-16, encoding-rs does not provide encoders.
        // Therefore, we should provide them as CustomEncodingHandler.
        //
        // ref: https://docs.rs/encoding_rs/latest/encoding_rs/index.html#utf-16le-utf-16be-and-unicode-encoding-schemes
        CharEncoding::UTF16LE => CharEncodingHandler::Custom(UTF16LE_HANDLER),
        CharEncoding::UTF16BE => CharEncodingHandler::Custom(UTF16BE_HANDLER),
        // The "iso-8859-1" label of encoding_rs means windows-1252.
        //
        // ref: https://docs.rs/encoding_rs/latest/encoding_rs/index.html#iso-8859-1
        CharEncoding::ISO8859_1 => CharEncodingHandler::Custom(ISO8859_1_HANDLER),
        CharEncoding::ASCII => CharEncodingHandler::Custom(ASCII_HANDLER),
        CharEncoding::Other(encoding) => CharEncodingHandler::Predefined(encoding),
    }
}

pub fn find_encoding_handler(name: &str) -> Option<CharEncodingHandler> {
    let canonical = if let Some(alias) = get_encoding_alias(name) {
        alias
    } else {
        name.trim().to_uppercase()
    };

    // use user-registered handlers in preference
    {
        let handlers = HANDLERS.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handler) = handlers.iter().find(|handler| handler.name == canonical) {
            return Some(CharEncodingHandler::Custom(handler.clone()));
        }
    }

    match canonical.parse::<CharEncoding>() {
        Ok(enc) => Some(get_encoding_handler(enc)),
        Err(_) => {
            log::debug!("no encoding handler matches {name:?}");
            None
        }
    }
}

static ENCODING_ALIASES: RwLock<BTreeMap<String, String>> = RwLock::new(BTreeMap::new());

pub fn get_encoding_alias(alias: &str) -> Option<String> {
    let aliases = ENCODING_ALIASES
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    aliases.get(&alias.trim().to_uppercase()).cloned()
}

/// If `alias` already exists as an alias, it is overwritten.
///
/// # Note
/// `alias` and `name` are stored after converted to uppercase.
/// This behaviour affects alias overrides.
pub fn add_encoding_alias(name: &str, alias: &str) {
    let mut aliases = ENCODING_ALIASES
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    aliases.insert(alias.trim().to_uppercase(), name.trim().to_uppercase());
}

pub fn remove_encoding_alias(alias: &str) -> Option<String> {
    let mut aliases = ENCODING_ALIASES
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    aliases.remove(&alias.trim().to_uppercase())
}

pub fn cleanup_encoding_aliases() {
    let mut aliases = ENCODING_ALIASES
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    aliases.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_char_encoding() {
        assert_eq!("utf-8".parse::<CharEncoding>(), Ok(CharEncoding::UTF8));
        assert_eq!(" Utf8 ".parse::<CharEncoding>(), Ok(CharEncoding::UTF8));
        assert_eq!("utf-7".parse::<CharEncoding>(), Ok(CharEncoding::UTF7));
        assert_eq!("UTF-16".parse::<CharEncoding>(), Ok(CharEncoding::UTF16LE));
        assert_eq!("utf-16be".parse::<CharEncoding>(), Ok(CharEncoding::UTF16BE));
        assert_eq!("latin1".parse::<CharEncoding>(), Ok(CharEncoding::ISO8859_1));
        assert_eq!("us-ascii".parse::<CharEncoding>(), Ok(CharEncoding::ASCII));
        assert_eq!(
            "shift_jis".parse::<CharEncoding>(),
            Ok(CharEncoding::Other(encoding_rs::SHIFT_JIS))
        );
        assert!("".parse::<CharEncoding>().is_err());
        assert!("no-such-charset".parse::<CharEncoding>().is_err());
        // decodes to U+FFFD only and encodes as UTF-8, so it is not a charset here
        assert!("replacement".parse::<CharEncoding>().is_err());
    }

    #[test]
    fn test_char_encoding_names() {
        assert_eq!(CharEncoding::UTF8.get_name(), "UTF-8");
        assert_eq!(CharEncoding::ISO8859_1.get_name(), "ISO-8859-1");
        assert_eq!(
            CharEncoding::Other(encoding_rs::WINDOWS_1252).get_name(),
            "windows-1252"
        );
        assert_eq!(get_encoding_handler(CharEncoding::UTF7).name(), "UTF-7");
        assert_eq!(get_encoding_handler(CharEncoding::UTF8).name(), "UTF-8");
    }

    #[test]
    fn test_utf8_handler() {
        let handler = get_encoding_handler(CharEncoding::UTF8);
        assert_eq!(handler.encode("café").unwrap(), "café".as_bytes());
        assert_eq!(
            handler
                .decode("café".as_bytes(), MalformedPolicy::Strict)
                .unwrap(),
            "café"
        );
        let err = handler
            .decode(b"ab\xC3(", MalformedPolicy::Strict)
            .unwrap_err();
        assert_eq!(
            err,
            EncodingError::Malformed {
                offset: 2,
                length: 1
            }
        );
        assert_eq!(
            handler.decode(b"ab\xC3(", MalformedPolicy::Replace).unwrap(),
            "ab\u{FFFD}("
        );
    }

    #[test]
    fn test_predefined_unmappable() {
        let handler = get_encoding_handler(CharEncoding::Other(encoding_rs::SHIFT_JIS));
        assert_eq!(
            handler.encode("日本").unwrap(),
            vec![0x93, 0xFA, 0x96, 0x7B]
        );
        let err = handler.encode("a\u{1F600}").unwrap_err();
        assert!(err.unmappable());
        assert_eq!(
            err,
            EncodingError::Unmappable {
                offset: 1,
                c: '\u{1F600}'
            }
        );
    }

    #[test]
    fn test_utf16_handlers() {
        let le = get_encoding_handler(CharEncoding::UTF16LE);
        let be = get_encoding_handler(CharEncoding::UTF16BE);
        assert_eq!(le.encode("A€").unwrap(), vec![0x41, 0x00, 0xAC, 0x20]);
        assert_eq!(be.encode("A€").unwrap(), vec![0x00, 0x41, 0x20, 0xAC]);
        assert_eq!(
            le.decode(&[0x41, 0x00, 0xAC, 0x20], MalformedPolicy::Strict)
                .unwrap(),
            "A€"
        );
        assert_eq!(
            be.decode(&[0xD8, 0x3D, 0xDE, 0x00], MalformedPolicy::Strict)
                .unwrap(),
            "\u{1F600}"
        );
        // lone high surrogate
        assert_eq!(
            be.decode(&[0x00, 0x41, 0xD8, 0x3D, 0x00, 0x42], MalformedPolicy::Strict),
            Err(EncodingError::Malformed {
                offset: 2,
                length: 2
            })
        );
        assert_eq!(
            be.decode(&[0x00, 0x41, 0xD8, 0x3D, 0x00, 0x42], MalformedPolicy::Replace)
                .unwrap(),
            "A\u{FFFD}B"
        );
        // odd length
        assert_eq!(
            le.decode(&[0x41, 0x00, 0x42], MalformedPolicy::Strict),
            Err(EncodingError::Malformed {
                offset: 2,
                length: 1
            })
        );
        assert_eq!(
            le.decode(&[0x41, 0x00, 0x42], MalformedPolicy::Replace)
                .unwrap(),
            "A\u{FFFD}"
        );
    }

    #[test]
    fn test_latin1_handler() {
        let handler = get_encoding_handler(CharEncoding::ISO8859_1);
        assert_eq!(handler.encode("café").unwrap(), b"caf\xE9");
        assert_eq!(
            handler.decode(b"caf\xE9\x80", MalformedPolicy::Strict).unwrap(),
            "café\u{80}"
        );
        assert_eq!(
            handler.encode("a€"),
            Err(EncodingError::Unmappable { offset: 1, c: '€' })
        );
    }

    #[test]
    fn test_ascii_handler() {
        let handler = get_encoding_handler(CharEncoding::ASCII);
        assert_eq!(handler.encode("Hi").unwrap(), b"Hi");
        assert!(handler.encode("é").unwrap_err().unmappable());
        assert_eq!(
            handler.decode(b"H\xE9", MalformedPolicy::Strict),
            Err(EncodingError::Malformed {
                offset: 1,
                length: 1
            })
        );
        assert_eq!(
            handler.decode(b"H\xE9", MalformedPolicy::Replace).unwrap(),
            "H\u{FFFD}"
        );
    }

    #[test]
    fn test_encoding_alias() {
        add_encoding_alias("ISO-8859-1", "x-test-western");
        assert_eq!(
            get_encoding_alias("X-Test-Western").as_deref(),
            Some("ISO-8859-1")
        );
        assert_eq!(
            "x-test-western".parse::<CharEncoding>(),
            Ok(CharEncoding::ISO8859_1)
        );
        assert_eq!(
            find_encoding_handler("x-test-western").unwrap().name(),
            "ISO-8859-1"
        );
        assert_eq!(
            remove_encoding_alias("x-test-western").as_deref(),
            Some("ISO-8859-1")
        );
        assert!(find_encoding_handler("x-test-western").is_none());
    }

    #[test]
    fn test_encoding_alias_survives_poisoned_lock() {
        let _ = std::thread::spawn(|| {
            let _aliases = ENCODING_ALIASES.write().unwrap();
            panic!("poison the alias registry");
        })
        .join();
        assert!(ENCODING_ALIASES.is_poisoned());

        add_encoding_alias("UTF-16BE", "x-test-poisoned");
        assert_eq!(
            get_encoding_alias("x-test-poisoned").as_deref(),
            Some("UTF-16BE")
        );
        assert_eq!(
            find_encoding_handler("x-test-poisoned").unwrap().name(),
            "UTF-16BE"
        );
        assert_eq!(
            remove_encoding_alias("x-test-poisoned").as_deref(),
            Some("UTF-16BE")
        );
        assert!(get_encoding_alias("x-test-poisoned").is_none());
    }

    fn encode_rot13(src: &str) -> Result<Vec<u8>, EncodingError> {
        Ok(src.bytes().map(rot13).collect())
    }

    fn decode_rot13(src: &[u8], policy: MalformedPolicy) -> Result<String, EncodingError> {
        decode_ascii(&src.iter().copied().map(rot13).collect::<Vec<_>>(), policy)
    }

    fn rot13(b: u8) -> u8 {
        match b {
            b'a'..=b'z' => (b - b'a' + 13) % 26 + b'a',
            b'A'..=b'Z' => (b - b'A' + 13) % 26 + b'A',
            b => b,
        }
    }

    #[test]
    fn test_custom_encoding_handler() {
        let handler = CustomEncodingHandler::new("x-rot13", encode_rot13, decode_rot13).unwrap();
        assert_eq!(handler.name(), "X-ROT13");

        let found = find_encoding_handler("X-Rot13").unwrap();
        assert_eq!(found.name(), "X-ROT13");
        assert_eq!(found.encode("Hello").unwrap(), b"Uryyb");
        assert_eq!(
            found.decode(b"Uryyb", MalformedPolicy::Strict).unwrap(),
            "Hello"
        );

        assert!(CustomEncodingHandler::new("  ", encode_rot13, decode_rot13).is_err());
    }

    #[test]
    fn test_encoding_error_display() {
        let err = EncodingError::Malformed {
            offset: 3,
            length: 2,
        };
        assert_eq!(
            err.to_string(),
            "Encoding Error: Malformed byte sequence occurs at 3..5"
        );
        let err = EncodingError::Unmappable { offset: 0, c: '€' };
        assert_eq!(err.to_string(), "Encoding Error: Unmappable character '€' at 0");
    }
}
