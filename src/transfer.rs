//! The closed set of transfer encodings a property value may carry in its `ENCODING`
//! parameter, and the codec pair each one dispatches to.
//!
//! `encode` always turns bytes into text and `decode` text into bytes:
//!
//! | encoding | `encode` (bytes to text) | `decode` (text to bytes) |
//! |----------|--------------------------|--------------------------|
//! | `7BIT`   | read bytes as UTF-7      | write text as UTF-7      |
//! | `8BIT`   | read bytes as UTF-8      | write text as UTF-8      |
//! | `BASE64` | standard Base64 encode   | standard Base64 decode   |

use std::{borrow::Cow, fmt::Display, str::FromStr};

use base64::{
    Engine, alphabet,
    engine::{GeneralPurpose, GeneralPurposeConfig, general_purpose::STANDARD},
};

use crate::{
    config::TranscoderOptions,
    encoding::{CharEncoding, EncodingError, get_encoding_handler},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferEncoding {
    SevenBit,
    EightBit,
    Base64,
}

pub type TransferEncoderFunc =
    fn(data: &[u8], options: &TranscoderOptions) -> Result<String, EncodingError>;
pub type TransferDecoderFunc =
    fn(value: &str, options: &TranscoderOptions) -> Result<Vec<u8>, EncodingError>;

impl TransferEncoding {
    pub const ALL: [TransferEncoding; 3] = [Self::SevenBit, Self::EightBit, Self::Base64];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SevenBit => "7BIT",
            Self::EightBit => "8BIT",
            Self::Base64 => "BASE64",
        }
    }

    pub fn encoder(self) -> TransferEncoderFunc {
        match self {
            Self::SevenBit => encode_7bit,
            Self::EightBit => encode_8bit,
            Self::Base64 => encode_base64,
        }
    }

    pub fn decoder(self) -> TransferDecoderFunc {
        match self {
            Self::SevenBit => decode_7bit,
            Self::EightBit => decode_8bit,
            Self::Base64 => decode_base64,
        }
    }

    pub fn encode(self, data: &[u8], options: &TranscoderOptions) -> Result<String, EncodingError> {
        (self.encoder())(data, options)
    }

    pub fn decode(
        self,
        value: &str,
        options: &TranscoderOptions,
    ) -> Result<Vec<u8>, EncodingError> {
        (self.decoder())(value, options)
    }
}

impl FromStr for TransferEncoding {
    type Err = EncodingError;

    /// Case-insensitive. Surrounding whitespace is not stripped.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_uppercase().as_str() {
            "7BIT" => Ok(Self::SevenBit),
            "8BIT" => Ok(Self::EightBit),
            "BASE64" => Ok(Self::Base64),
            _ => Err(EncodingError::Other {
                msg: format!("Unknown transfer encoding {name:?}.").into(),
            }),
        }
    }
}

impl Display for TransferEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn encode_7bit(data: &[u8], options: &TranscoderOptions) -> Result<String, EncodingError> {
    get_encoding_handler(CharEncoding::UTF7).decode(data, options.malformed)
}

fn encode_8bit(data: &[u8], options: &TranscoderOptions) -> Result<String, EncodingError> {
    get_encoding_handler(CharEncoding::UTF8).decode(data, options.malformed)
}

fn encode_base64(data: &[u8], _options: &TranscoderOptions) -> Result<String, EncodingError> {
    Ok(STANDARD.encode(data))
}

fn decode_7bit(value: &str, _options: &TranscoderOptions) -> Result<Vec<u8>, EncodingError> {
    get_encoding_handler(CharEncoding::UTF7).encode(value)
}

fn decode_8bit(value: &str, _options: &TranscoderOptions) -> Result<Vec<u8>, EncodingError> {
    get_encoding_handler(CharEncoding::UTF8).encode(value)
}

/// Standard alphabet with canonical padding, but non-zero bits after the last full byte
/// are dropped instead of rejected.
const BASE64_DECODER: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

fn decode_base64(value: &str, options: &TranscoderOptions) -> Result<Vec<u8>, EncodingError> {
    const WHITESPACE: [char; 4] = [' ', '\t', '\r', '\n'];
    let value = if options.ignore_base64_whitespace && value.contains(WHITESPACE) {
        Cow::Owned(value.replace(WHITESPACE, ""))
    } else {
        Cow::Borrowed(value)
    };
    BASE64_DECODER
        .decode(value.as_bytes())
        .map_err(|cause| EncodingError::InvalidBase64 { cause })
}
