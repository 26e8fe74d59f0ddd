//! Transfer-encoding support for iCalendar and vCard property values.
//!
//! A property value may carry an `ENCODING` parameter naming how its payload was turned
//! into text: `7BIT`, `8BIT` or `BASE64`. A [`Transcoder`] converts between the payload
//! bytes and that text form, and reads decoded bytes back as text in the charset that is
//! current for the serialization session.
//!
//! ```
//! use ical_encoding::{EncodingProvider, SerializationContext, Transcoder};
//!
//! let ctx = SerializationContext::new();
//! let transcoder = Transcoder::from_context(&ctx);
//!
//! assert_eq!(transcoder.encode(Some("BASE64"), Some(b"Hi")).as_deref(), Some("SGk="));
//! assert_eq!(
//!     transcoder.decode_string(Some("base64"), Some("SGVsbG8=")),
//!     Ok(Some("Hello".to_owned()))
//! );
//! // unknown transfer encodings are not an error, just nothing
//! assert_eq!(transcoder.decode_data(Some("UUENCODE"), Some("x")), None);
//! ```
#![warn(unused_mut)]
#![warn(unused_imports)]
#![warn(unused_variables)]

pub mod config;
pub mod context;
pub mod encoding;
pub mod error;
pub mod globals;
pub mod provider;
pub mod stack;
pub mod transfer;
pub mod utf7;

pub use config::{MalformedPolicy, TranscoderOptions};
pub use context::{EncodingContext, SerializationContext, SharedEncodingStack};
pub use encoding::{CharEncoding, CharEncodingHandler, EncodingError};
pub use error::ContextError;
pub use provider::{EncodingProvider, Transcoder};
pub use stack::EncodingStack;
pub use transfer::TransferEncoding;
