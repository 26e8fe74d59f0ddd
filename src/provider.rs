//! The transcoder between property payload bytes and their transfer-encoded text.
//!
//! Every failure to transcode (an absent input, an identifier outside `7BIT`, `8BIT` and
//! `BASE64`, malformed input for the chosen codec) comes back as `None`. The three causes
//! are deliberately not told apart: a property serializer only needs to know that the
//! value has to be omitted. The causes are logged at `debug` level.
//!
//! The one failure that is reported is a session that cannot say which charset is
//! current, see [`ContextError`].

use std::{cell::RefCell, rc::Rc};

use crate::{
    config::TranscoderOptions,
    context::{EncodingContext, SerializationContext},
    encoding::EncodingError,
    error::ContextError,
    stack::EncodingStack,
    transfer::TransferEncoding,
};

/// Transfer-encoding operations a property serializer depends on.
pub trait EncodingProvider {
    /// Turn `data` into the text form of `encoding`.
    fn encode(&self, encoding: Option<&str>, data: Option<&[u8]>) -> Option<String>;

    /// Turn the text form `value` of `encoding` back into bytes.
    fn decode_data(&self, encoding: Option<&str>, value: Option<&str>) -> Option<Vec<u8>>;

    /// Like [`decode_data`](Self::decode_data), then read the bytes as text in the
    /// charset that is current for the session.
    ///
    /// # Errors
    /// Only when the session has no usable current charset. Transcoding failures are
    /// still `Ok(None)`.
    fn decode_string(
        &self,
        encoding: Option<&str>,
        value: Option<&str>,
    ) -> Result<Option<String>, ContextError>;
}

/// The [`EncodingProvider`] of a serialization session.
///
/// Holds nothing but its options and a handle to the session's charset context.
pub struct Transcoder<C: EncodingContext = RefCell<EncodingStack>> {
    context: Rc<C>,
    options: TranscoderOptions,
}

impl<C: EncodingContext> Transcoder<C> {
    /// Create a transcoder reading charsets from `context`, with the default options.
    pub fn new(context: Rc<C>) -> Self {
        Self::with_options(context, TranscoderOptions::default())
    }

    pub fn with_options(context: Rc<C>, options: TranscoderOptions) -> Self {
        Self { context, options }
    }

    pub fn options(&self) -> &TranscoderOptions {
        &self.options
    }

    pub fn context(&self) -> &Rc<C> {
        &self.context
    }
}

impl Transcoder {
    /// Create a transcoder sharing the encoding stack of `ctx`.
    pub fn from_context(ctx: &SerializationContext) -> Self {
        Self::new(ctx.encoding_stack())
    }
}

fn lookup(encoding: &str) -> Option<TransferEncoding> {
    match encoding.parse::<TransferEncoding>() {
        Ok(transfer) => {
            log::trace!("dispatch {encoding:?} to {transfer}");
            Some(transfer)
        }
        Err(err) => {
            log::debug!("{err}");
            None
        }
    }
}

fn absorb<T>(transfer: TransferEncoding, res: Result<T, EncodingError>) -> Option<T> {
    res.inspect_err(|err| log::debug!("{transfer}: {err}")).ok()
}

impl<C: EncodingContext> EncodingProvider for Transcoder<C> {
    fn encode(&self, encoding: Option<&str>, data: Option<&[u8]>) -> Option<String> {
        let (encoding, data) = (encoding?, data?);
        let transfer = lookup(encoding)?;
        absorb(transfer, transfer.encode(data, &self.options))
    }

    fn decode_data(&self, encoding: Option<&str>, value: Option<&str>) -> Option<Vec<u8>> {
        let (encoding, value) = (encoding?, value?);
        let transfer = lookup(encoding)?;
        absorb(transfer, transfer.decode(value, &self.options))
    }

    fn decode_string(
        &self,
        encoding: Option<&str>,
        value: Option<&str>,
    ) -> Result<Option<String>, ContextError> {
        let Some(data) = self.decode_data(encoding, value) else {
            return Ok(None);
        };

        let charset = self.context.current_encoding()?;
        match charset.decode(&data, self.options.malformed) {
            Ok(text) => Ok(Some(text)),
            Err(err) => {
                log::debug!("current charset {}: {err}", charset.name());
                Ok(None)
            }
        }
    }
}
