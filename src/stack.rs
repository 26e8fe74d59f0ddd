//! The stack of "current" charsets kept by a serialization session.

use crate::{
    encoding::{CharEncodingHandler, EncodingError, find_encoding_handler},
    globals::default_charset_handler,
};

/// Nested charset scopes. The last pushed handler is the current one.
///
/// `decode_string` of a [`Transcoder`](crate::Transcoder) reads only the current entry.
/// Pushing and popping is left to the session that owns the stack.
#[derive(Debug, Clone)]
pub struct EncodingStack {
    stack: Vec<CharEncodingHandler>,
}

impl EncodingStack {
    /// Create a stack holding the default charset of this thread (UTF-8 unless changed by
    /// [`set_default_charset`](crate::globals::set_default_charset)).
    pub fn new() -> Self {
        Self {
            stack: vec![default_charset_handler()],
        }
    }

    /// Create a stack without any current charset.
    pub fn empty() -> Self {
        Self { stack: vec![] }
    }

    /// Push `handler` and return its index in the stack.
    pub fn push(&mut self, handler: CharEncodingHandler) -> usize {
        log::trace!("push charset {}", handler.name());
        self.stack.push(handler);
        self.stack.len() - 1
    }

    /// Resolve `name` through the charset registry and push it, returning its index.
    pub fn push_by_name(&mut self, name: &str) -> Result<usize, EncodingError> {
        let handler = find_encoding_handler(name).ok_or_else(|| EncodingError::Other {
            msg: format!("Unknown charset {name:?}.").into(),
        })?;
        Ok(self.push(handler))
    }

    pub fn pop(&mut self) -> Option<CharEncodingHandler> {
        let res = self.stack.pop();
        if let Some(handler) = res.as_ref() {
            log::trace!("pop charset {}", handler.name());
        }
        res
    }

    pub fn current(&self) -> Option<&CharEncodingHandler> {
        self.stack.last()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

impl Default for EncodingStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::{encoding::CharEncoding, globals::reset_default_options};

    use super::*;

    #[test]
    fn test_new_stack_starts_with_utf8() {
        reset_default_options();
        let stack = EncodingStack::new();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.current().unwrap().name(), "UTF-8");
        assert!(EncodingStack::empty().current().is_none());
        assert!(EncodingStack::empty().is_empty());
    }

    #[test]
    fn test_push_pop() {
        let mut stack = EncodingStack::empty();
        assert_eq!(stack.push(CharEncoding::UTF8.into()), 0);
        assert_eq!(stack.push_by_name("latin1").unwrap(), 1);
        assert_eq!(stack.current().unwrap().name(), "ISO-8859-1");

        assert!(stack.push_by_name("no-such-charset").is_err());
        assert_eq!(stack.len(), 2);

        let index = stack.push_by_name("utf-16le").unwrap();
        assert_eq!(index, stack.len() - 1);
        assert_eq!(stack.pop().unwrap().name(), "UTF-16LE");

        assert_eq!(stack.pop().unwrap().name(), "ISO-8859-1");
        assert_eq!(stack.current().unwrap().name(), "UTF-8");
        assert_eq!(stack.pop().unwrap().name(), "UTF-8");
        assert!(stack.pop().is_none());
        assert!(stack.current().is_none());
    }
}
