//! Thread-local defaults picked up by new transcoders and encoding stacks.
//!
//! A serialization session lives on one thread, so the defaults are per thread as well.

use std::{borrow::Cow, cell::RefCell};

use crate::{
    config::MalformedPolicy,
    encoding::{CharEncoding, CharEncodingHandler, EncodingError, find_encoding_handler},
};

pub struct GlobalState {
    malformed_policy: MalformedPolicy,
    ignore_base64_whitespace: bool,
    default_charset: Cow<'static, str>,
}

impl GlobalState {
    fn new() -> Self {
        Self {
            malformed_policy: MalformedPolicy::Strict,
            ignore_base64_whitespace: true,
            default_charset: Cow::Borrowed(CharEncoding::UTF8.get_name()),
        }
    }
}

thread_local! {
    pub static GLOBAL_STATE: RefCell<GlobalState> = RefCell::new(GlobalState::new());
}

pub fn set_default_malformed_policy(policy: MalformedPolicy) {
    GLOBAL_STATE.with_borrow_mut(|state| state.malformed_policy = policy);
}

pub fn get_default_malformed_policy() -> MalformedPolicy {
    GLOBAL_STATE.with_borrow(|state| state.malformed_policy)
}

pub fn set_default_base64_whitespace(ignore: bool) {
    GLOBAL_STATE.with_borrow_mut(|state| state.ignore_base64_whitespace = ignore);
}

pub fn get_default_base64_whitespace() -> bool {
    GLOBAL_STATE.with_borrow(|state| state.ignore_base64_whitespace)
}

/// Set the charset a fresh [`EncodingStack`](crate::EncodingStack) starts with.
///
/// Fails without changing anything if `name` does not resolve to a known charset.
pub fn set_default_charset(name: &str) -> Result<(), EncodingError> {
    let handler = find_encoding_handler(name).ok_or_else(|| EncodingError::Other {
        msg: format!("Unknown charset {name:?}.").into(),
    })?;
    let name = handler.name().to_owned();
    GLOBAL_STATE.with_borrow_mut(|state| state.default_charset = Cow::Owned(name));
    Ok(())
}

pub fn get_default_charset() -> String {
    GLOBAL_STATE.with_borrow(|state| state.default_charset.to_string())
}

/// Resolve the default charset, falling back to UTF-8 if it stopped resolving
/// (e.g. the alias it was set through was removed).
pub(crate) fn default_charset_handler() -> CharEncodingHandler {
    let name = get_default_charset();
    find_encoding_handler(&name).unwrap_or_else(|| {
        log::warn!("default charset {name:?} is no longer known, using UTF-8");
        CharEncoding::UTF8.into()
    })
}

/// Restore every default of the current thread.
pub fn reset_default_options() {
    GLOBAL_STATE.with_borrow_mut(|state| *state = GlobalState::new());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_charset() {
        reset_default_options();
        assert_eq!(get_default_charset(), "UTF-8");
        assert_eq!(default_charset_handler().name(), "UTF-8");

        set_default_charset("latin1").unwrap();
        assert_eq!(get_default_charset(), "ISO-8859-1");
        assert_eq!(default_charset_handler().name(), "ISO-8859-1");

        assert!(set_default_charset("no-such-charset").is_err());
        assert_eq!(get_default_charset(), "ISO-8859-1");

        reset_default_options();
        assert_eq!(get_default_charset(), "UTF-8");
    }

    #[test]
    fn test_defaults_are_per_thread() {
        reset_default_options();
        set_default_base64_whitespace(false);
        let other = std::thread::spawn(get_default_base64_whitespace)
            .join()
            .unwrap();
        assert!(other);
        assert!(!get_default_base64_whitespace());
        reset_default_options();
    }
}
