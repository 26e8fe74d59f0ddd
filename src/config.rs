//! Options controlling how a [`Transcoder`](crate::Transcoder) treats its input.

use crate::globals::{get_default_base64_whitespace, get_default_malformed_policy};

/// What byte-to-text steps do with a malformed byte sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Fail the step. At the transcoder boundary this becomes an absent result.
    #[default]
    Strict,
    /// Substitute U+FFFD for each malformed sequence and keep going.
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscoderOptions {
    /// Applies to 7BIT and 8BIT `encode` and to the charset step of `decode_string`.
    pub malformed: MalformedPolicy,
    /// Drop space, TAB, CR and LF from Base64 text before decoding it.
    pub ignore_base64_whitespace: bool,
}

impl TranscoderOptions {
    pub fn with_malformed(mut self, policy: MalformedPolicy) -> Self {
        self.malformed = policy;
        self
    }

    pub fn with_base64_whitespace(mut self, ignore: bool) -> Self {
        self.ignore_base64_whitespace = ignore;
        self
    }
}

/// Reads the thread-local defaults in [`globals`](crate::globals).
impl Default for TranscoderOptions {
    fn default() -> Self {
        Self {
            malformed: get_default_malformed_policy(),
            ignore_base64_whitespace: get_default_base64_whitespace(),
        }
    }
}
