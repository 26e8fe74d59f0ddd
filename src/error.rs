use std::fmt::Display;

/// A serialization session that cannot reinterpret decoded bytes as text.
///
/// This is not a transcoding failure. It means the session was wired up
/// wrong, so it is reported instead of being folded into an absent result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// The encoding stack has no current entry.
    EmptyEncodingStack,
    /// The encoding stack is mutably borrowed while a decode reads it.
    EncodingStackBorrowed,
}

impl Display for ContextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Context Error: ")?;
        match self {
            Self::EmptyEncodingStack => write!(f, "the encoding stack has no current encoding"),
            Self::EncodingStackBorrowed => {
                write!(f, "the encoding stack is being modified during a decode")
            }
        }
    }
}

impl std::error::Error for ContextError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_error_display() {
        assert_eq!(
            ContextError::EmptyEncodingStack.to_string(),
            "Context Error: the encoding stack has no current encoding"
        );
        assert!(
            ContextError::EncodingStackBorrowed
                .to_string()
                .starts_with("Context Error: ")
        );
    }
}
