use thiserror::Error;

/// Errors that can occur when a listener reads its arguments.
///
/// Registering, removing and dispatching listeners never fails; these errors only arise from
/// typed argument access via [`Call::arg()`][crate::Call::arg].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The listener asked for an argument beyond the end of the argument list.
    #[error("argument {index} is missing: the listener received {len} arguments")]
    MissingArgument {
        /// The requested argument index.
        index: usize,

        /// The number of arguments the listener received.
        len: usize,
    },

    /// The argument exists but holds a value of a different type.
    #[error("argument {index} is not a value of type {expected}")]
    ArgumentTypeMismatch {
        /// The requested argument index.
        index: usize,

        /// The name of the type the listener asked for.
        expected: &'static str,
    },
}

/// A specialized `Result` type for listener argument access, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn missing_argument_mentions_index_and_len() {
        let error = Error::MissingArgument { index: 3, len: 1 };

        let message = error.to_string();
        assert!(message.contains('3'));
        assert!(message.contains('1'));
    }

    #[test]
    fn type_mismatch_mentions_expected_type() {
        let error = Error::ArgumentTypeMismatch {
            index: 0,
            expected: "u64",
        };

        assert!(error.to_string().contains("u64"));
    }
}
