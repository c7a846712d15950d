//! Helpers for error handling

/// Expands a given error type to wrap a stringified version of a given error
///
/// To be used in a map_err() call
#[macro_export]
macro_rules! err_str {
    ($x:expr) => {
        |e| $x(e.to_string())
    };
}

#[cfg(test)]
mod test {
    /// A dummy error type wrapping a string
    #[derive(Debug, PartialEq, Eq)]
    struct WrappedError(String);

    #[test]
    fn test_err_str_wraps_display() {
        let res: Result<u64, WrappedError> =
            "not-a-number".parse::<u64>().map_err(err_str!(WrappedError));

        let err = res.unwrap_err();
        assert_eq!(err, WrappedError("invalid digit found in string".to_string()));
    }
}
