//! Errors raised while decoding layout structures

/// An error that occurs when decoding a layout structure from raw bytes.
///
/// Decoding is all-or-nothing: the first error aborts the decode of the
/// structure that raised it and propagates up the call stack. There is no
/// partial or degraded result for a corrupt structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A declared or required byte length exceeds the bytes available.
    TooShort {
        /// The structure being decoded.
        table: &'static str,
        /// A description of the field being read when the check failed.
        reading: &'static str,
        /// The number of bytes required, counted from the structure start.
        expected: usize,
        /// The number of bytes actually available.
        actual: usize,
    },
    /// An unrecognized format discriminant.
    UnknownFormat {
        /// The structure being decoded.
        table: &'static str,
        /// The offending format value.
        format: u16,
    },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::TooShort {
                table,
                reading,
                expected,
                actual,
            } => write!(
                f,
                "{table}: not enough data reading {reading} (expected {expected} bytes, found {actual})"
            ),
            DecodeError::UnknownFormat { table, format } => {
                write!(f, "{table}: unknown format '{format}'")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_lengths() {
        let err = DecodeError::TooShort {
            table: "Coverage",
            reading: "glyph array",
            expected: 204,
            actual: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("Coverage"));
        assert!(msg.contains("glyph array"));
        assert!(msg.contains("204"));
        assert!(msg.contains("10"));
    }
}
