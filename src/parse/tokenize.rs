use super::types::ArgVector;

/// Split a command line into an argument vector.
///
/// Every maximal run of non-whitespace characters becomes one token. Quotes
/// and backslashes have no special meaning, so `echo "a b"` yields three
/// tokens. A blank line yields an empty vector.
pub fn tokenize(line: &str) -> ArgVector {
    ArgVector::new(line.split(char::is_whitespace))
}
