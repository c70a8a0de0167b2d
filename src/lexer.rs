//! Lexical analysis of an input line.
//!
//! There is no quoting or escaping: a token is any maximal run of
//! non-whitespace characters.

/// Split a line into whitespace-delimited tokens.
///
/// Runs of whitespace count as a single separator and leading/trailing
/// whitespace is ignored, so an empty or blank line yields no tokens.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_owned).collect()
}
