//! Turning tokens into something the launchers can run.

use crate::error::ParseError;
use std::path::PathBuf;

const BACKGROUND: &str = "&";
const REDIRECT_INPUT: &str = "<";
const REDIRECT_OUTPUT: &str = ">";
const PIPE: char = '|';

/// Everything needed to start one external program.
///
/// `argv[0]` is the program name. Directive tokens (`<`, `>`, their paths and
/// a trailing `&`) never appear in `argv`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub argv: Vec<String>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub background: bool,
}

impl ExecutionRequest {
    /// A foreground request with no redirections.
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Pull the background flag and the redirections out of `tokens`.
///
/// A trailing `&` marks the request as background. Every `<`/`>` followed by
/// another token captures that token as the input/output path; both tokens
/// are removed. When a directive repeats, the last one wins.
pub fn extract(mut tokens: Vec<String>) -> Result<ExecutionRequest, ParseError> {
    let mut request = ExecutionRequest::default();

    if tokens.last().is_some_and(|t| t == BACKGROUND) {
        request.background = true;
        tokens.pop();
    }

    let mut i = 0;
    while i < tokens.len() {
        let slot = match tokens[i].as_str() {
            REDIRECT_INPUT => &mut request.input,
            REDIRECT_OUTPUT => &mut request.output,
            _ => {
                i += 1;
                continue;
            }
        };
        if i + 1 >= tokens.len() {
            return Err(ParseError::DanglingRedirect(tokens[i].clone()));
        }
        // removal shifts the rest left, so `i` already points at the next token
        let mut directive = tokens.drain(i..i + 2);
        directive.next();
        *slot = directive.next().map(PathBuf::from);
    }

    if tokens.is_empty() {
        return Err(ParseError::MissingProgram);
    }
    request.argv = tokens;
    Ok(request)
}

/// Split a line on its pipe delimiter.
///
/// Returns `None` for a line without `|`.
pub fn split_pipeline(line: &str) -> Option<Result<(&str, &str), ParseError>> {
    let (left, right) = line.split_once(PIPE)?;
    if right.contains(PIPE) {
        return Some(Err(ParseError::TooManyStages));
    }
    if left.trim().is_empty() || right.trim().is_empty() {
        return Some(Err(ParseError::EmptyPipelineStage));
    }
    Some(Ok((left, right)))
}
