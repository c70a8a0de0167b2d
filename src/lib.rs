//! A small interactive command interpreter.
//!
//! Lines are split on whitespace, checked against a table of built-in verbs and
//! otherwise handed to the operating system as an external program. External
//! commands may redirect their standard input/output to files (`<`, `>`), run
//! in the background (trailing `&`), or be connected to a second command with a
//! single pipe (`left | right`).
//!
//! The main entry point is [`Interpreter`], which owns the session state
//! (history, log file, environment) and dispatches each line. The lower-level
//! pieces are public too: [`lexer::tokenize`], [`parser::extract`],
//! [`external::launch`] and [`pipeline::launch_pipeline`].

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod external;
pub mod history;
mod interpreter;
pub mod jobs;
pub mod lexer;
pub mod parser;
pub mod pipeline;

/// Re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::{Flow, Interpreter};
