//! # cask-buildfile
//!
//! Parser for the Caskfile build language, a Dockerfile-subset dialect:
//! one instruction per logical line, `#` comments, and `\` line
//! continuations. The parser is pure. It performs no I/O beyond reading
//! the input file and leaves instruction semantics to the evaluator in
//! `cask-image`.

pub mod instruction;
pub mod parser;

pub use instruction::Instruction;
pub use parser::{parse_file, parse_str};
