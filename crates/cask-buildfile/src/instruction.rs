//! The instruction model produced by the parser.

use std::fmt;

/// Commands the build evaluator understands.
///
/// The parser preserves anything else verbatim; rejection happens at
/// evaluation time so the error can carry the evaluator's context.
pub const RECOGNIZED_COMMANDS: [&str; 9] = [
    "FROM",
    "RUN",
    "COPY",
    "ADD",
    "ENV",
    "WORKDIR",
    "EXPOSE",
    "CMD",
    "ENTRYPOINT",
];

/// A single buildfile instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Upper-cased command word.
    pub command: String,
    /// Remainder of the logical line after the first whitespace run,
    /// with continuations folded in.
    pub args: String,
    /// 1-based line number where the logical line started.
    pub line: usize,
}

impl Instruction {
    /// Returns true when the evaluator understands this command.
    #[must_use]
    pub fn is_recognized(&self) -> bool {
        RECOGNIZED_COMMANDS.contains(&self.command.as_str())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.command, self.args)
    }
}
