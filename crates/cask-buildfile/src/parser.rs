//! Line-oriented parsing with comment skipping and continuation folding.

use std::path::Path;

use cask_common::error::{CaskError, Result};

use crate::instruction::Instruction;

/// Parses the buildfile at `path`.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, or a parse error
/// (with its 1-based line number) for a malformed instruction.
pub fn parse_file(path: &Path) -> Result<Vec<Instruction>> {
    let content = std::fs::read_to_string(path).map_err(|e| CaskError::io(path, e))?;
    tracing::debug!(path = %path.display(), "parsing buildfile");
    parse_str(&content)
}

/// Parses buildfile source text into an ordered instruction list.
///
/// Lines are trimmed; blank lines and `#` comments are skipped. A trailing
/// `\` folds the next non-comment line into the current logical line with a
/// single separating space. Each logical line then splits into
/// `(command, args)` at its first whitespace run, with the command folded
/// to upper case.
///
/// # Errors
///
/// Returns a parse error carrying the 1-based starting line number when a
/// logical line has a command but no arguments.
pub fn parse_str(input: &str) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::new();
    // Folded text of an unfinished continuation and the line it started on.
    let mut pending: Option<(String, usize)> = None;

    for (index, raw) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (text, continues) = match line.strip_suffix('\\') {
            Some(stripped) => (stripped.trim_end(), true),
            None => (line, false),
        };

        let (folded, start) = match pending.take() {
            Some((mut acc, start)) => {
                acc.push(' ');
                acc.push_str(text);
                (acc, start)
            }
            None => (text.to_string(), line_no),
        };

        if continues {
            pending = Some((folded, start));
        } else {
            instructions.push(split_logical_line(&folded, start)?);
        }
    }

    // An unterminated continuation at EOF still yields its instruction.
    if let Some((folded, start)) = pending {
        instructions.push(split_logical_line(&folded, start)?);
    }

    Ok(instructions)
}

fn split_logical_line(text: &str, line: usize) -> Result<Instruction> {
    let mut parts = text.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default();
    let args = parts.next().map(str::trim).unwrap_or_default();
    if command.is_empty() || args.is_empty() {
        return Err(CaskError::Parse {
            line,
            message: text.to_string(),
        });
    }
    Ok(Instruction {
        command: command.to_uppercase(),
        args: args.to_string(),
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_instructions_in_order() {
        let parsed = parse_str("FROM alpine\nRUN echo hi\nENV A=1\n").expect("parse");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].command, "FROM");
        assert_eq!(parsed[0].args, "alpine");
        assert_eq!(parsed[1].command, "RUN");
        assert_eq!(parsed[2].args, "A=1");
    }

    #[test]
    fn commands_are_folded_to_upper_case() {
        let parsed = parse_str("from alpine\ncOpY a b\n").expect("parse");
        assert_eq!(parsed[0].command, "FROM");
        assert_eq!(parsed[1].command, "COPY");
    }

    #[test]
    fn blank_lines_comments_and_padding_do_not_change_the_result() {
        let plain = "FROM alpine\nRUN echo hi\n";
        let noisy = "\n# header comment\n\n   FROM alpine   \n\n# between\nRUN echo hi\t\n\n";

        let strip = |input: &str| -> Vec<(String, String)> {
            parse_str(input)
                .expect("parse")
                .into_iter()
                .map(|i| (i.command, i.args))
                .collect()
        };
        assert_eq!(strip(plain), strip(noisy));
    }

    #[test]
    fn continuation_folds_with_a_single_space() {
        let parsed = parse_str("RUN apt-get update \\\n    apt-get install -y curl\n")
            .expect("parse");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].args, "apt-get update apt-get install -y curl");
        assert_eq!(parsed[0].line, 1);
    }

    #[test]
    fn continuation_chains_across_multiple_lines() {
        let parsed = parse_str("RUN a \\\nb \\\nc\n").expect("parse");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].args, "a b c");
    }

    #[test]
    fn comments_inside_a_continuation_are_skipped() {
        let parsed = parse_str("RUN a \\\n# interleaved comment\nb\n").expect("parse");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].args, "a b");
    }

    #[test]
    fn unterminated_continuation_at_eof_still_parses() {
        let parsed = parse_str("RUN a \\").expect("parse");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].args, "a");
    }

    #[test]
    fn command_without_args_is_a_parse_error_with_its_line() {
        let err = parse_str("FROM alpine\n\nWORKDIR\n").expect_err("must fail");
        match err {
            CaskError::Parse { line, message } => {
                assert_eq!(line, 3);
                assert_eq!(message, "WORKDIR");
            }
            other => panic!("expected parse error, got {other}"),
        }
    }

    #[test]
    fn unknown_commands_are_preserved_for_the_evaluator() {
        let parsed = parse_str("FROZZLE something\n").expect("parse");
        assert_eq!(parsed[0].command, "FROZZLE");
        assert!(!parsed[0].is_recognized());
    }

    #[test]
    fn empty_input_yields_an_empty_list() {
        assert!(parse_str("").expect("parse").is_empty());
        assert!(parse_str("\n# only a comment\n\n").expect("parse").is_empty());
    }

    #[test]
    fn args_keep_internal_whitespace() {
        let parsed = parse_str("CMD /bin/sh -c \"echo  two  spaces\"\n").expect("parse");
        assert_eq!(parsed[0].args, "/bin/sh -c \"echo  two  spaces\"");
    }

    #[test]
    fn parse_file_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Caskfile");
        std::fs::write(&path, "FROM scratch\nENV GREETING=hi\n").expect("write");

        let parsed = parse_file(&path).expect("parse");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].command, "ENV");
        assert_eq!(parsed[1].line, 2);
    }

    #[test]
    fn parse_file_missing_path_is_io_error() {
        let err = parse_file(Path::new("/nonexistent/Caskfile")).expect_err("must fail");
        assert!(matches!(err, CaskError::Io { .. }));
    }
}
