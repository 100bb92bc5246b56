use std::io::{self, Write};

use crate::program::strip;
use crate::MachineError;

/// Pretty-print a structured MachineError with caret positioning.
/// If `program` is `Some("bf")`, prefix messages with "bf: ...".
pub fn print_machine_error(program: Option<&str>, code: &str, err: &MachineError) {
    eprint!("{}", render_machine_error(program, code, err));
    let _ = io::stderr().flush();
}

/// Render the message printed by [`print_machine_error`].
///
/// Loop errors point into the raw source; runtime errors point into the
/// stripped instruction sequence, since that is what the program counter indexes.
pub fn render_machine_error(program: Option<&str>, code: &str, err: &MachineError) -> String {
    let prefix_program = |msg: &str| {
        if let Some(p) = program {
            format!("{p}: {msg}")
        } else {
            msg.to_string()
        }
    };

    match err {
        MachineError::MismatchedLoop { pos, kind } => {
            let msg = prefix_program(&format!("Parse error: mismatched loop, unmatched {kind}"));
            error_with_context(&msg, "position", code, *pos)
        }
        MachineError::BoundsViolation { ip, ptr, op } => {
            let msg = prefix_program(&format!(
                "Runtime error: pointer out of bounds (ptr={ptr}, op={op})"
            ));
            error_with_context(&msg, "instruction", &strip(code), *ip)
        }
        MachineError::InputExhausted { ip } => {
            let msg = prefix_program("Runtime error: read past end of input");
            error_with_context(&msg, "instruction", &strip(code), *ip)
        }
        MachineError::Io { ip, source } => {
            let msg = prefix_program(&format!("I/O error: {source}"));
            error_with_context(&msg, "instruction", &strip(code), *ip)
        }
        other => format!("{}\n", prefix_program(&other.to_string())),
    }
}

/// A concise error line plus a caret context window,
/// working with UTF-8 by slicing using char indices.
fn error_with_context(prefix: &str, unit: &str, code: &str, pos: usize) -> String {
    // Show a short window around the position for context
    const WINDOW_CHARS: usize = 32;

    let total_chars = code.chars().count();
    let start_char = pos.saturating_sub(WINDOW_CHARS);
    let end_char = (pos + WINDOW_CHARS + 1).min(total_chars);

    let start_byte = char_to_byte_index(code, start_char);
    let end_byte = char_to_byte_index(code, end_char);
    // Newlines in the window would break the caret alignment.
    let slice: String = code[start_byte..end_byte]
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    // Caret under the exact position
    let caret_offset_chars = pos.saturating_sub(start_char);
    let underline = format!("{}^", " ".repeat(caret_offset_chars));

    format!("{prefix} at {unit} {pos}\n  {slice}\n  {underline}\n")
}

/// Convert a char index into a byte index in the given UTF-8 string.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(byte_idx, _)| byte_idx)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoopSide;

    #[test]
    fn loop_error_points_into_raw_source() {
        let err = MachineError::MismatchedLoop { pos: 3, kind: LoopSide::Close };
        let text = render_machine_error(Some("bf"), "ab ]c", &err);
        assert_eq!(
            text,
            "bf: Parse error: mismatched loop, unmatched ']' at position 3\n  ab ]c\n     ^\n"
        );
    }

    #[test]
    fn runtime_error_points_into_stripped_program() {
        let err = MachineError::BoundsViolation { ip: 1, ptr: 0, op: '<' };
        let text = render_machine_error(None, "+ comment <", &err);
        assert!(text.starts_with("Runtime error: pointer out of bounds (ptr=0, op=<) at instruction 1\n"));
        assert!(text.contains("\n  +<\n   ^\n"));
    }

    #[test]
    fn control_errors_have_no_context_window() {
        let text = render_machine_error(Some("bf"), "+[]", &MachineError::StepLimitExceeded { limit: 5 });
        assert_eq!(text, "bf: Execution aborted: step limit exceeded (5)\n");
    }

    #[test]
    fn char_index_handles_multibyte_text() {
        assert_eq!(char_to_byte_index("é+", 1), 2);
        assert_eq!(char_to_byte_index("é+", 5), 3);
    }
}
