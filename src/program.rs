//! Instruction decoding and the jump-target table.

use crate::error::MachineError;
use crate::validator;

/// One of the eight tape instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Left,
    Right,
    Inc,
    Dec,
    Output,
    Input,
    LoopStart,
    LoopEnd,
}

impl Op {
    /// Map a source character to its instruction; anything else is a comment.
    pub fn from_char(ch: char) -> Option<Op> {
        match ch {
            '<' => Some(Op::Left),
            '>' => Some(Op::Right),
            '+' => Some(Op::Inc),
            '-' => Some(Op::Dec),
            '.' => Some(Op::Output),
            ',' => Some(Op::Input),
            '[' => Some(Op::LoopStart),
            ']' => Some(Op::LoopEnd),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Op::Left => '<',
            Op::Right => '>',
            Op::Inc => '+',
            Op::Dec => '-',
            Op::Output => '.',
            Op::Input => ',',
            Op::LoopStart => '[',
            Op::LoopEnd => ']',
        }
    }
}

/// Drop every character outside `<>+-.,[]`.
pub fn strip(source: &str) -> String {
    source.chars().filter(|&c| Op::from_char(c).is_some()).collect()
}

/// A decoded program with its precomputed loop partners.
#[derive(Debug, Clone)]
pub struct Program {
    ops: Vec<Op>,
    // jumps[i] is the matching bracket for a bracket at i; unused elsewhere.
    jumps: Vec<usize>,
}

impl Program {
    /// Validate `source`, decode it and build the jump table.
    ///
    /// Loop errors come from [`validator::check`], so their positions index
    /// the raw source.
    pub fn parse(source: &str) -> Result<Program, MachineError> {
        validator::check(source)?;

        let ops: Vec<Op> = source.chars().filter_map(Op::from_char).collect();
        let mut jumps: Vec<usize> = (0..ops.len()).collect();
        let mut stack: Vec<usize> = Vec::new();

        // Brackets are balanced here: every `]` pops, and the stack ends empty.
        for (i, op) in ops.iter().enumerate() {
            match op {
                Op::LoopStart => stack.push(i),
                Op::LoopEnd => {
                    if let Some(open_index) = stack.pop() {
                        jumps[open_index] = i;
                        jumps[i] = open_index;
                    }
                }
                _ => {}
            }
        }

        Ok(Program { ops, jumps })
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Index of the bracket matching the one at `ip`.
    #[inline]
    pub fn jump_target(&self, ip: usize) -> usize {
        self.jumps[ip]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoopSide;

    #[test]
    fn strip_keeps_only_commands() {
        assert_eq!(strip("a+b-c<d>e.f,g[h]i\n"), "+-<>.,[]");
        assert_eq!(strip("hello world"), "");
    }

    #[test]
    fn op_char_mapping_is_symmetric() {
        for ch in "<>+-.,[]".chars() {
            let op = Op::from_char(ch).expect("command char");
            assert_eq!(op.as_char(), ch);
        }
        assert_eq!(Op::from_char('*'), None);
    }

    #[test]
    fn jump_table_pairs_nested_brackets() {
        let program = Program::parse("+[>[-]<-]").unwrap();
        assert_eq!(program.len(), 9);
        assert_eq!(program.jump_target(1), 8);
        assert_eq!(program.jump_target(8), 1);
        assert_eq!(program.jump_target(3), 5);
        assert_eq!(program.jump_target(5), 3);
    }

    #[test]
    fn jump_table_indexes_stripped_program() {
        // Comments are removed before indexing.
        let program = Program::parse("loop: [ body - ]").unwrap();
        assert_eq!(program.ops(), &[Op::LoopStart, Op::Dec, Op::LoopEnd]);
        assert_eq!(program.jump_target(0), 2);
    }

    #[test]
    fn unbalanced_source_does_not_parse() {
        assert!(matches!(
            Program::parse("[[]"),
            Err(MachineError::MismatchedLoop { kind: LoopSide::Open, .. })
        ));
    }

    #[test]
    fn loop_error_positions_index_raw_source() {
        // Stripped, the stray `]` would be at index 0.
        assert!(matches!(
            Program::parse("ab ]"),
            Err(MachineError::MismatchedLoop { pos: 3, kind: LoopSide::Close })
        ));
        assert!(matches!(
            Program::parse("x [ y"),
            Err(MachineError::MismatchedLoop { pos: 2, kind: LoopSide::Open })
        ));
    }

    #[test]
    fn empty_source_is_empty_program() {
        let program = Program::parse("just a comment").unwrap();
        assert!(program.is_empty());
    }
}
