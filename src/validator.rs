//! Loop-balance validation.
//!
//! Runs over the raw source before any stripping. Only `[` and `]` matter, so
//! comment characters are never inspected beyond a single comparison.

use crate::error::{LoopSide, MachineError};

/// Check that every `]` closes an earlier `[` and that no `[` is left open.
///
/// Fails on the first stray `]`, or after the scan with the position of the
/// innermost `[` that was never closed. Positions are character indices.
pub fn check(source: &str) -> Result<(), MachineError> {
    // Positions of currently open brackets; its length is the loop depth.
    let mut open: Vec<usize> = Vec::new();

    for (pos, ch) in source.chars().enumerate() {
        match ch {
            '[' => open.push(pos),
            ']' => {
                if open.pop().is_none() {
                    return Err(MachineError::MismatchedLoop {
                        pos,
                        kind: LoopSide::Close,
                    });
                }
            }
            _ => {}
        }
    }

    if let Some(pos) = open.last().copied() {
        return Err(MachineError::MismatchedLoop {
            pos,
            kind: LoopSide::Open,
        });
    }

    Ok(())
}

/// Convenience wrapper over [`check`].
pub fn is_valid(source: &str) -> bool {
    check(source).is_ok()
}
