use std::fmt;

/// Errors that can occur while validating or executing a program.
#[derive(Debug, thiserror::Error)]
pub enum MachineError {
    /// Loops were not balanced; a matching `[` or `]` was not found.
    /// `pos` is a character index into the raw source.
    #[error("Mismatched loop: unmatched {kind} at position {pos}")]
    MismatchedLoop { pos: usize, kind: LoopSide },

    /// The data pointer attempted to move left of cell 0 or beyond the last cell.
    #[error("Pointer out of bounds at instruction {ip} (ptr={ptr}, op='{op}')")]
    BoundsViolation { ip: usize, ptr: usize, op: char },

    /// `,` was executed with nothing left in the input queue.
    #[error("Input exhausted at instruction {ip}")]
    InputExhausted { ip: usize },

    /// Writing to the output sink failed.
    #[error("I/O error at instruction {ip}: {source}")]
    Io {
        ip: usize,
        #[source]
        source: std::io::Error,
    },

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: usize },

    /// Execution aborted due to cooperative cancellation (e.g., timeout)
    #[error("Execution aborted: cancelled")]
    Canceled,

    #[error("Tape size must be at least one cell")]
    InvalidTapeSize,
}

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopSide {
    Open,
    Close,
}

impl fmt::Display for LoopSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopSide::Open => write!(f, "'['"),
            LoopSide::Close => write!(f, "']'"),
        }
    }
}
