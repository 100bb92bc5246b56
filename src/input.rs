//! The input queue read by `,`.
//!
//! Input text is decoded once, up front, into a byte queue. In token mode each
//! whitespace-delimited word contributes its first byte; in stream mode every
//! byte of the text is queued in order.

use std::collections::VecDeque;

use crate::config::InputMode;

/// Pre-supplied bytes consumed front-first by `,`.
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    bytes: VecDeque<u8>,
}

impl InputQueue {
    pub fn new(text: &str, mode: InputMode) -> Self {
        let bytes = match mode {
            InputMode::Tokens => text
                .split_whitespace()
                .filter_map(|token| token.bytes().next())
                .collect(),
            InputMode::Stream => text.bytes().collect(),
        };
        Self { bytes }
    }

    pub fn pop_front(&mut self) -> Option<u8> {
        self.bytes.pop_front()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
