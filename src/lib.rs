//! A strict, table-driven Brainfuck tape machine.
//!
//! This crate runs programs written with the eight instructions `<>+-.,[]`
//! on a fixed-size byte tape (default 30,000 cells) with a single data pointer.
//!
//! Features and behaviors:
//! - Tape initialized to 0; cell arithmetic wraps modulo 256.
//! - Every character outside `<>+-.,[]` is a comment and is dropped at load.
//! - Loops are checked for balance before execution and matched through a
//!   jump table built once at load time, so every jump is O(1).
//! - Input `,` pops the next byte of a pre-supplied input queue.
//! - Output `.` writes the raw byte at the current cell to any `io::Write`.
//! - Moving the pointer off the tape or reading past the end of input is
//!   fatal under [`Policy::Strict`] (the default) and ignored under
//!   [`Policy::Permissive`].
//!
//! Quick start:
//!
//! ```no_run
//! use bf_tape::Interpreter;
//!
//! // Classic "Hello World!" in Brainfuck
//! let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";
//! let mut bf = Interpreter::new(code, "").expect("balanced program");
//! bf.run(&mut std::io::stdout()).expect("program should run");
//! ```

pub mod cli_util;
pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod machine;
pub mod program;
pub mod validator;

pub use config::{InputMode, MachineConfig, Policy};
pub use error::{LoopSide, MachineError};
pub use machine::{Interpreter, StepControl};
pub use program::{Op, Program};
