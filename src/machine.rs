//! The tape machine.
//!
//! Owns the tape, the data pointer, the decoded program with its jump table,
//! the program counter and the input queue. One instance runs one program.

use std::io::Write;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tracing::debug;

use crate::config::{MachineConfig, Policy};
use crate::error::MachineError;
use crate::input::InputQueue;
use crate::program::{Op, Program};

/// Controls for cooperative cancellation and step limiting.
#[derive(Clone)]
pub struct StepControl {
    pub max_steps: Option<usize>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl StepControl {
    pub fn new(max_steps: Option<usize>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self { max_steps, cancel_flag }
    }
}

/// A tape machine loaded with one program and its input.
///
/// The interpreter maintains:
/// - the decoded program and its jump-target table,
/// - a zeroed tape of the configured size (30,000 cells by default),
/// - a data pointer and a program counter, both starting at 0,
/// - the queue of input bytes for `,`.
pub struct Interpreter {
    program: Program,
    tape: Vec<u8>,
    pointer: usize,
    pc: usize,
    input: InputQueue,
    policy: Policy,
}

impl Interpreter {
    /// Load `code` with `input` on the default machine (30,000 cells, strict).
    pub fn new(code: &str, input: &str) -> Result<Self, MachineError> {
        Self::with_config(code, input, &MachineConfig::default())
    }

    /// Load `code` with `input` on a machine described by `config`.
    ///
    /// Unbalanced loops are rejected here so that `run` never meets them.
    pub fn with_config(
        code: &str,
        input: &str,
        config: &MachineConfig,
    ) -> Result<Self, MachineError> {
        if config.tape_size == 0 {
            return Err(MachineError::InvalidTapeSize);
        }

        let program = Program::parse(code)?;
        let input = InputQueue::new(input, config.input_mode);
        debug!(
            instructions = program.len(),
            input_bytes = input.len(),
            tape_size = config.tape_size,
            policy = ?config.policy,
            "program loaded"
        );

        Ok(Self {
            program,
            tape: vec![0; config.tape_size],
            pointer: 0,
            pc: 0,
            input,
            policy: config.policy,
        })
    }

    pub fn tape(&self) -> &[u8] {
        &self.tape
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn current_cell(&self) -> u8 {
        self.tape[self.pointer]
    }

    pub fn program_counter(&self) -> usize {
        self.pc
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Execute the program until completion, writing `.` bytes to `out`.
    ///
    /// Returns `Ok(())` on success or a [`MachineError`] on failure. Bytes
    /// written before a failure stay written.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<(), MachineError> {
        self.execute(out, false, None)
    }

    /// Execute with cooperative cancellation and optional step limit.
    pub fn run_with_control<W: Write>(
        &mut self,
        out: &mut W,
        step_control: StepControl,
    ) -> Result<(), MachineError> {
        self.execute(out, false, Some(&step_control))
    }

    /// Debug-run the program, writing a step-by-step table of operations to
    /// `out` instead of program output. State advances exactly as in a real
    /// run; `.` is only logged and `,` still drains the input queue.
    pub fn run_debug<W: Write>(&mut self, out: &mut W) -> Result<(), MachineError> {
        self.execute(out, true, None)
    }

    /// Debug-run with cooperative cancellation and optional step limit.
    pub fn run_debug_with_control<W: Write>(
        &mut self,
        out: &mut W,
        step_control: StepControl,
    ) -> Result<(), MachineError> {
        self.execute(out, true, Some(&step_control))
    }

    /// Internal executor shared by the run variants. Flushes `out` whatever
    /// the outcome.
    fn execute<W: Write>(
        &mut self,
        out: &mut W,
        debug: bool,
        step_control: Option<&StepControl>,
    ) -> Result<(), MachineError> {
        let result = self.step_loop(out, debug, step_control);
        let flushed = out
            .flush()
            .map_err(|source| MachineError::Io { ip: self.pc, source });

        match &result {
            Ok(()) => debug!(pointer = self.pointer, "program finished"),
            Err(err) => debug!(ip = self.pc, %err, "program aborted"),
        }
        result.and(flushed)
    }

    fn step_loop<W: Write>(
        &mut self,
        out: &mut W,
        debug: bool,
        step_control: Option<&StepControl>,
    ) -> Result<(), MachineError> {
        let code_len = self.program.len();
        let mut step: usize = 0;

        if debug {
            write_table_line(out, 0, "STEP | IP  | PTR | CELL | INSTR | ACTION")?;
            write_table_line(
                out,
                0,
                "-----+-----+-----+------+-------+------------------------------------------------",
            )?;
        }

        while self.pc < code_len {
            if let Some(ctrl) = step_control {
                if ctrl.cancel_flag.load(Ordering::Relaxed) {
                    return Err(MachineError::Canceled);
                }
                if let Some(max) = ctrl.max_steps {
                    if step >= max {
                        return Err(MachineError::StepLimitExceeded { limit: max });
                    }
                }
            }

            let ip = self.pc;
            let op = self.program.ops()[ip];
            let (ptr_before, cell_before) = (self.pointer, self.tape[self.pointer]);
            let mut action: Option<String> = if debug { Some(String::new()) } else { None };

            match op {
                Op::Right => {
                    if self.pointer + 1 >= self.tape.len() {
                        self.fault(MachineError::BoundsViolation {
                            ip,
                            ptr: self.pointer,
                            op: '>',
                        })?;
                        if let Some(a) = action.as_mut() {
                            *a = "Ignored move past last cell".to_string();
                        }
                    } else {
                        self.pointer += 1;
                        if let Some(a) = action.as_mut() {
                            *a = format!("Moved pointer head to index {}", self.pointer);
                        }
                    }
                }
                Op::Left => {
                    if self.pointer == 0 {
                        self.fault(MachineError::BoundsViolation {
                            ip,
                            ptr: self.pointer,
                            op: '<',
                        })?;
                        if let Some(a) = action.as_mut() {
                            *a = "Ignored move before cell 0".to_string();
                        }
                    } else {
                        self.pointer -= 1;
                        if let Some(a) = action.as_mut() {
                            *a = format!("Moved pointer head to index {}", self.pointer);
                        }
                    }
                }
                Op::Inc => {
                    let after = cell_before.wrapping_add(1);
                    self.tape[self.pointer] = after;
                    if let Some(a) = action.as_mut() {
                        *a = format!(
                            "Increment cell[{}] from {} to {}",
                            ptr_before, cell_before, after
                        );
                    }
                }
                Op::Dec => {
                    let after = cell_before.wrapping_sub(1);
                    self.tape[self.pointer] = after;
                    if let Some(a) = action.as_mut() {
                        *a = format!(
                            "Decrement cell[{}] from {} to {}",
                            ptr_before, cell_before, after
                        );
                    }
                }
                Op::Output => {
                    if let Some(a) = action.as_mut() {
                        *a = format!("Output byte {} (suppressed in debug)", cell_before);
                    } else {
                        out.write_all(&[cell_before])
                            .map_err(|source| MachineError::Io { ip, source })?;
                    }
                }
                Op::Input => match self.input.pop_front() {
                    Some(b) => {
                        self.tape[self.pointer] = b;
                        if let Some(a) = action.as_mut() {
                            *a = format!("Read byte from input -> {}", b);
                        }
                    }
                    None => {
                        self.fault(MachineError::InputExhausted { ip })?;
                        if let Some(a) = action.as_mut() {
                            *a = "Input exhausted; cell unchanged".to_string();
                        }
                    }
                },
                Op::LoopStart => {
                    if cell_before == 0 {
                        let j = self.program.jump_target(ip);
                        if let Some(a) = action.as_mut() {
                            *a = format!("Cell is 0; jump forward to matching ']' at IP {}", j);
                        }
                        self.pc = j;
                    } else if let Some(a) = action.as_mut() {
                        *a = "Enter loop (cell != 0)".to_string();
                    }
                }
                Op::LoopEnd => {
                    if cell_before != 0 {
                        let j = self.program.jump_target(ip);
                        if let Some(a) = action.as_mut() {
                            *a = format!("Cell != 0; jump back to matching '[' at IP {}", j);
                        }
                        self.pc = j;
                    } else if let Some(a) = action.as_mut() {
                        *a = "Exit loop (cell is 0)".to_string();
                    }
                }
            }

            if let Some(action) = action {
                let row = format!(
                    "{:<4} | {:<3} | {:<3} | {:<4} |  {}    | {}",
                    step,
                    ip,
                    ptr_before,
                    cell_before,
                    op.as_char(),
                    action
                );
                write_table_line(out, ip, &row)?;
            }

            step += 1;
            // The jump lands on the partner bracket; this steps past it.
            self.pc += 1;
        }

        Ok(())
    }

    /// Apply the policy to a runtime condition: strict aborts, permissive skips.
    fn fault(&self, err: MachineError) -> Result<(), MachineError> {
        match self.policy {
            Policy::Strict => Err(err),
            Policy::Permissive => {
                debug!(%err, "ignored under permissive policy");
                Ok(())
            }
        }
    }
}

fn write_table_line<W: Write>(
    out: &mut W,
    ip: usize,
    line: &str,
) -> Result<(), MachineError> {
    writeln!(out, "{line}").map_err(|source| MachineError::Io { ip, source })
}
