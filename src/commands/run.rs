use clap::Args;
use std::thread;
use std::io::{self, BufWriter, Write};
use std::sync::{mpsc, Arc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli_util::print_machine_error;
use crate::commands::{load_code, read_text};
use crate::config::{InputMode, Policy, Settings};
use crate::machine::StepControl;
use crate::{validator, Interpreter, MachineError};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    /// Print a step-by-step table of operations instead of program output
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Read program code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Input text consumed by `,`
    #[arg(short = 'i', long = "input", value_name = "TEXT", conflicts_with = "input_file")]
    pub input: Option<String>,

    /// Read input text from PATH (`-` for stdin)
    #[arg(long = "input-file", value_name = "PATH")]
    pub input_file: Option<String>,

    /// Number of tape cells (fallback BF_TAPE_SIZE; default 30_000)
    #[arg(long = "tape-size", value_name = "N")]
    pub tape_size: Option<usize>,

    /// Ignore out-of-range moves and reads past the end of input instead of failing
    #[arg(long = "permissive")]
    pub permissive: bool,

    /// Feed input byte-by-byte instead of one byte per whitespace-separated token
    #[arg(long = "stream")]
    pub stream: bool,

    /// Concatenated program code parts
    #[arg(value_name = "code", trailing_var_arg = true, allow_hyphen_values = true)]
    pub code: Vec<String>,

    /// Wall-clock timeout in milliseconds (fallback BF_TIMEOUT_MS; default unlimited)
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum interpreter steps before abort (fallback BF_MAX_STEPS; default unlimited)
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<u64>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let RunArgs {
        debug,
        file,
        input,
        input_file,
        tape_size,
        permissive,
        stream,
        code,
        timeout_ms,
        max_steps,
        ..
    } = args;

    if file.is_none() && code.is_empty() {
        usage_and_exit(program, 2);
    }

    let code_str = match load_code(program, file, code) {
        Ok(s) => s,
        Err(exit_code) => return exit_code,
    };

    let input_str = match (input, input_file) {
        (Some(text), _) => text,
        (None, Some(path)) => match read_text(program, "input file", &path) {
            Ok(s) => s,
            Err(exit_code) => return exit_code,
        },
        (None, None) => String::new(),
    };

    // Resolve settings: flags -> env -> config file -> defaults
    let mut settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{program}: {e}");
            let _ = io::stderr().flush();
            return 2;
        }
    };
    if let Some(n) = tape_size {
        settings.tape_size = n;
    }
    if permissive {
        settings.policy = Policy::Permissive;
    }
    if stream {
        settings.input_mode = InputMode::Stream;
    }
    if timeout_ms.is_some() {
        settings.timeout_ms = timeout_ms;
    }
    if max_steps.is_some() {
        settings.max_steps = max_steps;
    }
    if let Err(e) = settings.validate() {
        eprintln!("{program}: {e}");
        let _ = io::stderr().flush();
        return 2;
    }

    if let Err(err) = validator::check(&code_str) {
        print_machine_error(Some(program), &code_str, &err);
        return 1;
    }

    let mut bf = match Interpreter::with_config(&code_str, &input_str, &settings.machine()) {
        Ok(bf) => bf,
        Err(err) => {
            print_machine_error(Some(program), &code_str, &err);
            return 1;
        }
    };
    info!(?settings, "starting run");

    // Execute on a worker thread with cooperative cancellation
    let cancel = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel::<Result<(), MachineError>>();
    let cancel_clone = cancel.clone();

    // Ctrl+C raises the same flag as the timeout so buffered output is flushed.
    let cancel_on_sigint = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || cancel_on_sigint.store(true, Ordering::Relaxed)) {
        warn!("failed to set ctrl+c handler: {e}");
    }

    let step_budget = settings
        .max_steps
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX));

    thread::spawn(move || {
        let mut out = BufWriter::new(io::stdout().lock());
        let ctrl = StepControl::new(step_budget, cancel_clone);
        let res = if debug {
            bf.run_debug_with_control(&mut out, ctrl)
        } else {
            bf.run_with_control(&mut out, ctrl)
        };
        let _ = tx.send(res);
    });

    let timeout_ms = settings.timeout_ms.unwrap_or_default();
    let (result, timed_out) = match settings.timeout_ms {
        Some(ms) => match rx.recv_timeout(Duration::from_millis(ms)) {
            Ok(res) => (Some(res), false),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                cancel.store(true, Ordering::Relaxed);
                // The worker stops at its next step and flushes what it wrote.
                (rx.recv().ok(), true)
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => (None, false),
        },
        None => (rx.recv().ok(), false),
    };

    match result {
        Some(Ok(())) => 0,
        Some(Err(MachineError::Canceled)) if timed_out => {
            eprintln!("Execution aborted: wall-clock timeout exceeded ({timeout_ms} ms)");
            let _ = io::stderr().flush();
            1
        }
        Some(Err(err @ (MachineError::StepLimitExceeded { .. } | MachineError::Canceled))) => {
            eprintln!("{err}");
            let _ = io::stderr().flush();
            1
        }
        Some(Err(other)) => {
            print_machine_error(Some(program), &code_str, &other);
            1
        }
        None if timed_out => {
            eprintln!("Execution aborted: wall-clock timeout exceeded ({timeout_ms} ms)");
            let _ = io::stderr().flush();
            1
        }
        None => 1,
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run [OPTIONS] "<code>"
  {0} run [OPTIONS] --file <PATH>

Options:
  --file,  -f <PATH>     Read program code from PATH instead of positional "<code>"
  --input, -i <TEXT>     Input text consumed by `,`
  --input-file <PATH>    Read input text from PATH (`-` for stdin)
  --tape-size <N>        Number of tape cells (default 30000)
  --permissive           Ignore out-of-range moves and reads past end of input
  --stream               Feed input byte-by-byte instead of one byte per token
  --timeout <MS>         Abort after MS milliseconds of wall-clock time (default unlimited)
  --max-steps <N>        Abort after N instructions (default unlimited)
  --debug, -d            Print a step-by-step table of operations instead of output
  --help,  -h            Show this help

Notes:
- Characters outside of ><+-.,[] are comments and are ignored.
- Unbalanced [ ] are reported before anything runs.
- By default input is split on whitespace and each word supplies its first byte.
- Program output is written to stdout as raw bytes with nothing added.

Examples:
- Load code from a file:
    {0} run --file ./program.bf
- Echo two letters:
    {0} run --input "H i" ",.,."
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
