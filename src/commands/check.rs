use clap::Args;
use std::io::{self, Write};

use crate::cli_util::print_machine_error;
use crate::commands::load_code;
use crate::program::strip;
use crate::validator;

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct CheckArgs {
    /// Read program code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Concatenated program code parts
    #[arg(value_name = "code", trailing_var_arg = true, allow_hyphen_values = true)]
    pub code: Vec<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: CheckArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }
    if args.file.is_none() && args.code.is_empty() {
        usage_and_exit(program, 2);
    }

    let code_str = match load_code(program, args.file, args.code) {
        Ok(s) => s,
        Err(exit_code) => return exit_code,
    };

    match validator::check(&code_str) {
        Ok(()) => {
            println!("ok ({} instructions)", strip(&code_str).len());
            let _ = io::stdout().flush();
            0
        }
        Err(err) => {
            print_machine_error(Some(program), &code_str, &err);
            1
        }
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} check "<code>"
  {0} check --file <PATH>

Options:
  --file, -f <PATH>  Read program code from PATH instead of positional "<code>"
  --help, -h         Show this help

Description:
  Checks that every [ has a matching ] without running the program.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
