pub mod check;
pub mod run;

use std::fs;
use std::io::{self, Read, Write};

/// Resolve program text from `--file` or the concatenated positional parts.
///
/// On failure the message is already printed and the exit code is returned.
pub(crate) fn load_code(program: &str, file: Option<String>, code: Vec<String>) -> Result<String, i32> {
    if file.is_some() && !code.is_empty() {
        eprintln!("{program}: cannot use positional code together with --file");
        let _ = io::stderr().flush();
        return Err(2);
    }

    match file {
        Some(path) => read_text(program, "code file", &path),
        None => Ok(code.join("")),
    }
}

/// Read UTF-8 text from `path`, or from stdin when `path` is `-`.
pub(crate) fn read_text(program: &str, what: &str, path: &str) -> Result<String, i32> {
    let result = if path == "-" {
        let mut s = String::new();
        io::stdin().read_to_string(&mut s).map(|_| s)
    } else {
        fs::read_to_string(path)
    };

    result.map_err(|e| {
        eprintln!("{program}: failed to read {what} as UTF-8: {e}");
        let _ = io::stderr().flush();
        1
    })
}
