//! Per-trial fake executables.
//!
//! Each script runs in the harness's working directory, reads headered
//! `matrixA.txt` and `matrixB.txt`, and writes a headerless
//! `resultMatrix.txt`.

use std::path::Path;

use crate::{awk_multiply, write_script, FakeExecutable};

/// What a fake executable does when run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Multiplies correctly.
    Multiply,
    /// Exits with `code` without writing anything.
    Fail(i32),
    /// Exits with `code` when `matrixA.txt` has `size` rows, else multiplies.
    FailAtSize { size: usize, code: i32 },
    /// Sleeps far longer than any test timeout.
    Hang,
    /// Exits successfully without writing a result.
    NoOutput,
    /// Writes a correctly shaped result full of `-1`.
    WrongResult,
}

impl Behavior {
    /// Shell body implementing the behavior.
    pub fn body(self) -> String {
        let multiply = format!(
            "awk '{}' matrixA.txt matrixB.txt > resultMatrix.txt",
            awk_multiply(true)
        );
        match self {
            Behavior::Multiply => multiply,
            Behavior::Fail(code) => format!("exit {}", code),
            Behavior::FailAtSize { size, code } => format!(
                "read rows cols < matrixA.txt\nif [ \"$rows\" -eq {} ]; then exit {}; fi\n{}",
                size, code, multiply
            ),
            Behavior::Hang => "exec sleep 30".to_string(),
            Behavior::NoOutput => "exit 0".to_string(),
            Behavior::WrongResult => concat!(
                "awk 'NR == 1 { for (i = 0; i < $1; i++) { line = \"\"; ",
                "for (j = 0; j < $1; j++) line = line \"-1 \"; print line } }' ",
                "matrixA.txt > resultMatrix.txt"
            )
            .to_string(),
        }
    }

    /// Writes the script as `<name>.sh` in `dir`.
    pub fn write(self, dir: &Path, name: &str) -> FakeExecutable {
        write_script(dir, name, &self.body())
    }
}
