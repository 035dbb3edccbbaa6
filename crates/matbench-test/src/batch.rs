//! Batch fake executables.
//!
//! A batch script changes into its data directory, multiplies the
//! headerless `matrixA_<n>.txt` and `matrixB_<n>.txt` for every size, and
//! appends `trials` lines of `"<n> 0.00<t>"` to its timing file, so trial
//! `t` (1-based) reports `t` milliseconds.

use std::path::Path;

use crate::{awk_multiply, write_script, FakeExecutable};

/// Parameters of a batch script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchScript {
    pub sizes: Vec<usize>,
    /// At most 9, so every timing stays below ten milliseconds.
    pub trials: usize,
    pub data_dir: String,
    pub timing_file: String,
    pub write_timings: bool,
    pub write_results: bool,
}

impl BatchScript {
    /// A well-behaved script for `id`, using the default file layout.
    pub fn new(id: &str, sizes: &[usize], trials: usize) -> Self {
        Self {
            sizes: sizes.to_vec(),
            trials: trials.min(9),
            data_dir: "data".to_string(),
            timing_file: format!("timingResults_{}.txt", id),
            write_timings: true,
            write_results: true,
        }
    }

    /// Skips the timing file entirely.
    pub fn without_timings(mut self) -> Self {
        self.write_timings = false;
        self
    }

    /// Writes timings but no result matrices.
    pub fn without_results(mut self) -> Self {
        self.write_results = false;
        self
    }

    pub fn body(&self) -> String {
        let sizes: Vec<String> = self.sizes.iter().map(ToString::to_string).collect();
        let mut body = format!(
            "cd {} || exit 1\nfor n in {}; do\n  :\n",
            self.data_dir,
            sizes.join(" ")
        );
        if self.write_results {
            body.push_str(&format!(
                "  awk '{}' matrixA_$n.txt matrixB_$n.txt > resultMatrix_$n.txt\n",
                awk_multiply(false)
            ));
        }
        if self.write_timings {
            body.push_str(&format!(
                concat!(
                    "  t=1\n",
                    "  while [ $t -le {} ]; do\n",
                    "    echo \"$n 0.00$t\" >> {}\n",
                    "    t=$((t + 1))\n",
                    "  done\n"
                ),
                self.trials, self.timing_file
            ));
        }
        body.push_str("done\n");
        body
    }

    /// Writes the script as `<name>.sh` in `dir`.
    pub fn write(&self, dir: &Path, name: &str) -> FakeExecutable {
        write_script(dir, name, &self.body())
    }
}
