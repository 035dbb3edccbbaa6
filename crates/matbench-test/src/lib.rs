//! Shared test fixtures for matbench crates.
//!
//! The harness only ever talks to executables through files and exit codes,
//! so the fixtures here are small POSIX shell scripts that honor (or
//! deliberately break) that contract. Scripts are run through `sh`, so they
//! need no execute bit.
//!
//! - [`per_trial`] - scripts for the one-process-per-trial contract
//! - [`batch`] - scripts that loop over every size themselves
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! matbench-test = { workspace = true }
//! ```
//!
//! ```ignore
//! use matbench_test::per_trial::Behavior;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let fake = Behavior::Multiply.write(dir.path(), "single");
//! let implementation = fake.implementation("single", dir.path());
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use matbench_config::ImplementationConfig;

pub mod batch;
pub mod per_trial;

pub use batch::BatchScript;
pub use per_trial::Behavior;

/// A script on disk standing in for a compiled implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeExecutable {
    pub script: PathBuf,
}

impl FakeExecutable {
    /// Per-trial implementation config that runs this script in `working_dir`.
    pub fn implementation(&self, id: &str, working_dir: &Path) -> ImplementationConfig {
        ImplementationConfig::new(id, "sh")
            .with_args([self.script.display().to_string()])
            .with_working_dir(working_dir)
    }

    /// Batch implementation config that runs this script in `working_dir`.
    pub fn batch_implementation(&self, id: &str, working_dir: &Path) -> ImplementationConfig {
        ImplementationConfig::batch(id, "sh")
            .with_args([self.script.display().to_string()])
            .with_working_dir(working_dir)
    }
}

/// Writes `body` as a shell script named `<name>.sh` in `dir`.
///
/// # Panics
///
/// Panics if the file cannot be written; fixtures are test-only.
pub fn write_script(dir: &Path, name: &str, body: &str) -> FakeExecutable {
    fs::create_dir_all(dir).expect("create fixture directory");
    let script = dir.join(format!("{}.sh", name));
    fs::write(&script, format!("#!/bin/sh\n{}\n", body)).expect("write fixture script");
    FakeExecutable { script }
}

/// Awk program multiplying the two matrices named on its command line and
/// printing the product without a header. With `skip_header`, the first line
/// of each input is ignored.
pub fn awk_multiply(skip_header: bool) -> String {
    let skip = if skip_header { "FNR == 1 { next }\n" } else { "" };
    format!(
        r#"{skip}NR == FNR {{ ra++; for (j = 1; j <= NF; j++) a[ra, j] = $j; ca = NF; next }}
{{ rb++; for (j = 1; j <= NF; j++) b[rb, j] = $j; cb = NF }}
END {{
  for (i = 1; i <= ra; i++) {{
    line = ""
    for (j = 1; j <= cb; j++) {{
      s = 0
      for (k = 1; k <= ca; k++) s += a[i, k] * b[k, j]
      line = line s " "
    }}
    print line
  }}
}}"#
    )
}
