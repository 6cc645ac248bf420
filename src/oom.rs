//! Out-of-memory exit classification
//!
//! A JVM killed by `OutOfMemoryError` often exits with a generic failure
//! code. Scanning the task log for the error marker lets the task script
//! report a dedicated exit code so the orchestrator can retry with more
//! memory.

use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Text the JVM prints when it runs out of memory
pub const OOM_MARKER: &str = "java.lang.OutOfMemoryError";

/// Exit code reported for an out-of-memory failure
pub const DEFAULT_OOM_EXIT_CODE: i32 = 104;

/// Result of classifying a finished process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExitClassification {
    pub exit_code: i32,
    pub out_of_memory: bool,
}

/// Rewrites exit codes of processes whose log shows an out-of-memory error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OomClassifier {
    pub marker: String,
    pub exit_code: i32,
}

impl Default for OomClassifier {
    fn default() -> Self {
        Self {
            marker: OOM_MARKER.to_string(),
            exit_code: DEFAULT_OOM_EXIT_CODE,
        }
    }
}

impl OomClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different exit code for out-of-memory failures
    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    /// Classify using log text already in memory
    pub fn classify_text(&self, exit_code: i32, log: &str) -> ExitClassification {
        self.classification(exit_code, log.contains(&self.marker))
    }

    /// Classify by scanning a log file, stopping at the first marker
    pub fn classify_log(&self, exit_code: i32, path: &Path) -> Result<ExitClassification> {
        let file = File::open(path)?;
        let found = self.scan(BufReader::new(file))?;
        if found {
            tracing::info!(
                target: "jvmbudget",
                log = %path.display(),
                original_exit_code = exit_code,
                exit_code = self.exit_code,
                "out-of-memory marker found, overriding exit code"
            );
        }
        Ok(self.classification(exit_code, found))
    }

    /// Scan any buffered reader line by line for the marker
    pub fn scan<R: BufRead>(&self, reader: R) -> Result<bool> {
        // Logs can contain non-UTF-8 output from native code, so compare bytes.
        let marker = self.marker.as_bytes();
        for line in reader.split(b'\n') {
            let line = line?;
            if contains_bytes(&line, marker) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn classification(&self, exit_code: i32, out_of_memory: bool) -> ExitClassification {
        ExitClassification {
            exit_code: if out_of_memory { self.exit_code } else { exit_code },
            out_of_memory,
        }
    }
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}
