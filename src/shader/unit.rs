// Compile units and per-stage results

use super::stage::ShaderStage;
use std::path::PathBuf;

/// One source file and the stages found in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileUnit {
    pub source: PathBuf,
    /// Top-level sample directory the file lives in, if any
    pub sample: Option<String>,
    pub stages: Vec<ShaderStage>,
}

impl CompileUnit {
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

/// Outcome of compiling one stage of one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileResult {
    pub source: PathBuf,
    pub stage: ShaderStage,
    pub output: PathBuf,
    pub entry_point: String,
    /// `None` when the compiler could not be started or died from a signal
    pub exit_code: Option<i32>,
    pub succeeded: bool,
    /// Captured compiler output (stdout then stderr)
    pub diagnostics: String,
}
