// Error kinds and the exit code each one ends the process with

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShaderToolError {
    /// No usable compiler executable, neither given nor on the search path
    #[error("could not find {name} executable on PATH, and no usable path was given with --compiler-path")]
    ToolNotFound { name: String },

    #[error("no directory found with name {name} under {}", root.display())]
    InvalidSampleDirectory { name: String, root: PathBuf },

    /// Compiler ran but reported failure (or could not be started)
    #[error("failed to compile {} ({stage}): {}", source_path.display(), describe_exit(*exit_code))]
    CompileFailure {
        source_path: PathBuf,
        stage: String,
        exit_code: Option<i32>,
    },

    /// Accumulated failures of a keep-going run
    #[error("{count} shaders failed to compile")]
    CompileFailures { count: usize },

    #[error("cannot rename {} to {}: {source}", from.display(), to.display())]
    RenameSourceMissing {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Usage(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ToolResult<T> = Result<T, ShaderToolError>;

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code".to_string(),
    }
}

impl ShaderToolError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ShaderToolError::InvalidSampleDirectory { .. } => -1,
            ShaderToolError::CompileFailure { exit_code: Some(code), .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}
