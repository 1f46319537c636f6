// Output artifact naming
//
// Single-stage sources keep their full name and gain `.spv`
// (`triangle.vert` -> `triangle.vert.spv`). Multi-stage sources drop the
// language suffix and gain the stage extension instead
// (`shader.slang` -> `shader.vert.spv`, `shader.frag.spv`).

use super::language::{ShaderLanguage, SLANG_EXTENSION};
use super::stage::{ShaderStage, DEFAULT_ENTRY_POINT};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const SPIRV_EXTENSION: &str = "spv";

/// Where a stage is written and which function the compiler starts from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub path: PathBuf,
    pub entry_point: String,
}

/// Resolve the output path and entry symbol for one stage of a source file.
///
/// `stage_count` is the number of stages detected in the same file; it only
/// matters for multi-stage languages, where several entry points need
/// distinct symbols.
pub fn output_target(
    source: &Path,
    stage: ShaderStage,
    stage_count: usize,
    language: ShaderLanguage,
) -> OutputTarget {
    if !language.is_multi_stage() {
        return OutputTarget {
            path: append_extension(source, SPIRV_EXTENSION),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
        };
    }

    let stem = if source.extension().is_some_and(|ext| ext == SLANG_EXTENSION) {
        source.with_extension("")
    } else {
        source.to_path_buf()
    };
    let path = append_extension(&append_extension(&stem, stage.extension()), SPIRV_EXTENSION);

    OutputTarget {
        path,
        entry_point: entry_point(stage, stage_count),
    }
}

/// Entry symbol for a stage of a multi-stage module
pub fn entry_point(stage: ShaderStage, stage_count: usize) -> String {
    if stage_count > 1 {
        format!("{}Main", stage.slang_name())
    } else {
        DEFAULT_ENTRY_POINT.to_string()
    }
}

/// `foo.vert` + `spv` -> `foo.vert.spv` (unlike `with_extension`, which
/// would replace `.vert`)
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
