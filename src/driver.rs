// =============================================================================
// DRIVER - Walk the shader tree and compile every stage found
// =============================================================================
//
// RUN FLOW:
// 1. Resolve the scope (whole tree, or one sample directory)
// 2. Walk it and detect the stages of every candidate file
// 3. Compile each (file, stage) pair, one blocking compiler process at a time
// 4. After a sample's Slang modules are done, apply its output renames
//
// Failures are handled in exactly one of two modes per run: fail-fast stops
// at the first failing stage, accumulate compiles everything and reports a
// count at the end.

use crate::error::{ShaderToolError, ToolResult};
use crate::shader::detect::detect_stages;
use crate::shader::rename::apply_renames;
use crate::shader::{CompileResult, CompileUnit, Compiler, Executor, RenameTable, ShaderLanguage};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Abort the run at the first failing stage
    FailFast,
    /// Keep compiling, report the failure count at the end
    Accumulate,
}

/// What to compile and how to react to failures
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub root: PathBuf,
    /// Directory actually walked: `root`, or `root/<sample>`
    pub scope: PathBuf,
    pub failure_mode: FailureMode,
    pub renames: RenameTable,
}

impl RunPlan {
    /// Build a plan, checking that the requested sample directory exists
    pub fn new(
        root: PathBuf,
        sample: Option<&str>,
        failure_mode: FailureMode,
        renames: RenameTable,
    ) -> ToolResult<Self> {
        let scope = match sample {
            Some(name) => {
                let dir = root.join(name);
                if !dir.is_dir() {
                    return Err(ShaderToolError::InvalidSampleDirectory {
                        name: name.to_string(),
                        root,
                    });
                }
                dir
            }
            None => {
                if !root.is_dir() {
                    return Err(ShaderToolError::Usage(format!(
                        "shader root {} is not a directory",
                        root.display()
                    )));
                }
                root.clone()
            }
        };

        Ok(Self {
            root,
            scope,
            failure_mode,
            renames,
        })
    }
}

/// Everything a finished (or accumulate-mode) run produced
#[derive(Debug, Default)]
pub struct RunSummary {
    pub results: Vec<CompileResult>,
    /// Files that matched no stage (unknown extension or no markers)
    pub skipped: usize,
    pub renamed: usize,
}

impl RunSummary {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.succeeded).count()
    }

    /// Turn accumulated failures into the run's error
    pub fn check(self) -> ToolResult<Self> {
        match self.failures() {
            0 => Ok(self),
            count => Err(ShaderToolError::CompileFailures { count }),
        }
    }
}

// =============================================================================
// DISCOVERY
// =============================================================================

/// Walk `plan.scope` and build one unit per file with at least one stage.
/// Returns the units in path order and the number of skipped files.
pub fn discover_units(plan: &RunPlan, language: ShaderLanguage) -> ToolResult<(Vec<CompileUnit>, usize)> {
    let mut files = Vec::new();
    collect_files(&plan.scope, &mut files)?;
    files.sort();

    let mut units = Vec::new();
    let mut skipped = 0;
    for source in files {
        let stages = detect_stages(&source, language).map_err(|e| ShaderToolError::Io {
            path: source.clone(),
            source: e,
        })?;
        if stages.is_empty() {
            log::debug!("Skipping {} (no shader stages)", source.display());
            skipped += 1;
            continue;
        }
        let sample = sample_of(&plan.root, &source);
        units.push(CompileUnit { source, sample, stages });
    }
    Ok((units, skipped))
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> ToolResult<()> {
    let io_err = |source| ShaderToolError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let file_type = entry.file_type().map_err(io_err)?;
        if file_type.is_dir() {
            collect_files(&entry.path(), files)?;
        } else {
            files.push(entry.path());
        }
    }
    Ok(())
}

/// Name of the top-level directory under `root` that holds `source`
fn sample_of(root: &Path, source: &Path) -> Option<String> {
    let relative = source.strip_prefix(root).ok()?;
    let mut components = relative.components();
    let first = components.next()?;
    // A file directly in the root belongs to no sample
    components.next()?;
    match first {
        Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
        _ => None,
    }
}

// =============================================================================
// COMPILATION
// =============================================================================

/// Compile every stage under the plan's scope.
///
/// In fail-fast mode the first failing stage ends the run with
/// `CompileFailure`. In accumulate mode the summary is returned and the
/// caller decides via [`RunSummary::check`]. A failed rename always ends
/// the run.
pub fn run(compiler: &Compiler, executor: &mut dyn Executor, plan: &RunPlan) -> ToolResult<RunSummary> {
    let (units, skipped) = discover_units(plan, compiler.language)?;
    log::info!(
        "Found {} {} shader files under {}",
        units.len(),
        compiler.language,
        plan.scope.display()
    );

    let mut summary = RunSummary {
        skipped,
        ..Default::default()
    };

    let mut index = 0;
    while index < units.len() {
        // Units are sorted by path, so one sample's files are contiguous
        let sample = units[index].sample.clone();
        let end = units[index..]
            .iter()
            .position(|u| u.sample != sample)
            .map_or(units.len(), |offset| index + offset);

        for unit in &units[index..end] {
            compile_unit(compiler, executor, unit, plan.failure_mode, &mut summary)?;
        }

        if compiler.language.is_multi_stage() {
            if let Some(sample) = &sample {
                summary.renamed += rename_outputs(plan, sample)?;
            }
        }
        index = end;
    }

    if summary.failures() == 0 {
        log::info!("All shaders compiled successfully!");
    }
    Ok(summary)
}

fn compile_unit(
    compiler: &Compiler,
    executor: &mut dyn Executor,
    unit: &CompileUnit,
    failure_mode: FailureMode,
    summary: &mut RunSummary,
) -> ToolResult<()> {
    log::info!("Compiling {}", unit.source.display());

    for &stage in &unit.stages {
        let result = compiler.compile_stage(executor, unit, stage);

        if result.succeeded {
            log::debug!("  {} -> {} (entry {})", stage, result.output.display(), result.entry_point);
            if !result.diagnostics.trim().is_empty() {
                log::debug!("{}", result.diagnostics.trim_end());
            }
        } else {
            log::error!("Error compiling {} ({})", unit.source.display(), stage);
            if !result.diagnostics.trim().is_empty() {
                log::error!("{}", result.diagnostics.trim_end());
            }
            if failure_mode == FailureMode::FailFast {
                let err = ShaderToolError::CompileFailure {
                    source_path: result.source.clone(),
                    stage: stage.to_string(),
                    exit_code: result.exit_code,
                };
                summary.results.push(result);
                return Err(err);
            }
        }
        summary.results.push(result);
    }
    Ok(())
}

/// Every listed rename is applied, even after failed compiles; a missing
/// output then ends the run
fn rename_outputs(plan: &RunPlan, sample: &str) -> ToolResult<usize> {
    let renames = plan.renames.renames_for(sample);
    if renames.is_empty() {
        return Ok(0);
    }
    apply_renames(&plan.root.join(sample), &renames)
}
