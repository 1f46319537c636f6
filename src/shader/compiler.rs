// External shader compiler: discovery and invocation
//
// Responsibilities:
// - Locate glslangValidator / dxc / slangc (explicit path, then PATH)
// - Build the per-stage command line for each language
// - Run the compiler as a blocking child process and capture its output

use super::language::ShaderLanguage;
use super::naming::{output_target, OutputTarget};
use super::stage::ShaderStage;
use super::unit::{CompileResult, CompileUnit};
use crate::error::{ShaderToolError, ToolResult};
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runtime target for stages that need Vulkan 1.2 / SPIR-V 1.4+
const VULKAN_1_2: &str = "vulkan1.2";

/// SPIR-V extensions every DXC compile enables
const DXC_EXTENSIONS: [&str; 6] = [
    "SPV_KHR_ray_tracing",
    "SPV_KHR_multiview",
    "SPV_KHR_shader_draw_parameters",
    "SPV_EXT_descriptor_indexing",
    "SPV_KHR_ray_query",
    "SPV_KHR_fragment_shading_rate",
];

/// Samples whose HLSL shaders use `printf` and need the non-semantic extension
const DEBUG_PRINTF_SAMPLE: &str = "debugprintf";

// =============================================================================
// DISCOVERY
// =============================================================================

/// Locate the compiler for `language`.
///
/// An explicit path is used when it points at an executable file; otherwise
/// every `PATH` directory is searched, then the Vulkan SDK's bin directory.
pub fn find_compiler(language: ShaderLanguage, explicit: Option<&Path>) -> ToolResult<PathBuf> {
    find_compiler_in(
        language.compiler_name(),
        explicit,
        env::var_os("PATH"),
        env::var_os("VULKAN_SDK"),
    )
}

/// Same as [`find_compiler`] with the environment passed in
pub fn find_compiler_in(
    name: &str,
    explicit: Option<&Path>,
    search_path: Option<OsString>,
    vulkan_sdk: Option<OsString>,
) -> ToolResult<PathBuf> {
    if let Some(path) = explicit {
        if is_executable(path) {
            return Ok(path.to_path_buf());
        }
        log::warn!(
            "{} is not an executable file, searching PATH for {} instead",
            path.display(),
            name
        );
    }

    let exe_name = format!("{}{}", name, env::consts::EXE_SUFFIX);

    let mut dirs: Vec<PathBuf> = search_path
        .map(|paths| env::split_paths(&paths).collect())
        .unwrap_or_default();
    if let Some(sdk) = vulkan_sdk {
        let sdk = PathBuf::from(sdk);
        dirs.push(sdk.join("bin"));
        dirs.push(sdk.join("Bin"));
    }

    dirs.into_iter()
        .map(|dir| dir.join(&exe_name))
        .find(|candidate| is_executable(candidate))
        .ok_or_else(|| ShaderToolError::ToolNotFound { name: name.to_string() })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

// =============================================================================
// INVOCATION
// =============================================================================

/// Per-run compile switches
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub debug_symbols: bool,
    /// Appended to every command line before the input file
    pub extra_args: Vec<String>,
}

/// A resolved compiler for one language
#[derive(Debug, Clone)]
pub struct Compiler {
    pub language: ShaderLanguage,
    pub executable: PathBuf,
    pub options: CompileOptions,
}

/// A fully built command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }

    fn arg_strings(&self) -> Vec<String> {
        self.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in self.arg_strings() {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// What came back from running an [`Invocation`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub diagnostics: String,
}

/// Runs compiler command lines. The process-backed implementation is
/// [`ProcessExecutor`].
pub trait Executor {
    fn execute(&mut self, invocation: &Invocation) -> io::Result<ExecOutcome>;
}

/// Spawns the compiler and waits for it, no timeout
#[derive(Debug, Default)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn execute(&mut self, invocation: &Invocation) -> io::Result<ExecOutcome> {
        let output = invocation.command().output()?;

        let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !diagnostics.is_empty() && !diagnostics.ends_with('\n') {
                diagnostics.push('\n');
            }
            diagnostics.push_str(&stderr);
        }

        Ok(ExecOutcome {
            success: output.status.success(),
            exit_code: output.status.code(),
            diagnostics,
        })
    }
}

impl Compiler {
    pub fn new(language: ShaderLanguage, executable: PathBuf, options: CompileOptions) -> Self {
        Self { language, executable, options }
    }

    /// Build the command line compiling `stage` of `unit` into `target`
    pub fn invocation(&self, unit: &CompileUnit, stage: ShaderStage, target: &OutputTarget) -> Invocation {
        let args = match self.language {
            ShaderLanguage::Glsl => self.glslang_args(unit, stage, target),
            ShaderLanguage::Hlsl => self.dxc_args(unit, stage, target),
            ShaderLanguage::Slang => self.slangc_args(unit, stage, target),
        };
        Invocation {
            program: self.executable.clone(),
            args,
        }
    }

    /// Compile one stage and record the result. Failing to start the
    /// compiler is reported as a failed result, not an error.
    pub fn compile_stage(
        &self,
        executor: &mut dyn Executor,
        unit: &CompileUnit,
        stage: ShaderStage,
    ) -> CompileResult {
        let target = output_target(&unit.source, stage, unit.stage_count(), self.language);
        let invocation = self.invocation(unit, stage, &target);
        log::debug!("{}", invocation);

        let outcome = executor.execute(&invocation).unwrap_or_else(|e| ExecOutcome {
            success: false,
            exit_code: None,
            diagnostics: format!("failed to run {}: {}", invocation.program.display(), e),
        });

        CompileResult {
            source: unit.source.clone(),
            stage,
            output: target.path,
            entry_point: target.entry_point,
            exit_code: outcome.exit_code,
            succeeded: outcome.success,
            diagnostics: outcome.diagnostics,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // glslangValidator: stage comes from the file extension
    // ─────────────────────────────────────────────────────────────────────────
    fn glslang_args(&self, unit: &CompileUnit, stage: ShaderStage, target: &OutputTarget) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-V".into()];
        if stage.is_ray_tracing() || stage.is_mesh_pipeline() {
            args.push("--target-env".into());
            args.push(VULKAN_1_2.into());
        }
        if self.options.debug_symbols {
            args.push("-g".into());
        }
        self.push_extra_args(&mut args);
        args.push(unit.source.clone().into());
        args.push("-o".into());
        args.push(target.path.clone().into());
        args
    }

    // ─────────────────────────────────────────────────────────────────────────
    // dxc: profile per stage, always entry `main`
    // ─────────────────────────────────────────────────────────────────────────
    fn dxc_args(&self, unit: &CompileUnit, stage: ShaderStage, target: &OutputTarget) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-spirv".into(),
            "-T".into(),
            stage.hlsl_profile().into(),
            "-E".into(),
            target.entry_point.clone().into(),
        ];
        args.extend(DXC_EXTENSIONS.iter().map(|ext| OsString::from(format!("-fspv-extension={}", ext))));

        if stage.is_mesh_pipeline() {
            args.push("-fspv-extension=SPV_EXT_mesh_shader".into());
        }
        if unit.sample.as_deref() == Some(DEBUG_PRINTF_SAMPLE) {
            args.push("-fspv-extension=SPV_KHR_non_semantic_info".into());
        }
        if stage.is_ray_tracing() || stage.is_mesh_pipeline() {
            args.push(format!("-fspv-target-env={}", VULKAN_1_2).into());
        }
        if self.options.debug_symbols {
            args.push("-Zi".into());
        }
        self.push_extra_args(&mut args);
        args.push(unit.source.clone().into());
        args.push("-Fo".into());
        args.push(target.path.clone().into());
        args
    }

    // ─────────────────────────────────────────────────────────────────────────
    // slangc: one invocation per entry point of the module
    // ─────────────────────────────────────────────────────────────────────────
    fn slangc_args(&self, unit: &CompileUnit, stage: ShaderStage, target: &OutputTarget) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            unit.source.clone().into(),
            "-profile".into(),
            "spirv_1_4".into(),
            "-matrix-layout-column-major".into(),
            "-target".into(),
            "spirv".into(),
            "-o".into(),
            target.path.clone().into(),
            "-entry".into(),
            target.entry_point.clone().into(),
            "-stage".into(),
            stage.slang_name().into(),
        ];
        if stage.is_ray_tracing() {
            args.push("-capability".into());
            args.push("spvRayTracingKHR".into());
        }
        if stage.is_mesh_pipeline() {
            args.push("-capability".into());
            args.push("SPV_EXT_mesh_shader".into());
        }
        if self.options.debug_symbols {
            args.push("-g".into());
        }
        self.push_extra_args(&mut args);
        args
    }

    fn push_extra_args(&self, args: &mut Vec<OsString>) {
        args.extend(self.options.extra_args.iter().map(OsString::from));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(source: &str, sample: Option<&str>, stages: &[ShaderStage]) -> CompileUnit {
        CompileUnit {
            source: PathBuf::from(source),
            sample: sample.map(str::to_string),
            stages: stages.to_vec(),
        }
    }

    fn compiler(language: ShaderLanguage, debug_symbols: bool) -> Compiler {
        Compiler::new(
            language,
            PathBuf::from("/sdk/bin/tool"),
            CompileOptions {
                debug_symbols,
                extra_args: Vec::new(),
            },
        )
    }

    fn args_of(invocation: &Invocation) -> Vec<String> {
        invocation.arg_strings()
    }

    #[test]
    fn glslang_vertex_command_line() {
        let unit = unit("triangle/triangle.vert", Some("triangle"), &[ShaderStage::Vertex]);
        let glsl = compiler(ShaderLanguage::Glsl, false);
        let target = output_target(&unit.source, ShaderStage::Vertex, 1, ShaderLanguage::Glsl);
        let args = args_of(&glsl.invocation(&unit, ShaderStage::Vertex, &target));
        assert_eq!(
            args,
            vec!["-V", "triangle/triangle.vert", "-o", "triangle/triangle.vert.spv"]
        );
    }

    #[test]
    fn glslang_ray_stage_targets_vulkan_1_2_with_debug_info() {
        let unit = unit("rt/raygen.rgen", None, &[ShaderStage::RayGeneration]);
        let glsl = compiler(ShaderLanguage::Glsl, true);
        let target = output_target(&unit.source, ShaderStage::RayGeneration, 1, ShaderLanguage::Glsl);
        let args = args_of(&glsl.invocation(&unit, ShaderStage::RayGeneration, &target));
        assert_eq!(
            args,
            vec!["-V", "--target-env", "vulkan1.2", "-g", "rt/raygen.rgen", "-o", "rt/raygen.rgen.spv"]
        );
    }

    #[test]
    fn dxc_profiles_and_overrides() {
        let hlsl = compiler(ShaderLanguage::Hlsl, false);

        let frag = unit("bloom/bloom.frag", Some("bloom"), &[ShaderStage::Fragment]);
        let target = output_target(&frag.source, ShaderStage::Fragment, 1, ShaderLanguage::Hlsl);
        let args = args_of(&hlsl.invocation(&frag, ShaderStage::Fragment, &target));
        assert_eq!(&args[..5], &["-spirv", "-T", "ps_6_4", "-E", "main"]);
        assert!(!args.iter().any(|a| a.starts_with("-fspv-target-env")));
        assert_eq!(&args[args.len() - 3..], &["bloom/bloom.frag", "-Fo", "bloom/bloom.frag.spv"]);

        let task = unit("meshshader/meshshader.task", Some("meshshader"), &[ShaderStage::Amplification]);
        let target = output_target(&task.source, ShaderStage::Amplification, 1, ShaderLanguage::Hlsl);
        let args = args_of(&hlsl.invocation(&task, ShaderStage::Amplification, &target));
        assert_eq!(args[2], "as_6_6");
        assert!(args.contains(&"-fspv-extension=SPV_EXT_mesh_shader".to_string()));
        assert!(args.contains(&"-fspv-target-env=vulkan1.2".to_string()));

        let hit = unit("raytracingbasic/closesthit.rchit", None, &[ShaderStage::RayClosestHit]);
        let target = output_target(&hit.source, ShaderStage::RayClosestHit, 1, ShaderLanguage::Hlsl);
        let args = args_of(&hlsl.invocation(&hit, ShaderStage::RayClosestHit, &target));
        assert_eq!(args[2], "lib_6_3");
        assert!(args.contains(&"-fspv-target-env=vulkan1.2".to_string()));
    }

    #[test]
    fn dxc_debugprintf_sample_gets_non_semantic_info() {
        let hlsl = compiler(ShaderLanguage::Hlsl, true);
        let unit = unit("debugprintf/toon.frag", Some("debugprintf"), &[ShaderStage::Fragment]);
        let target = output_target(&unit.source, ShaderStage::Fragment, 1, ShaderLanguage::Hlsl);
        let args = args_of(&hlsl.invocation(&unit, ShaderStage::Fragment, &target));
        assert!(args.contains(&"-fspv-extension=SPV_KHR_non_semantic_info".to_string()));
        assert!(args.contains(&"-Zi".to_string()));
    }

    #[test]
    fn slangc_passes_entry_and_stage() {
        let slang = compiler(ShaderLanguage::Slang, false);
        let unit = unit("triangle/shader.slang", Some("triangle"), &[ShaderStage::Vertex, ShaderStage::Fragment]);
        let target = output_target(&unit.source, ShaderStage::Fragment, 2, ShaderLanguage::Slang);
        let args = args_of(&slang.invocation(&unit, ShaderStage::Fragment, &target));
        assert_eq!(
            args,
            vec![
                "triangle/shader.slang",
                "-profile",
                "spirv_1_4",
                "-matrix-layout-column-major",
                "-target",
                "spirv",
                "-o",
                "triangle/shader.frag.spv",
                "-entry",
                "fragmentMain",
                "-stage",
                "fragment",
            ]
        );
    }

    #[test]
    fn extra_args_are_forwarded() {
        let mut glsl = compiler(ShaderLanguage::Glsl, false);
        glsl.options.extra_args = vec!["-DUSE_FOG=1".to_string()];
        let unit = unit("fog/fog.frag", None, &[ShaderStage::Fragment]);
        let target = output_target(&unit.source, ShaderStage::Fragment, 1, ShaderLanguage::Glsl);
        let args = args_of(&glsl.invocation(&unit, ShaderStage::Fragment, &target));
        assert_eq!(args[1], "-DUSE_FOG=1");
    }

    #[test]
    fn start_failure_becomes_failed_result() {
        struct Unstartable;
        impl Executor for Unstartable {
            fn execute(&mut self, _: &Invocation) -> io::Result<ExecOutcome> {
                Err(io::Error::new(io::ErrorKind::NotFound, "gone"))
            }
        }

        let glsl = compiler(ShaderLanguage::Glsl, false);
        let unit = unit("a.comp", None, &[ShaderStage::Compute]);
        let result = glsl.compile_stage(&mut Unstartable, &unit, ShaderStage::Compute);
        assert!(!result.succeeded);
        assert_eq!(result.exit_code, None);
        assert!(result.diagnostics.contains("gone"));
        assert_eq!(result.output, PathBuf::from("a.comp.spv"));
    }

    #[test]
    fn missing_compiler_is_tool_not_found() {
        let empty = std::env::temp_dir().join("compileshaders-no-such-dir");
        let err = find_compiler_in("slangc", None, Some(empty.clone().into_os_string()), None).unwrap_err();
        assert!(matches!(err, ShaderToolError::ToolNotFound { ref name } if name == "slangc"));

        let err = find_compiler_in("dxc", Some(empty.join("dxc").as_path()), None, None).unwrap_err();
        assert!(matches!(err, ShaderToolError::ToolNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn finds_executables_on_search_path_and_sdk() {
        use std::os::unix::fs::PermissionsExt;

        let root = std::env::temp_dir().join(format!("compileshaders-find-{}", std::process::id()));
        let bin = root.join("bin");
        let sdk_bin = root.join("sdk").join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::create_dir_all(&sdk_bin).unwrap();

        let glslang = bin.join("glslangValidator");
        std::fs::write(&glslang, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&glslang, std::fs::Permissions::from_mode(0o755)).unwrap();

        let not_executable = bin.join("dxc");
        std::fs::write(&not_executable, "").unwrap();
        std::fs::set_permissions(&not_executable, std::fs::Permissions::from_mode(0o644)).unwrap();

        let slangc = sdk_bin.join("slangc");
        std::fs::write(&slangc, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&slangc, std::fs::Permissions::from_mode(0o755)).unwrap();

        let path = env::join_paths([root.join("missing"), bin.clone()]).unwrap();
        let sdk = Some(root.join("sdk").into_os_string());

        assert_eq!(find_compiler_in("glslangValidator", None, Some(path.clone()), None).unwrap(), glslang);
        assert!(find_compiler_in("dxc", None, Some(path.clone()), None).is_err());
        assert_eq!(find_compiler_in("slangc", None, Some(path.clone()), sdk).unwrap(), slangc);

        // An unusable explicit path falls back to the search
        assert_eq!(
            find_compiler_in("glslangValidator", Some(not_executable.as_path()), Some(path), None).unwrap(),
            glslang
        );
        assert_eq!(find_compiler_in("whatever", Some(slangc.as_path()), None, None).unwrap(), slangc);

        std::fs::remove_dir_all(&root).unwrap();
    }
}
