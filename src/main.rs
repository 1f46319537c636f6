// =============================================================================
// COMPILESHADERS - Batch SPIR-V compilation for the Vulkan samples
// =============================================================================
//
// Walks a shader tree holding one directory per sample and compiles every
// GLSL, HLSL or Slang source to SPIR-V with the matching external compiler.
//
// ARCHITECTURE OVERVIEW:
// ┌─────────────────────────────────────────────────────────────────┐
// │  CLI args + compileshaders.toml                                 │
// │    └── Driver (walk, sample filter, failure mode)               │
// │          └── Stage detection + output naming                    │
// │                └── External compiler (glslang / dxc / slangc)   │
// └─────────────────────────────────────────────────────────────────┘
//
// RUN FLOW:
// 1. Parse arguments, load config, set up logging
// 2. Validate the sample filter (before anything else touches disk)
// 3. Locate the compiler executable
// 4. Compile every stage, then apply per-sample renames
//
// =============================================================================

mod cli;
mod config;
mod driver;
mod error;
mod shader;

use anyhow::{Context, Result};
use cli::CliArgs;
use config::{Config, DEFAULT_CONFIG_FILE};
use driver::{FailureMode, RunPlan};
use error::ShaderToolError;
use log::LevelFilter;
use shader::{find_compiler, CompileOptions, Compiler, ProcessExecutor, RenameTable, ShaderLanguage};
use std::path::PathBuf;

// =============================================================================
// ENTRY POINT
// =============================================================================

fn main() {
    let code = match try_main() {
        Ok(()) => 0,
        Err(err) => {
            report(&err);
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

fn try_main() -> Result<()> {
    let args = cli::parse_args(std::env::args().skip(1))?;
    if args.help {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    // Load configuration; an explicitly named file has to exist
    let config_path = match &args.config {
        Some(path) if !path.exists() => {
            anyhow::bail!("Config file not found: {:?}", path);
        }
        Some(path) => path.clone(),
        None => PathBuf::from(DEFAULT_CONFIG_FILE),
    };
    let config = Config::load_from_path(&config_path)?;

    init_logging(&config, args.verbose);
    if config_path.exists() {
        log::info!("Loaded configuration from {:?}", config_path);
    }
    log::debug!("Config: {:?}", config);

    let settings = resolve_settings(&args, &config);
    let language = settings.language;

    // ─────────────────────────────────────────────────────────────────────────
    // STEP 1: Scope. A bad --sample is fatal before the compiler is searched
    // ─────────────────────────────────────────────────────────────────────────
    let plan = RunPlan::new(
        settings.root,
        args.sample.as_deref(),
        settings.failure_mode,
        RenameTable::new(config.renames.clone()),
    )?;

    // ─────────────────────────────────────────────────────────────────────────
    // STEP 2: Compiler discovery
    // ─────────────────────────────────────────────────────────────────────────
    let executable = find_compiler(language, settings.compiler_path.as_deref())?;
    log::info!("Found {} compiler at {}", language, executable.display());

    let compiler = Compiler::new(
        language,
        executable,
        CompileOptions {
            debug_symbols: settings.debug_symbols,
            extra_args: settings.extra_args,
        },
    );

    // ─────────────────────────────────────────────────────────────────────────
    // STEP 3: Compile
    // ─────────────────────────────────────────────────────────────────────────
    let summary = driver::run(&compiler, &mut ProcessExecutor, &plan)
        .with_context(|| format!("Compiling {} shaders under {}", language, plan.scope.display()))?
        .check()?;

    log::info!(
        "Compiled {} stages ({} files skipped, {} outputs renamed)",
        summary.results.len(),
        summary.skipped,
        summary.renamed
    );
    Ok(())
}

/// Run settings after laying the command line over the config file
#[derive(Debug, PartialEq)]
struct Settings {
    language: ShaderLanguage,
    root: PathBuf,
    failure_mode: FailureMode,
    debug_symbols: bool,
    compiler_path: Option<PathBuf>,
    extra_args: Vec<String>,
}

/// Command line flags win over config values
fn resolve_settings(args: &CliArgs, config: &Config) -> Settings {
    let language = args.requested_language().unwrap_or(config.compiler.language);
    let failure_mode = if args.fail_fast.unwrap_or(config.build.fail_fast) {
        FailureMode::FailFast
    } else {
        FailureMode::Accumulate
    };
    let compiler_path = args
        .compiler_path
        .clone()
        .or_else(|| config.compiler.path_for(language).map(PathBuf::from));

    Settings {
        language,
        root: args.root.clone().unwrap_or_else(|| config.build.shader_root.clone()),
        failure_mode,
        debug_symbols: args.debug_symbols || config.build.debug_symbols,
        compiler_path,
        extra_args: config.compiler.extra_args_for(language).to_vec(),
    }
}

/// Initialize logging; `RUST_LOG` can still refine the level per module
fn init_logging(config: &Config, verbose: bool) {
    use env_logger::Builder;

    let configured = config.get_log_level();
    let level = if verbose {
        LevelFilter::Debug
    } else {
        configured.unwrap_or(LevelFilter::Info)
    };

    let mut builder = Builder::from_default_env();
    builder.filter_level(level);
    builder.format_timestamp(None);
    builder.init();

    if configured.is_none() {
        log::warn!("Unknown log level '{}', defaulting to info", config.log.level);
    }
}

/// Print a fatal error through the logger if it is up, stderr otherwise
fn report(err: &anyhow::Error) {
    if log::log_enabled!(log::Level::Error) {
        log::error!("{:#}", err);
    } else {
        eprintln!("error: {:#}", err);
    }
}

/// Exit code for a failed run: the tool's own error kinds decide, anything
/// else (config, usage plumbing) is 1
fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ShaderToolError>())
        .map_or(1, ShaderToolError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_follows_tool_error_through_context() {
        let err = anyhow::Error::new(ShaderToolError::InvalidSampleDirectory {
            name: "foo".into(),
            root: PathBuf::from("."),
        });
        assert_eq!(exit_code_for(&err), -1);

        let err = anyhow::Error::new(ShaderToolError::CompileFailure {
            source_path: PathBuf::from("a.frag"),
            stage: "fragment".into(),
            exit_code: Some(4),
        })
        .context("Compiling glsl shaders under .");
        assert_eq!(exit_code_for(&err), 4);

        let err = anyhow::Error::new(ShaderToolError::ToolNotFound { name: "dxc".into() });
        assert_eq!(exit_code_for(&err), 1);

        assert_eq!(exit_code_for(&anyhow::anyhow!("bad config")), 1);
    }

    fn settings(args: &[&str], config: &str) -> Settings {
        let args = cli::parse_args(args.iter().map(|s| s.to_string())).unwrap();
        resolve_settings(&args, &Config::parse(config).unwrap())
    }

    #[test]
    fn config_values_apply_without_flags() {
        let resolved = settings(
            &[],
            "[compiler]\nlanguage = \"slang\"\nslangc = \"/opt/slangc\"\nslangc_args = [\"-O2\"]\n\
             [build]\nshader_root = \"shaders/slang\"\nfail_fast = true\ndebug_symbols = true",
        );
        assert_eq!(
            resolved,
            Settings {
                language: ShaderLanguage::Slang,
                root: PathBuf::from("shaders/slang"),
                failure_mode: FailureMode::FailFast,
                debug_symbols: true,
                compiler_path: Some(PathBuf::from("/opt/slangc")),
                extra_args: vec!["-O2".to_string()],
            }
        );

        let resolved = settings(&[], "");
        assert_eq!(resolved.language, ShaderLanguage::Glsl);
        assert_eq!(resolved.failure_mode, FailureMode::Accumulate);
        assert_eq!(resolved.root, PathBuf::from("."));
        assert_eq!(resolved.compiler_path, None);
    }

    #[test]
    fn flags_override_config() {
        let resolved = settings(&["--keep-going"], "[build]\nfail_fast = true");
        assert_eq!(resolved.failure_mode, FailureMode::Accumulate);

        let resolved = settings(&["--fail-fast", "other"], "[build]\nshader_root = \"shaders\"");
        assert_eq!(resolved.failure_mode, FailureMode::FailFast);
        assert_eq!(resolved.root, PathBuf::from("other"));

        // --dxc picks HLSL and its own path over the configured language
        let resolved = settings(
            &["--dxc", "/usr/bin/dxc"],
            "[compiler]\nlanguage = \"slang\"\ndxc = \"/opt/dxc\"\ndxc_args = [\"-O3\"]",
        );
        assert_eq!(resolved.language, ShaderLanguage::Hlsl);
        assert_eq!(resolved.compiler_path, Some(PathBuf::from("/usr/bin/dxc")));
        assert_eq!(resolved.extra_args, vec!["-O3".to_string()]);

        // Without a command line path the configured one for the chosen language is used
        let resolved = settings(&["-l", "hlsl"], "[compiler]\ndxc = \"/opt/dxc\"\nglslang = \"/opt/glslang\"");
        assert_eq!(resolved.compiler_path, Some(PathBuf::from("/opt/dxc")));
    }
}
