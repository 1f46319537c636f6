// Command line parsing

use crate::error::{ShaderToolError, ToolResult};
use crate::shader::ShaderLanguage;
use std::path::PathBuf;

pub const USAGE: &str = "\
Compile all shaders of a samples tree to SPIR-V

Usage: compileshaders [OPTIONS] [ROOT]

Arguments:
  [ROOT]  Directory holding one subdirectory per sample (default: config shader_root or .)

Options:
  -l, --language <LANG>       Source language: glsl, hlsl or slang
      --compiler-path <PATH>  Path to the compiler executable
      --glslang <PATH>        Path to glslangValidator (implies --language glsl)
      --dxc <PATH>            Path to dxc (implies --language hlsl)
      --slangc <PATH>         Path to slangc (implies --language slang)
      --sample <NAME>         Compile shaders for a single sample only
  -g, --debug-symbols         Compile with debug symbols
      --fail-fast             Stop at the first shader that fails to compile
      --keep-going            Compile everything and report the failure count
  -c, --config <PATH>         Config file (default: compileshaders.toml)
  -v, --verbose               Print every compiler command line
  -h, --help                  Print this help";

/// Parsed command line. `None` fields fall back to the config file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub language: Option<ShaderLanguage>,
    /// Language implied by --glslang / --dxc / --slangc
    pub implied_language: Option<ShaderLanguage>,
    pub compiler_path: Option<PathBuf>,
    pub sample: Option<String>,
    pub debug_symbols: bool,
    pub fail_fast: Option<bool>,
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub root: Option<PathBuf>,
    pub help: bool,
}

impl CliArgs {
    /// Language chosen on the command line, if any
    pub fn requested_language(&self) -> Option<ShaderLanguage> {
        self.language.or(self.implied_language)
    }
}

/// Parse arguments, without the program name
pub fn parse_args<I>(args: I) -> ToolResult<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        // Accept both `--flag value` and `--flag=value`
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        // Switches take no value, so `--fail-fast=false` is a usage error
        let is_switch = matches!(
            flag.as_str(),
            "--g" | "--debug-symbols" | "--fail-fast" | "--keep-going" | "--verbose" | "--help"
        );
        if inline.is_some() && is_switch {
            return Err(ShaderToolError::Usage(format!("{} does not take a value", flag)));
        }
        let mut value = |name: &str| -> ToolResult<String> {
            inline
                .clone()
                .or_else(|| args.next())
                .ok_or_else(|| ShaderToolError::Usage(format!("{} requires a value", name)))
        };

        match flag.as_str() {
            "-l" | "--language" => {
                let lang = value(flag.as_str())?;
                parsed.language = Some(lang.parse::<ShaderLanguage>().map_err(ShaderToolError::Usage)?);
            }
            "--compiler-path" => parsed.compiler_path = Some(PathBuf::from(value(flag.as_str())?)),
            "--glslang" | "--dxc" | "--slangc" => {
                parsed.compiler_path = Some(PathBuf::from(value(flag.as_str())?));
                parsed.implied_language = Some(match flag.as_str() {
                    "--glslang" => ShaderLanguage::Glsl,
                    "--dxc" => ShaderLanguage::Hlsl,
                    _ => ShaderLanguage::Slang,
                });
            }
            "--sample" => parsed.sample = Some(value(flag.as_str())?),
            "-g" | "--g" | "--debug-symbols" => parsed.debug_symbols = true,
            "--fail-fast" => parsed.fail_fast = Some(true),
            "--keep-going" => parsed.fail_fast = Some(false),
            "-c" | "--config" => parsed.config = Some(PathBuf::from(value(flag.as_str())?)),
            "-v" | "--verbose" => parsed.verbose = true,
            "-h" | "--help" => parsed.help = true,
            other if other.starts_with('-') => {
                return Err(ShaderToolError::Usage(format!("unknown option '{}'\n\n{}", other, USAGE)));
            }
            _ => {
                if parsed.root.is_some() {
                    return Err(ShaderToolError::Usage(format!("unexpected argument '{}'", arg)));
                }
                parsed.root = Some(PathBuf::from(arg));
            }
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ToolResult<CliArgs> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_arguments() {
        assert_eq!(parse(&[]).unwrap(), CliArgs::default());
    }

    #[test]
    fn all_options() {
        let args = parse(&[
            "--language", "slang",
            "--compiler-path=/opt/slang/bin/slangc",
            "--sample", "triangle",
            "-g",
            "--fail-fast",
            "-c", "ci.toml",
            "-v",
            "shaders/slang",
        ])
        .unwrap();

        assert_eq!(args.language, Some(ShaderLanguage::Slang));
        assert_eq!(args.compiler_path, Some(PathBuf::from("/opt/slang/bin/slangc")));
        assert_eq!(args.sample.as_deref(), Some("triangle"));
        assert!(args.debug_symbols);
        assert_eq!(args.fail_fast, Some(true));
        assert_eq!(args.config, Some(PathBuf::from("ci.toml")));
        assert!(args.verbose);
        assert_eq!(args.root, Some(PathBuf::from("shaders/slang")));
    }

    #[test]
    fn compiler_flags_imply_language() {
        let args = parse(&["--dxc", "/usr/bin/dxc"]).unwrap();
        assert_eq!(args.requested_language(), Some(ShaderLanguage::Hlsl));
        assert_eq!(args.compiler_path, Some(PathBuf::from("/usr/bin/dxc")));

        let args = parse(&["--glslang", "glslangValidator", "--language", "slang"]).unwrap();
        assert_eq!(args.requested_language(), Some(ShaderLanguage::Slang));
    }

    #[test]
    fn bad_usage() {
        assert!(matches!(parse(&["--sample"]), Err(ShaderToolError::Usage(_))));
        assert!(matches!(parse(&["--language", "wgsl"]), Err(ShaderToolError::Usage(_))));
        assert!(matches!(parse(&["--frobnicate"]), Err(ShaderToolError::Usage(_))));
        assert!(matches!(parse(&["a", "b"]), Err(ShaderToolError::Usage(_))));
    }

    #[test]
    fn switches_reject_inline_values() {
        for arg in ["--fail-fast=false", "--keep-going=1", "--debug-symbols=no", "--verbose=yes", "--help=x"] {
            assert!(matches!(parse(&[arg]), Err(ShaderToolError::Usage(_))), "{}", arg);
        }
        assert_eq!(parse(&["--sample=bloom"]).unwrap().sample.as_deref(), Some("bloom"));
    }
}
