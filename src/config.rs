// =============================================================================
// CONFIGURATION - Load settings from compileshaders.toml
// =============================================================================
//
// This module handles loading and parsing configuration from
// compileshaders.toml. Every section is optional; missing values fall back
// to defaults and command line flags override whatever is loaded here.

use crate::shader::ShaderLanguage;
use anyhow::{Context, Result};
use log::LevelFilter;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when --config is not given
pub const DEFAULT_CONFIG_FILE: &str = "compileshaders.toml";

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub compiler: CompilerConfig,
    pub build: BuildConfig,
    pub log: LogConfig,
    /// Extra post-compile renames: sample name -> (old name -> new name)
    pub renames: HashMap<String, BTreeMap<String, String>>,
}

/// Compiler selection and per-compiler settings
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CompilerConfig {
    pub language: ShaderLanguage,
    pub glslang: Option<PathBuf>,
    pub dxc: Option<PathBuf>,
    pub slangc: Option<PathBuf>,
    pub glslang_args: Vec<String>,
    pub dxc_args: Vec<String>,
    pub slangc_args: Vec<String>,
}

/// Build behavior
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory holding one subdirectory per sample
    pub shader_root: PathBuf,
    /// Stop at the first failing shader instead of counting failures
    pub fail_fast: bool,
    pub debug_symbols: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            shader_root: PathBuf::from("."),
            fail_fast: false,
            debug_symbols: false,
        }
    }
}

/// Logging settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CompilerConfig {
    /// Configured compiler path for a language
    pub fn path_for(&self, language: ShaderLanguage) -> Option<&Path> {
        match language {
            ShaderLanguage::Glsl => self.glslang.as_deref(),
            ShaderLanguage::Hlsl => self.dxc.as_deref(),
            ShaderLanguage::Slang => self.slangc.as_deref(),
        }
    }

    pub fn extra_args_for(&self, language: ShaderLanguage) -> &[String] {
        match language {
            ShaderLanguage::Glsl => &self.glslang_args,
            ShaderLanguage::Hlsl => &self.dxc_args,
            ShaderLanguage::Slang => &self.slangc_args,
        }
    }
}

impl Config {
    /// Load configuration from a specific path. A missing file yields the
    /// defaults; an unreadable or malformed one is an error.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::parse(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Log level as a filter, `None` for an unknown name
    pub fn get_log_level(&self) -> Option<LevelFilter> {
        match self.log.level.to_lowercase().as_str() {
            "off" => Some(LevelFilter::Off),
            "error" => Some(LevelFilter::Error),
            "warn" => Some(LevelFilter::Warn),
            "info" => Some(LevelFilter::Info),
            "debug" => Some(LevelFilter::Debug),
            "trace" => Some(LevelFilter::Trace),
            _ => None,
        }
    }
}
