// Shading languages and the compiler each one is built with

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderLanguage {
    /// One stage per file, compiled with glslangValidator
    #[default]
    Glsl,
    /// One stage per file, compiled with DXC
    Hlsl,
    /// Several entry points per file, compiled with slangc
    Slang,
}

/// Source suffix of multi-stage Slang modules
pub const SLANG_EXTENSION: &str = "slang";

impl ShaderLanguage {
    /// Compiler executable name without the platform suffix
    pub fn compiler_name(self) -> &'static str {
        match self {
            ShaderLanguage::Glsl => "glslangValidator",
            ShaderLanguage::Hlsl => "dxc",
            ShaderLanguage::Slang => "slangc",
        }
    }

    /// Whether stages are declared by markers inside the file rather than
    /// by its extension
    pub fn is_multi_stage(self) -> bool {
        self == ShaderLanguage::Slang
    }
}

impl fmt::Display for ShaderLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderLanguage::Glsl => "glsl",
            ShaderLanguage::Hlsl => "hlsl",
            ShaderLanguage::Slang => "slang",
        })
    }
}

impl FromStr for ShaderLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "glsl" => Ok(ShaderLanguage::Glsl),
            "hlsl" => Ok(ShaderLanguage::Hlsl),
            "slang" => Ok(ShaderLanguage::Slang),
            other => Err(format!("unknown shader language '{}' (expected glsl, hlsl or slang)", other)),
        }
    }
}
