// Shader stages and their static compile profiles
//
// Every stage maps to exactly one row of STAGE_PROFILES. The row order is
// also the order in which the marker scanner reports stages.

use std::fmt;

/// A programmable pipeline stage that needs its own SPIR-V module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
    Geometry,
    TessellationControl,
    TessellationEvaluation,
    RayGeneration,
    RayMiss,
    RayClosestHit,
    RayAnyHit,
    RayIntersection,
    RayCallable,
    Mesh,
    Amplification,
}

/// Fixed per-stage compile data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageProfile {
    pub stage: ShaderStage,
    /// Output/source file extension without the dot (`vert`, `rchit`, ...)
    pub extension: &'static str,
    /// DXC target profile (`-T`)
    pub hlsl_profile: &'static str,
    /// Stage name as written in Slang `[shader("...")]` and passed to `-stage`
    pub slang_name: &'static str,
}

/// Entry symbol used when a file holds a single stage
pub const DEFAULT_ENTRY_POINT: &str = "main";

pub const STAGE_COUNT: usize = 14;

pub static STAGE_PROFILES: [StageProfile; STAGE_COUNT] = [
    StageProfile { stage: ShaderStage::Vertex, extension: "vert", hlsl_profile: "vs_6_1", slang_name: "vertex" },
    StageProfile { stage: ShaderStage::Fragment, extension: "frag", hlsl_profile: "ps_6_4", slang_name: "fragment" },
    StageProfile { stage: ShaderStage::Compute, extension: "comp", hlsl_profile: "cs_6_1", slang_name: "compute" },
    StageProfile { stage: ShaderStage::Geometry, extension: "geom", hlsl_profile: "gs_6_1", slang_name: "geometry" },
    StageProfile { stage: ShaderStage::TessellationControl, extension: "tesc", hlsl_profile: "hs_6_1", slang_name: "hull" },
    StageProfile { stage: ShaderStage::TessellationEvaluation, extension: "tese", hlsl_profile: "ds_6_1", slang_name: "domain" },
    StageProfile { stage: ShaderStage::RayGeneration, extension: "rgen", hlsl_profile: "lib_6_3", slang_name: "raygeneration" },
    StageProfile { stage: ShaderStage::RayMiss, extension: "rmiss", hlsl_profile: "lib_6_3", slang_name: "miss" },
    StageProfile { stage: ShaderStage::RayClosestHit, extension: "rchit", hlsl_profile: "lib_6_3", slang_name: "closesthit" },
    StageProfile { stage: ShaderStage::RayAnyHit, extension: "rahit", hlsl_profile: "lib_6_3", slang_name: "anyhit" },
    StageProfile { stage: ShaderStage::RayIntersection, extension: "rint", hlsl_profile: "lib_6_3", slang_name: "intersection" },
    StageProfile { stage: ShaderStage::RayCallable, extension: "rcall", hlsl_profile: "lib_6_3", slang_name: "callable" },
    StageProfile { stage: ShaderStage::Mesh, extension: "mesh", hlsl_profile: "ms_6_6", slang_name: "mesh" },
    StageProfile { stage: ShaderStage::Amplification, extension: "task", hlsl_profile: "as_6_6", slang_name: "amplification" },
];

impl ShaderStage {
    /// All stages in table order
    pub fn all() -> impl Iterator<Item = ShaderStage> {
        STAGE_PROFILES.iter().map(|p| p.stage)
    }

    pub fn profile(self) -> &'static StageProfile {
        // The table holds one row per variant, in declaration order
        &STAGE_PROFILES[self as usize]
    }

    /// Stage for a source file extension (without the dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        STAGE_PROFILES
            .iter()
            .find(|p| p.extension == ext)
            .map(|p| p.stage)
    }

    /// Stage for a Slang `[shader("...")]` name. `pixel` is accepted as an
    /// alias of `fragment`.
    pub fn from_slang_name(name: &str) -> Option<Self> {
        if name == "pixel" {
            return Some(ShaderStage::Fragment);
        }
        STAGE_PROFILES
            .iter()
            .find(|p| p.slang_name == name)
            .map(|p| p.stage)
    }

    pub fn extension(self) -> &'static str {
        self.profile().extension
    }

    pub fn hlsl_profile(self) -> &'static str {
        self.profile().hlsl_profile
    }

    pub fn slang_name(self) -> &'static str {
        self.profile().slang_name
    }

    pub fn is_ray_tracing(self) -> bool {
        matches!(
            self,
            ShaderStage::RayGeneration
                | ShaderStage::RayMiss
                | ShaderStage::RayClosestHit
                | ShaderStage::RayAnyHit
                | ShaderStage::RayIntersection
                | ShaderStage::RayCallable
        )
    }

    pub fn is_mesh_pipeline(self) -> bool {
        matches!(self, ShaderStage::Mesh | ShaderStage::Amplification)
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slang_name())
    }
}
