// Post-compile renames
//
// Some samples load SPIR-V files by names that only make sense for the
// one-entry-point languages (`raygen.rgen.spv`, `base.vert.spv`, ...). After
// a Slang module has been split per stage, the outputs are moved to those
// names. Renames are not idempotent: a second pass fails because the old
// names are gone.

use crate::error::{ShaderToolError, ToolResult};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// (old name, new name) pairs, relative to the sample directory
pub type RenamePairs = Vec<(String, String)>;

/// Ray tracing samples share the same four canonical names
const RAY_TRACING_BASE: [(&str, &str); 3] = [
    ("rchit", "closesthit.rchit.spv"),
    ("rmiss", "miss.rmiss.spv"),
    ("rgen", "raygen.rgen.spv"),
];

/// Built-in renames for a sample, empty for samples that need none
pub fn builtin_renames(sample: &str) -> RenamePairs {
    let fixed: &[(&str, &str)] = match sample {
        "displacement" => &[
            ("displacement.vert.spv", "base.vert.spv"),
            ("displacement.frag.spv", "base.frag.spv"),
        ],
        "geometryshader" => &[
            ("normaldebug.vert.spv", "base.vert.spv"),
            ("normaldebug.frag.spv", "base.frag.spv"),
        ],
        "graphicspipelinelibrary" => &[("uber.vert.spv", "shared.vert.spv")],
        "viewportarray" => &[("scene.geom.spv", "multiview.geom.spv")],
        "raytracingbasic"
        | "raytracingcallable"
        | "raytracingpositionfetch"
        | "raytracingreflections"
        | "raytracingsbtdata"
        | "raytracingshadows" => return ray_tracing_renames(sample, &[]),
        "raytracinggltf" | "raytracingtextures" => {
            return ray_tracing_renames(sample, &[("rahit", "anyhit.rahit.spv")])
        }
        "raytracingintersection" => {
            return ray_tracing_renames(sample, &[("rint", "intersection.rint.spv")])
        }
        _ => &[],
    };

    fixed
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

/// `<sample>.<ext>.spv` -> canonical name for every ray tracing stage
fn ray_tracing_renames(sample: &str, extra: &[(&str, &str)]) -> RenamePairs {
    RAY_TRACING_BASE
        .iter()
        .chain(extra.iter())
        .map(|(ext, to)| (format!("{}.{}.spv", sample, ext), to.to_string()))
        .collect()
}

/// Built-in table plus renames added in the config file
#[derive(Debug, Clone, Default)]
pub struct RenameTable {
    extra: HashMap<String, BTreeMap<String, String>>,
}

impl RenameTable {
    pub fn new(extra: HashMap<String, BTreeMap<String, String>>) -> Self {
        Self { extra }
    }

    /// Renames for `sample`. A config entry with the same old name replaces
    /// the built-in target.
    pub fn renames_for(&self, sample: &str) -> RenamePairs {
        let mut pairs = builtin_renames(sample);
        if let Some(extra) = self.extra.get(sample) {
            for (from, to) in extra {
                match pairs.iter_mut().find(|(old, _)| old == from) {
                    Some(pair) => pair.1 = to.clone(),
                    None => pairs.push((from.clone(), to.clone())),
                }
            }
        }
        pairs
    }
}

/// Move every listed file inside `sample_dir`. Stops at the first failure.
pub fn apply_renames(sample_dir: &Path, renames: &[(String, String)]) -> ToolResult<usize> {
    for (from, to) in renames {
        let from = sample_dir.join(from);
        let to = sample_dir.join(to);
        std::fs::rename(&from, &to).map_err(|source| ShaderToolError::RenameSourceMissing {
            from: from.clone(),
            to: to.clone(),
            source,
        })?;
        log::info!("Renamed {} -> {}", from.display(), to.display());
    }
    Ok(renames.len())
}
