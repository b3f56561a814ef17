//! TOML configuration deserialisation for simulation jobs.

use candela_core::orientation::OrientationGrid;
use serde::Deserialize;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub simulation: SimulationConfig,
    pub geometry: GeometryConfig,
    pub material: Vec<MaterialConfig>,
    #[serde(default = "default_orientation")]
    pub orientation: OrientationGrid,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_orientation() -> OrientationGrid {
    OrientationGrid::single()
}

/// Simulation parameters from TOML.
#[derive(Debug, Deserialize)]
pub struct SimulationConfig {
    /// Incident wavelength in nm.
    pub wavelength_nm: f64,
    #[serde(default = "default_env_n")]
    pub environment_n: f64,
    /// Field-evaluation backend: "direct" or "offloaded".
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Force step-by-step dispatch on the offloaded backend.
    #[serde(default)]
    pub synchronous_dispatch: bool,
}

fn default_env_n() -> f64 {
    1.0
}
fn default_backend() -> String {
    "direct".into()
}

/// Geometry configuration from TOML: one lattice primitive.
#[derive(Debug, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum GeometryConfig {
    Sphere {
        radius_nm: f64,
        spacing_nm: f64,
        /// Index into the material table.
        #[serde(default)]
        material: u8,
    },
    Cuboid {
        /// Lattice sites per axis.
        extent: [u32; 3],
        spacing_nm: f64,
        #[serde(default)]
        material: u8,
    },
}

/// A single material: complex dielectric function at the run wavelength.
#[derive(Debug, Deserialize)]
pub struct MaterialConfig {
    pub name: String,
    /// (re, im) of the dielectric function.
    pub epsilon: [f64; 2],
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Whether to save per-run datasets as an NPZ archive (default: true).
    #[serde(default = "default_true")]
    pub save_datasets: bool,
    /// Number of far-field sample directions stored per orientation.
    #[serde(default = "default_far_field_samples")]
    pub far_field_samples: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            save_datasets: true,
            far_field_samples: default_far_field_samples(),
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}
fn default_true() -> bool {
    true
}
fn default_far_field_samples() -> usize {
    16
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: JobConfig = toml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &JobConfig) -> anyhow::Result<()> {
    anyhow::ensure!(
        config.simulation.wavelength_nm > 0.0,
        "wavelength must be positive"
    );
    anyhow::ensure!(
        config.simulation.backend == "direct" || config.simulation.backend == "offloaded",
        "unknown backend {:?} (expected \"direct\" or \"offloaded\")",
        config.simulation.backend
    );
    anyhow::ensure!(!config.material.is_empty(), "no materials defined");
    let material = match &config.geometry {
        GeometryConfig::Sphere { material, .. } => *material,
        GeometryConfig::Cuboid { material, .. } => *material,
    };
    anyhow::ensure!(
        (material as usize) < config.material.len(),
        "geometry references material {material}, table has {} entries",
        config.material.len()
    );
    for m in &config.material {
        anyhow::ensure!(
            m.epsilon != [0.0, 0.0],
            "material {:?} has zero dielectric function",
            m.name
        );
    }
    Ok(())
}
