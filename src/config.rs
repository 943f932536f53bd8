use crate::raster::Backdrop;
use crate::scene::{Color, PALETTE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Smallest accepted grid spacing, in display pixels
const MIN_GRID_SPACING: f64 = 1.0;

/// Tunable parameters of the scene. The defaults reproduce the reference look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Number of particles created on mount
    pub particle_count: usize,

    /// Radius of the outermost ring and length of the sweep beam
    pub max_radius: f64,

    /// Number of concentric rings, evenly spaced out to `max_radius`
    pub ring_count: u32,

    /// Sweep rotation per frame, in radians
    pub sweep_speed: f64,

    /// Number of fading lines behind the sweep beam
    pub trail_length: u32,

    /// Distance between grid lines, in display pixels. At least one pixel.
    pub grid_spacing: f64,

    /// Horizontal position of the focal point as a fraction of the width
    pub focal_x: f64,

    /// Vertical position of the focal point as a fraction of the height
    pub focal_y: f64,

    /// Particle colors, assigned round-robin
    pub palette: Vec<Color>,

    /// Color the transparent scene is flattened onto when producing images
    pub background: Color,

    /// Light the background with a soft glow behind the rings
    pub glow: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            particle_count: 80,
            max_radius: 250.0,
            ring_count: 4,
            sweep_speed: 0.025,
            trail_length: 5,
            grid_spacing: 40.0,
            focal_x: 0.7,
            focal_y: 0.5,
            palette: PALETTE.to_vec(),
            background: Color::new(2, 6, 23),
            glow: true,
        }
    }
}

impl SceneConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config = Self::from_yaml(&contents)?;
        tracing::info!(path = %path.display(), "loaded scene configuration");
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        // An empty document means "all defaults".
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// The configuration file looked up when none is given explicitly
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "radarscene").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// What rendered frames are flattened onto
    pub fn backdrop(&self) -> Backdrop {
        if self.glow { Backdrop::glowing(self.background) } else { Backdrop::solid(self.background) }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::Invalid("particle_count must be greater than zero".into()));
        }
        if self.ring_count == 0 {
            return Err(ConfigError::Invalid("ring_count must be greater than zero".into()));
        }
        if !(self.max_radius.is_finite() && self.max_radius > 0.0) {
            return Err(ConfigError::Invalid(format!("max_radius must be positive, got {}", self.max_radius)));
        }
        if !(self.grid_spacing.is_finite() && self.grid_spacing >= MIN_GRID_SPACING) {
            return Err(ConfigError::Invalid(format!(
                "grid_spacing must be at least {MIN_GRID_SPACING}, got {}",
                self.grid_spacing
            )));
        }
        if !self.sweep_speed.is_finite() {
            return Err(ConfigError::Invalid("sweep_speed must be finite".into()));
        }
        for (name, value) in [("focal_x", self.focal_x), ("focal_y", self.focal_y)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        if self.palette.is_empty() {
            return Err(ConfigError::Invalid("palette must contain at least one color".into()));
        }
        Ok(())
    }
}

/// Errors that can occur when loading a configuration
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("reading {0}: {1}")]
    Io(PathBuf, io::Error),

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
