//! Placement engine configuration
//!
//! Handles loading tunable parameters from TOML:
//! - Damping constants for drag gestures
//! - Freeform placement distance
//! - Default surface visibility
//! - Opacities the renderer mirrors for helpers and highlights

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;
use crate::transform::Damping;

/// Pixel-delta divisors for drag gestures
///
/// Larger values make the same drag produce a smaller change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DampingConfig {
    /// Move while dragging a freshly placed object in plane mode
    pub move_creation: f32,
    /// Move of the highlighted object in transform mode
    pub move_transform: f32,
    /// Rotation in radians per damped pixel
    pub rotate: f32,
    /// Scale increment per damped pixel
    pub scale: f32,
}

impl Default for DampingConfig {
    fn default() -> Self {
        Self {
            move_creation: 200.0,
            move_transform: 200.0,
            rotate: 50.0,
            scale: 50.0,
        }
    }
}

impl DampingConfig {
    pub fn move_creation(&self) -> Result<Damping> {
        Damping::new("move_creation", self.move_creation)
    }

    pub fn move_transform(&self) -> Result<Damping> {
        Damping::new("move_transform", self.move_transform)
    }

    pub fn rotate(&self) -> Result<Damping> {
        Damping::new("rotate", self.rotate)
    }

    pub fn scale(&self) -> Result<Damping> {
        Damping::new("scale", self.scale)
    }
}

/// Engine configuration, typically read from `placement.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub damping: DampingConfig,
    /// Distance in metres in front of the camera for freeform placement
    pub forward_offset: f32,
    /// Surface visibility applied at session start and on reset
    pub planes_hidden_by_default: bool,
    pub surface_opacity: f32,
    pub image_cover_opacity: f32,
    /// Opacity of the highlighted object; others render at 1.0
    pub highlight_opacity: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            damping: DampingConfig::default(),
            forward_offset: 0.5,
            planes_hidden_by_default: true,
            surface_opacity: 0.25,
            image_cover_opacity: 0.01,
            highlight_opacity: 0.8,
        }
    }
}

impl PlacementConfig {
    /// Default config file location
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("anchorstage").join("placement.toml"))
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        debug!("Loaded placement config from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Load from the default location, or return defaults if absent or invalid
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_path(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Check every damping constant
    pub fn validate(&self) -> Result<()> {
        self.damping.move_creation()?;
        self.damping.move_transform()?;
        self.damping.rotate()?;
        self.damping.scale()?;
        Ok(())
    }

    /// Render opacity for an object given its highlight state
    pub fn object_opacity(&self, highlighted: bool) -> f32 {
        if highlighted {
            self.highlight_opacity
        } else {
            1.0
        }
    }
}
