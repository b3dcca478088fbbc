//! cue.toml: settings for every operation, all optional
//!
//! Every field defaults to the value the hand-run tools used, so an empty file
//! (or no file at all) reproduces their output.

use crate::contract::{OUTSIDE_MATERIAL, is_customizable_material};
use crate::geometry::{Axis, MIN_SEGMENTS};
use crate::section::{DecorativeRing, MaterialSpec, Preset, Section, parse_hex_color};
use crate::smooth::ModifierKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid color {0:?} (expected #RRGGBB)")]
    InvalidColor(String),

    #[error("unknown preset {0:?} (expected simplified, full or butt)")]
    UnknownPreset(String),

    #[error("{0}: at least 3 radial segments are required, got {1}")]
    TooFewSegments(String, u32),

    #[error("{0}: {1} must be positive, got {2}")]
    NotPositive(String, &'static str, f32),

    #[error("duplicate section name {0:?}")]
    DuplicateSection(String),

    #[error("section {0:?} is customizable but material {1:?} does not contain \"outside\" or \"body\"")]
    NotCustomizable(String, String),

    #[error("ring {0:?} follows unknown section {1:?}")]
    UnknownSection(String, String),

    #[error("layer height_end {end} is below height_start {start}")]
    InvertedLayer { start: f32, end: f32 },

    #[error("cue has no sections")]
    Empty,
}

/// Root of cue.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub cue: CueConfig,
    #[serde(default)]
    pub layer: LayerConfig,
    #[serde(default)]
    pub smooth: SmoothConfig,
    #[serde(default)]
    pub inspect: InspectConfig,
}

/// Procedural cue generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueConfig {
    #[serde(default)]
    pub preset: Preset,
    /// Model units per millimetre
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Centre the Y bounds on the origin; unset means the preset decides
    #[serde(default)]
    pub center_at_origin: Option<bool>,
    /// Unset means the preset decides
    #[serde(default)]
    pub mesh_name: Option<String>,
    /// Replaces the preset's sections when non-empty
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Replaces the preset's rings when set
    #[serde(default)]
    pub rings: Option<Vec<DecorativeRing>>,
}

fn default_scale() -> f32 {
    0.001
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            preset: Preset::default(),
            scale: default_scale(),
            center_at_origin: None,
            mesh_name: None,
            sections: Vec::new(),
            rings: None,
        }
    }
}

impl CueConfig {
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            preset,
            ..Default::default()
        }
    }

    pub fn resolved_sections(&self) -> Vec<Section> {
        if self.sections.is_empty() {
            self.preset.sections()
        } else {
            self.sections.clone()
        }
    }

    /// Explicit sections come without the preset's rings unless rings are given too
    pub fn resolved_rings(&self) -> Vec<DecorativeRing> {
        match &self.rings {
            Some(rings) => rings.clone(),
            None if self.sections.is_empty() => self.preset.rings(),
            None => Vec::new(),
        }
    }

    pub fn centered(&self) -> bool {
        self.center_at_origin.unwrap_or(self.preset.centered())
    }

    pub fn mesh_name(&self) -> &str {
        self.mesh_name
            .as_deref()
            .unwrap_or(self.preset.mesh_name())
    }

    /// Height of the butt end in mm when not centred; explicit sections start at 0
    pub fn butt_end_mm(&self) -> f32 {
        if self.sections.is_empty() {
            self.preset.butt_end_mm()
        } else {
            0.0
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("cue", "scale", self.scale)?;

        let sections = self.resolved_sections();
        if sections.is_empty() {
            return Err(ConfigError::Empty);
        }

        let mut names = HashSet::new();
        for section in &sections {
            if !names.insert(section.name.as_str()) {
                return Err(ConfigError::DuplicateSection(section.name.clone()));
            }
            check_segments(&section.name, section.segments)?;
            check_positive(&section.name, "length_mm", section.length_mm)?;
            check_positive(&section.name, "diameter_start_mm", section.diameter_start_mm)?;
            check_positive(&section.name, "diameter_end_mm", section.diameter_end_mm)?;
            parse_hex_color(&section.material.color)?;

            let matches_contract = is_customizable_material(&section.material.name);
            if section.customizable && !matches_contract {
                return Err(ConfigError::NotCustomizable(
                    section.name.clone(),
                    section.material.name.clone(),
                ));
            }
            if !section.customizable && matches_contract {
                warn!(
                    "Section '{}' is not customizable but material '{}' will be picked up by the customizer",
                    section.name, section.material.name
                );
            }
        }

        for ring in self.resolved_rings() {
            if !names.contains(ring.after_section.as_str()) {
                return Err(ConfigError::UnknownSection(ring.name, ring.after_section));
            }
            check_segments(&ring.name, ring.segments)?;
            check_positive(&ring.name, "length_mm", ring.length_mm)?;
            check_positive(&ring.name, "diameter_mm", ring.diameter_mm)?;
            parse_hex_color(&ring.material.color)?;
        }

        Ok(())
    }
}

/// Customizable layer appended to an existing GLB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    #[serde(default = "default_layer_segments")]
    pub segments: u32,
    #[serde(default = "default_layer_radius")]
    pub radius: f32,
    #[serde(default)]
    pub height_start: f32,
    #[serde(default = "default_layer_height_end")]
    pub height_end: f32,
    #[serde(default = "default_layer_mesh_name")]
    pub mesh_name: String,
    #[serde(default = "default_layer_node_name")]
    pub node_name: String,
    #[serde(default = "default_layer_material")]
    pub material: MaterialSpec,
}

fn default_layer_segments() -> u32 {
    32
}

fn default_layer_radius() -> f32 {
    2.15
}

fn default_layer_height_end() -> f32 {
    0.365
}

fn default_layer_mesh_name() -> String {
    "CustomizableLayer".to_string()
}

fn default_layer_node_name() -> String {
    "CustomizableLayerNode".to_string()
}

fn default_layer_material() -> MaterialSpec {
    MaterialSpec::new(OUTSIDE_MATERIAL, "#FFFFFF", 0.0, 0.5)
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            segments: default_layer_segments(),
            radius: default_layer_radius(),
            height_start: 0.0,
            height_end: default_layer_height_end(),
            mesh_name: default_layer_mesh_name(),
            node_name: default_layer_node_name(),
            material: default_layer_material(),
        }
    }
}

impl LayerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_segments(&self.mesh_name, self.segments)?;
        check_positive(&self.mesh_name, "radius", self.radius)?;
        if self.height_end < self.height_start {
            return Err(ConfigError::InvertedLayer {
                start: self.height_start,
                end: self.height_end,
            });
        }
        parse_hex_color(&self.material.color)?;
        if !is_customizable_material(&self.material.name) {
            return Err(ConfigError::NotCustomizable(
                self.mesh_name.clone(),
                self.material.name.clone(),
            ));
        }
        Ok(())
    }
}

/// Re-shading pass over an existing GLB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothConfig {
    /// Edges whose faces meet at more than this stay sharp
    #[serde(default = "default_smooth_angle")]
    pub smooth_angle_deg: f32,
    /// Positions closer than this are treated as one vertex when averaging
    #[serde(default = "default_weld_threshold")]
    pub weld_threshold: f32,
    #[serde(default = "default_subdivision_levels")]
    pub subdivision_levels: u32,
    #[serde(default)]
    pub uv_axis: Axis,
    /// Applied in order to every primitive
    #[serde(default = "default_modifiers")]
    pub modifiers: Vec<ModifierKind>,
}

fn default_smooth_angle() -> f32 {
    60.0
}

fn default_weld_threshold() -> f32 {
    0.0001
}

fn default_subdivision_levels() -> u32 {
    1
}

fn default_modifiers() -> Vec<ModifierKind> {
    vec![ModifierKind::AutoSmooth, ModifierKind::WeightedNormals]
}

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            smooth_angle_deg: default_smooth_angle(),
            weld_threshold: default_weld_threshold(),
            subdivision_levels: default_subdivision_levels(),
            uv_axis: Axis::default(),
            modifiers: default_modifiers(),
        }
    }
}

impl SmoothConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("smooth", "smooth_angle_deg", self.smooth_angle_deg)?;
        check_positive("smooth", "weld_threshold", self.weld_threshold)?;
        Ok(())
    }
}

/// UV measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectConfig {
    /// Faces whose mean v exceeds this belong to the side rectangle
    #[serde(default = "default_rect_v_threshold")]
    pub rect_v_threshold: f32,
}

fn default_rect_v_threshold() -> f32 {
    0.45
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            rect_v_threshold: default_rect_v_threshold(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cue.validate()?;
        self.layer.validate()?;
        self.smooth.validate()?;
        Ok(())
    }
}

fn check_segments(owner: &str, segments: u32) -> Result<(), ConfigError> {
    if segments < MIN_SEGMENTS {
        return Err(ConfigError::TooFewSegments(owner.to_string(), segments));
    }
    Ok(())
}

fn check_positive(owner: &str, field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_nan() || value <= 0.0 {
        return Err(ConfigError::NotPositive(owner.to_string(), field, value));
    }
    Ok(())
}

/// Parse cue.toml content
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;
    Ok(config)
}

/// Load a config file, or the defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {:?}", path))?;
    parse_config(&content).with_context(|| format!("Failed to parse config: {:?}", path))
}
