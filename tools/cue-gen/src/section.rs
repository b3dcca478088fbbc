//! Cue sections, decorative rings, their materials and the built-in presets
//!
//! Lengths and diameters are authored in millimetres, tip to butt. `diameter_start_mm`
//! is the end nearer the tip.

use crate::config::ConfigError;
use crate::contract::OUTSIDE_MATERIAL;
use glb_builder::PbrMaterial;
use serde::{Deserialize, Serialize};

/// Radial segments used when a section does not say
pub const DEFAULT_SEGMENTS: u32 = 32;

fn default_segments() -> u32 {
    DEFAULT_SEGMENTS
}

fn default_color() -> String {
    "#FFFFFF".to_string()
}

fn default_roughness() -> f32 {
    0.5
}

/// Material as authored in config: hex color plus PBR scalars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub name: String,
    /// `#RRGGBB`
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub metallic: f32,
    #[serde(default = "default_roughness")]
    pub roughness: f32,
}

impl MaterialSpec {
    pub fn new(name: &str, color: &str, metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            color: color.to_string(),
            metallic,
            roughness,
        }
    }

    pub fn to_pbr(&self) -> Result<PbrMaterial, ConfigError> {
        Ok(PbrMaterial::new(self.name.as_str())
            .base_color(parse_hex_color(&self.color)?)
            .metallic(self.metallic)
            .roughness(self.roughness))
    }
}

/// Parse `#RRGGBB` (leading `#` optional) into opaque RGBA in 0..1
pub fn parse_hex_color(hex: &str) -> Result<[f32; 4], ConfigError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    let invalid = || ConfigError::InvalidColor(hex.to_string());

    if digits.len() != 6 || !digits.is_ascii() {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map(|v| v as f32 / 255.0)
            .map_err(|_| invalid())
    };

    Ok([channel(0..2)?, channel(2..4)?, channel(4..6)?, 1.0])
}

/// One turned piece of the cue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub length_mm: f32,
    pub diameter_start_mm: f32,
    pub diameter_end_mm: f32,
    #[serde(default = "default_segments")]
    pub segments: u32,
    /// Meant to receive the customer's texture
    #[serde(default)]
    pub customizable: bool,
    pub material: MaterialSpec,
}

impl Section {
    pub fn new(
        name: &str,
        length_mm: f32,
        diameter_start_mm: f32,
        diameter_end_mm: f32,
        material: MaterialSpec,
    ) -> Self {
        Self {
            name: name.to_string(),
            length_mm,
            diameter_start_mm,
            diameter_end_mm,
            segments: DEFAULT_SEGMENTS,
            customizable: false,
            material,
        }
    }

    pub fn segments(mut self, segments: u32) -> Self {
        self.segments = segments;
        self
    }

    pub fn customizable(mut self) -> Self {
        self.customizable = true;
        self
    }
}

/// A thin band placed over the joint after a section
///
/// Its center sits `offset_mm` along +Y (toward the tip) from the butt-side end
/// of the section it follows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecorativeRing {
    pub name: String,
    pub after_section: String,
    #[serde(default)]
    pub offset_mm: f32,
    pub length_mm: f32,
    pub diameter_mm: f32,
    #[serde(default = "default_segments")]
    pub segments: u32,
    pub material: MaterialSpec,
}

/// Built-in cue layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Five sections, 1450 mm, long customizable wrap
    #[default]
    Simplified,
    /// Eight segments and two gold rings, 1435 mm
    Full,
    /// Cue butt only: textured body plus rubber bumper
    Butt,
    /// Four sections on one continuous taper, 3000 mm
    Realistic,
}

impl Preset {
    pub fn sections(self) -> Vec<Section> {
        match self {
            Preset::Simplified => simplified_sections(),
            Preset::Full => full_sections(),
            Preset::Butt => butt_sections(),
            Preset::Realistic => realistic_sections(),
        }
    }

    pub fn rings(self) -> Vec<DecorativeRing> {
        match self {
            Preset::Full => full_rings(),
            Preset::Simplified | Preset::Butt | Preset::Realistic => Vec::new(),
        }
    }

    /// The butt is authored standing on its bumper
    pub fn centered(self) -> bool {
        !matches!(self, Preset::Butt)
    }

    /// Height of the butt end in mm when the model is not centred
    ///
    /// The butt stands on the body/bumper joint, with the bumper below the origin.
    pub fn butt_end_mm(self) -> f32 {
        match self {
            Preset::Butt => -BUTT_BUMPER_LENGTH_MM,
            _ => 0.0,
        }
    }

    pub fn mesh_name(self) -> &'static str {
        match self {
            Preset::Butt => "CueButt",
            _ => "PoolCue",
        }
    }
}

impl std::str::FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simplified" => Ok(Preset::Simplified),
            "full" => Ok(Preset::Full),
            "butt" => Ok(Preset::Butt),
            "realistic" => Ok(Preset::Realistic),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }
}

fn simplified_sections() -> Vec<Section> {
    vec![
        Section::new(
            "Tip",
            43.0,
            12.0,
            12.0,
            MaterialSpec::new("tip", "#3D2314", 0.0, 0.8),
        ),
        Section::new(
            "Shaft",
            682.0,
            12.0,
            14.0,
            MaterialSpec::new("shaft", "#DEB887", 0.0, 0.4),
        ),
        Section::new(
            "Ferrule",
            43.0,
            14.0,
            14.0,
            MaterialSpec::new("ferrule", "#FFFFF0", 0.1, 0.2),
        ),
        Section::new(
            "CustomWrap",
            653.0,
            14.0,
            25.0,
            MaterialSpec::new(OUTSIDE_MATERIAL, "#808080", 0.0, 0.3),
        )
        .customizable(),
        Section::new(
            "Bumper",
            29.0,
            25.0,
            28.0,
            MaterialSpec::new("bumper", "#1A1A1A", 0.0, 0.95),
        ),
    ]
}

fn full_sections() -> Vec<Section> {
    vec![
        Section::new(
            "tip",
            5.0,
            12.0,
            12.0,
            MaterialSpec::new("tip_leather", "#3D2314", 0.0, 0.85),
        )
        .segments(16),
        Section::new(
            "ferrule",
            25.0,
            12.0,
            12.5,
            MaterialSpec::new("ferrule_plastic", "#FFFEF0", 0.0, 0.25),
        )
        .segments(24),
        Section::new(
            "shaft",
            730.0,
            12.5,
            14.0,
            MaterialSpec::new("shaft_maple", "#E8D4B8", 0.0, 0.45),
        ),
        Section::new(
            "joint_collar",
            15.0,
            14.0,
            14.0,
            MaterialSpec::new("joint_brass", "#B5A642", 0.95, 0.2),
        ),
        Section::new(
            "forearm",
            200.0,
            14.0,
            20.0,
            MaterialSpec::new("forearm_wood", "#8B4513", 0.0, 0.4),
        ),
        Section::new(
            "wrap",
            300.0,
            20.0,
            24.0,
            MaterialSpec::new(OUTSIDE_MATERIAL, "#1A1A1A", 0.0, 0.6),
        )
        .segments(48)
        .customizable(),
        Section::new(
            "butt_sleeve",
            150.0,
            24.0,
            28.0,
            MaterialSpec::new("butt_wood", "#2F1810", 0.0, 0.35),
        ),
        Section::new(
            "bumper",
            10.0,
            28.0,
            29.0,
            MaterialSpec::new("bumper_rubber", "#0A0A0A", 0.0, 0.9),
        )
        .segments(24),
    ]
}

fn full_rings() -> Vec<DecorativeRing> {
    let gold = MaterialSpec::new("ring_gold", "#D4AF37", 0.95, 0.15);
    vec![
        DecorativeRing {
            name: "ring_forearm_end".to_string(),
            after_section: "forearm".to_string(),
            offset_mm: -5.0,
            length_mm: 3.0,
            diameter_mm: 20.5,
            segments: DEFAULT_SEGMENTS,
            material: gold.clone(),
        },
        DecorativeRing {
            name: "ring_wrap_end".to_string(),
            after_section: "wrap".to_string(),
            offset_mm: 5.0,
            length_mm: 3.0,
            diameter_mm: 24.5,
            segments: DEFAULT_SEGMENTS,
            material: gold,
        },
    ]
}

const BUTT_BUMPER_LENGTH_MM: f32 = 80.0;

fn butt_sections() -> Vec<Section> {
    vec![
        Section::new(
            "CueButt_Body",
            2000.0,
            70.0,
            70.0,
            MaterialSpec::new("CueButt_Body_Material", "#D9BF8C", 0.0, 0.35),
        )
        .customizable(),
        Section::new(
            "CueButt_Bumper",
            BUTT_BUMPER_LENGTH_MM,
            76.0,
            76.0,
            MaterialSpec::new("Rubber_Bumper", "#0D0D0D", 0.0, 0.9),
        ),
    ]
}

const REALISTIC_LENGTH_MM: f32 = 3000.0;
const REALISTIC_TIP_RADIUS_MM: f32 = 13.0;
const REALISTIC_BUTT_RADIUS_MM: f32 = 29.0;

/// Diameter of the realistic taper at `ratio` of the length above the butt
fn realistic_diameter_mm(ratio: f32) -> f32 {
    2.0 * (REALISTIC_BUTT_RADIUS_MM + (REALISTIC_TIP_RADIUS_MM - REALISTIC_BUTT_RADIUS_MM) * ratio)
}

fn realistic_sections() -> Vec<Section> {
    let maple = "#E0C287";
    // (name, start, end) as fractions of the length above the butt, tip first
    let layout = [
        ("Tip", 0.992, 1.0, MaterialSpec::new("Tip_mat", "#1F2E6B", 0.0, 0.8)),
        ("Shaft", 0.5, 0.992, MaterialSpec::new("Shaft_mat", maple, 0.0, 0.4)),
        (
            "CustomArea",
            0.008,
            0.5,
            MaterialSpec::new(OUTSIDE_MATERIAL, maple, 0.0, 0.4),
        ),
        ("Bumper", 0.0, 0.008, MaterialSpec::new("Bumper_mat", "#080808", 0.0, 0.95)),
    ];

    layout
        .into_iter()
        .map(|(name, start, end, material)| {
            let section = Section::new(
                name,
                (end - start) * REALISTIC_LENGTH_MM,
                realistic_diameter_mm(end),
                realistic_diameter_mm(start),
                material,
            );
            if name == "CustomArea" {
                section.customizable()
            } else {
                section
            }
        })
        .collect()
}
