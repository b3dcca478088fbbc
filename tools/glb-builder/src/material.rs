//! Metallic-roughness materials

use gltf_json as json;

/// A named PBR material (base color, metallic, roughness)
#[derive(Debug, Clone, PartialEq)]
pub struct PbrMaterial {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
}

impl PbrMaterial {
    /// White, non-metallic, roughness 0.5
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 0.5,
        }
    }

    pub fn base_color(mut self, rgba: [f32; 4]) -> Self {
        self.base_color = rgba;
        self
    }

    pub fn metallic(mut self, metallic: f32) -> Self {
        self.metallic = metallic;
        self
    }

    pub fn roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    /// Convert to a glTF material entry
    pub fn to_json(&self) -> json::Material {
        json::Material {
            name: Some(self.name.clone()),
            pbr_metallic_roughness: json::material::PbrMetallicRoughness {
                base_color_factor: json::material::PbrBaseColorFactor(self.base_color),
                metallic_factor: json::material::StrengthFactor(self.metallic),
                roughness_factor: json::material::StrengthFactor(self.roughness),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
