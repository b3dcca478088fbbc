//! Integration tests for the cue GLB pipeline.
//!
//! Tests the complete flow:
//! 1. Generate a cue GLB
//! 2. Append the customizable layer and smooth the result
//! 3. Validate every stage with the gltf crate as an independent reader

use glb_builder::{COMPONENT_F32, COMPONENT_U16, TARGET_ARRAY_BUFFER, TARGET_ELEMENT_ARRAY_BUFFER};
use tempfile::tempdir;

use cue_gen::{
    Config, CueConfig, InspectConfig, LayerConfig, Preset, SmoothConfig, add_customizable_layer,
    build_cue, is_customizable_material, load_config, measure_uv, smooth_glb,
};

/// gltf 1.x exposes no `as_gl_enum` for buffer targets; map to the glTF GL enum values
trait TargetGlEnum {
    fn as_gl_enum(self) -> u32;
}

impl TargetGlEnum for gltf::buffer::Target {
    fn as_gl_enum(self) -> u32 {
        match self {
            gltf::buffer::Target::ArrayBuffer => 34962,
            gltf::buffer::Target::ElementArrayBuffer => 34963,
        }
    }
}

/// Write bytes to a temp file and import them back with the gltf crate
fn import(bytes: &[u8]) -> (gltf::Document, Vec<gltf::buffer::Data>) {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("cue.glb");
    std::fs::write(&path, bytes).expect("Failed to write GLB");
    let (document, buffers, _) = gltf::import(&path).expect("Failed to import GLB");
    (document, buffers)
}

fn material_names(document: &gltf::Document) -> Vec<String> {
    document
        .materials()
        .filter_map(|m| m.name().map(str::to_string))
        .collect()
}

#[test]
fn test_generated_cue_round_trips() {
    let cue = build_cue(&CueConfig::default()).expect("Failed to build cue");

    assert_eq!(&cue.glb[0..4], b"glTF", "Invalid GLB magic");
    assert_eq!(
        u32::from_le_bytes(cue.glb[4..8].try_into().unwrap()),
        2,
        "Expected glTF version 2"
    );
    assert_eq!(
        u32::from_le_bytes(cue.glb[8..12].try_into().unwrap()) as usize,
        cue.glb.len(),
        "Header length must match file length"
    );

    let (document, buffers) = import(&cue.glb);
    assert_eq!(document.meshes().count(), 1, "Expected 1 mesh");
    let mesh = document.meshes().next().unwrap();
    assert_eq!(mesh.name(), Some("PoolCue"));

    let mut vertices = 0;
    let mut indices = 0;
    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        vertices += reader.read_positions().expect("Missing POSITION").count();
        indices += reader.read_indices().expect("Missing indices").into_u32().count();
        assert!(reader.read_normals().is_some(), "Missing NORMAL");
        assert!(reader.read_tex_coords(0).is_some(), "Missing TEXCOORD_0");
    }
    assert_eq!(vertices, cue.vertex_count);
    assert_eq!(indices, cue.index_count);
    assert_eq!(
        material_names(&document),
        vec!["tip", "shaft", "ferrule", "outside", "bumper"]
    );
    assert_eq!(document.scenes().count(), 1);
}

#[test]
fn test_appended_layer_uses_standard_layout() {
    let cue = build_cue(&CueConfig::default()).unwrap();
    let layered = add_customizable_layer(&cue.glb, &LayerConfig::default()).unwrap();
    let (document, _) = import(&layered.glb);

    let layer = document.meshes().last().unwrap();
    let primitive = layer.primitives().next().unwrap();

    for (semantic, accessor) in primitive.attributes() {
        assert_eq!(
            accessor.data_type().as_gl_enum(),
            COMPONENT_F32,
            "{:?} should be float",
            semantic
        );
        let view = accessor.view().expect("Attribute without buffer view");
        assert_eq!(view.target().map(|t| t.as_gl_enum()), Some(TARGET_ARRAY_BUFFER));
        assert_eq!(view.offset() % 4, 0, "{:?} view is not aligned", semantic);
    }

    let indices = primitive.indices().expect("Layer must be indexed");
    assert_eq!(indices.data_type().as_gl_enum(), COMPONENT_U16);
    assert_eq!(indices.count(), 192);
    let view = indices.view().unwrap();
    assert_eq!(
        view.target().map(|t| t.as_gl_enum()),
        Some(TARGET_ELEMENT_ARRAY_BUFFER)
    );
    assert_eq!(view.offset() % 4, 0);
}

#[test]
fn test_butt_preset_marks_body_customizable() {
    let cue = build_cue(&CueConfig::from_preset(Preset::Butt)).unwrap();
    let (document, _) = import(&cue.glb);

    let customizable: Vec<_> = material_names(&document)
        .into_iter()
        .filter(|name| is_customizable_material(name))
        .collect();
    assert_eq!(customizable, vec!["CueButt_Body_Material"]);
}

#[test]
fn test_layer_then_smooth_keeps_everything() {
    let cue = build_cue(&CueConfig::from_preset(Preset::Full)).unwrap();
    let layered = add_customizable_layer(&cue.glb, &LayerConfig::default()).unwrap();
    let smoothed = smooth_glb(&layered.glb, &SmoothConfig::default()).unwrap();

    // 10 cue primitives + 1 layer primitive
    assert_eq!(smoothed.primitives.len(), 11);
    assert!(smoothed.primitives.iter().all(|p| p.failed.is_empty()));

    let (document, buffers) = import(&smoothed.glb);
    assert_eq!(document.meshes().count(), 2);
    assert_eq!(document.nodes().count(), 2);
    let scene = document.default_scene().expect("Missing default scene");
    assert_eq!(scene.nodes().count(), 2);

    let layer = document
        .meshes()
        .find(|m| m.name() == Some("CustomizableLayer"))
        .expect("Missing layer mesh");
    let primitive = layer.primitives().next().unwrap();
    assert_eq!(primitive.material().name(), Some("outside"));

    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
    let positions: Vec<[f32; 3]> = reader.read_positions().unwrap().collect();
    assert_eq!(positions.len(), 66);
    for p in &positions {
        assert!(p[0].abs() <= 2.15 + 1e-5 && p[2].abs() <= 2.15 + 1e-5);
        assert!((0.0..=0.365).contains(&p[1]));
    }
    let bounds = primitive.bounding_box();
    assert!((bounds.max[0] - 2.15).abs() < 1e-5);
    assert!((bounds.min[2] + 2.15).abs() < 1e-5);
}

#[test]
fn test_inspect_layer_rectangle() {
    let cue = build_cue(&CueConfig::default()).unwrap();
    let layered = add_customizable_layer(&cue.glb, &LayerConfig::default()).unwrap();

    let lines = measure_uv(
        &layered.glb,
        Some("CustomizableLayer"),
        &InspectConfig::default(),
    )
    .unwrap();

    assert_eq!(lines[0], "Object: CustomizableLayer");
    assert!(lines.contains(&"UV Points: 128".to_string()));
    assert!(lines.contains(&"U: 0.0000 → 1.0000".to_string()));
    assert!(lines.contains(&"surface.jpg: 2048 × 2048".to_string()));
}

#[test]
fn test_config_file_drives_generation() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("cue.toml");
    std::fs::write(
        &path,
        r##"
[cue]
mesh_name = "Stick"
center_at_origin = false

[[cue.sections]]
name = "Upper"
length_mm = 300.0
diameter_start_mm = 10.0
diameter_end_mm = 12.0
segments = 12
material = { name = "maple", color = "#E8D4B8", roughness = 0.45 }

[[cue.sections]]
name = "Grip"
length_mm = 200.0
diameter_start_mm = 12.0
diameter_end_mm = 14.0
customizable = true
material = { name = "outside_grip", color = "#1A1A1A" }

[layer]
radius = 1.0
"##,
    )
    .unwrap();

    let config: Config = load_config(Some(&path)).unwrap();
    config.validate().unwrap();
    assert_eq!(config.layer.radius, 1.0);
    assert_eq!(config.layer.segments, 32);

    let cue = build_cue(&config.cue).unwrap();
    assert_eq!(cue.materials, vec!["maple", "outside_grip"]);
    // The customizable grip gains a duplicated seam column
    assert_eq!(cue.vertex_count, 4 * 13 + 4 * 33 + 2);
    assert!(cue.bounds.0[1].abs() < 1e-6);
    assert!((cue.bounds.1[1] - 0.5).abs() < 1e-5);

    let (document, _) = import(&cue.glb);
    assert_eq!(document.meshes().next().unwrap().name(), Some("Stick"));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let err = load_config(Some(&dir.path().join("missing.toml"))).unwrap_err();
    assert!(err.to_string().contains("Failed to read config"));
}
