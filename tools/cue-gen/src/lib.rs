//! cue-gen - pool-cue GLB tooling for the web customizer
//!
//! Four operations, each a single pass from input bytes to output bytes:
//! - [`cue::build_cue`]: generate a cue from a preset or explicit sections
//! - [`layer::add_customizable_layer`]: append a texturable shell to an existing GLB
//! - [`inspect::measure_uv`]: report UV-space dimensions for texture authoring
//! - [`smooth::smooth_glb`]: re-shade an existing GLB through a modifier stack
//!
//! Parts the customizer may texture are found by material name; see [`contract`].

pub mod config;
pub mod contract;
pub mod cue;
pub mod geometry;
pub mod import;
pub mod inspect;
pub mod layer;
pub mod section;
pub mod smooth;

pub use config::{Config, CueConfig, InspectConfig, LayerConfig, SmoothConfig, load_config};
pub use contract::{CUSTOMIZABLE_MARKERS, OUTSIDE_MATERIAL, is_customizable_material};
pub use cue::{BuiltCue, build_cue};
pub use geometry::{MeshData, generate_shell, project_cylindrical};
pub use inspect::{UvReport, measure_uv};
pub use layer::{LayerOutcome, add_customizable_layer};
pub use section::Preset;
pub use smooth::{SmoothOutcome, smooth_glb};
