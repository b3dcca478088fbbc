//! Material-name contract with the web customizer
//!
//! The customizer picks the parts a user may texture by a case-insensitive
//! substring match on material names. Anything generated here that is meant to
//! be customizable must carry a name this module accepts.

/// Substrings that mark a material as customizable
pub const CUSTOMIZABLE_MARKERS: [&str; 2] = ["outside", "body"];

/// Material name given to generated customizable sections and layers
pub const OUTSIDE_MATERIAL: &str = "outside";

/// True if the customizer would treat a material with this name as texturable
pub fn is_customizable_material(name: &str) -> bool {
    let lower = name.to_lowercase();
    CUSTOMIZABLE_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_match_case_insensitively() {
        assert!(is_customizable_material("outside"));
        assert!(is_customizable_material("Outside_Wrap"));
        assert!(is_customizable_material("CueButt_Body_Material"));
        assert!(is_customizable_material("BODY"));
    }

    #[test]
    fn test_other_names_rejected() {
        for name in ["shaft", "tip", "ferrule", "Rubber_Bumper", ""] {
            assert!(!is_customizable_material(name), "{name}");
        }
    }

    #[test]
    fn test_outside_material_satisfies_contract() {
        assert!(is_customizable_material(OUTSIDE_MATERIAL));
    }
}
