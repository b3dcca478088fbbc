//! Error type shared by GLB construction and patching

/// Errors raised while reading, building or writing GLB data
#[derive(Debug, thiserror::Error)]
pub enum GlbError {
    #[error("not a valid GLB container: {0}")]
    InvalidContainer(String),

    #[error("invalid glTF JSON: {0}")]
    InvalidJson(String),

    #[error("failed to serialize glTF JSON: {0}")]
    Serialize(String),

    #[error("buffer {0} references an external URI; only GLB-embedded buffers can be patched")]
    ExternalBuffer(usize),

    #[error("GLB would be {0} bytes, exceeding the 4 GiB container limit")]
    TooLarge(usize),

    #[error("{attribute} has {actual} elements, expected {expected} (one per position)")]
    AttributeCount {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("index {index} references vertex {value}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        index: usize,
        value: u16,
        vertex_count: usize,
    },
}
