//! Utility functions for GLB construction

use crate::GlbError;
use gltf_json as json;

/// GLB header magic ("glTF")
pub const GLB_MAGIC: &[u8; 4] = b"glTF";
/// GLB container version
pub const GLB_VERSION: u32 = 2;
/// JSON chunk type ("JSON")
pub const CHUNK_JSON: u32 = 0x4E4F534A;
/// Binary chunk type ("BIN\0")
pub const CHUNK_BIN: u32 = 0x004E4942;

/// Compute the per-axis bounding box of a position array.
///
/// An empty slice yields `([f32::MAX; 3], [f32::MIN; 3])`.
pub fn compute_bounds(positions: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];

    for pos in positions {
        for axis in 0..3 {
            min[axis] = min[axis].min(pos[axis]);
            max[axis] = max[axis].max(pos[axis]);
        }
    }

    (min, max)
}

/// Number of padding bytes needed to bring `length` up to a multiple of 4
pub fn pad_to_4(length: usize) -> usize {
    (4 - (length % 4)) % 4
}

/// Align buffer to 4-byte boundary with zero bytes
pub fn align_buffer(buffer: &mut Vec<u8>) {
    buffer.resize(buffer.len() + pad_to_4(buffer.len()), 0);
}

/// Assemble GLB binary from JSON and buffer data
pub fn assemble_glb(root: &json::Root, buffer_data: &[u8]) -> Result<Vec<u8>, GlbError> {
    let json_string =
        json::serialize::to_string(root).map_err(|e| GlbError::Serialize(e.to_string()))?;
    let json_bytes = json_string.as_bytes();

    let json_padding = pad_to_4(json_bytes.len());
    let json_chunk_length = json_bytes.len() + json_padding;

    let buffer_padding = pad_to_4(buffer_data.len());
    let buffer_chunk_length = buffer_data.len() + buffer_padding;
    let has_bin = !buffer_data.is_empty();

    let mut total_length = 12 + 8 + json_chunk_length;
    if has_bin {
        total_length += 8 + buffer_chunk_length;
    }
    let total_length_u32 =
        u32::try_from(total_length).map_err(|_| GlbError::TooLarge(total_length))?;

    let mut glb = Vec::with_capacity(total_length);

    // Header
    glb.extend_from_slice(GLB_MAGIC);
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    glb.extend_from_slice(&total_length_u32.to_le_bytes());

    // JSON chunk, padded with spaces
    glb.extend_from_slice(&(json_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb.extend_from_slice(json_bytes);
    glb.resize(glb.len() + json_padding, b' ');

    // Binary chunk, padded with zeros
    if has_bin {
        glb.extend_from_slice(&(buffer_chunk_length as u32).to_le_bytes());
        glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        glb.extend_from_slice(buffer_data);
        glb.resize(glb.len() + buffer_padding, 0);
    }

    Ok(glb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_bounds_simple() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 2.0, 3.0], [-1.0, -2.0, -3.0]];
        let (min, max) = compute_bounds(&positions);
        assert_eq!(min, [-1.0, -2.0, -3.0]);
        assert_eq!(max, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_pad_to_4() {
        assert_eq!(pad_to_4(0), 0);
        assert_eq!(pad_to_4(1), 3);
        assert_eq!(pad_to_4(6), 2);
        assert_eq!(pad_to_4(12), 0);
    }

    #[test]
    fn test_align_buffer() {
        let mut buffer = vec![1, 2, 3];
        align_buffer(&mut buffer);
        assert_eq!(buffer, vec![1, 2, 3, 0]);

        let mut buffer2 = vec![1, 2, 3, 4];
        align_buffer(&mut buffer2);
        assert_eq!(buffer2.len(), 4);
    }

    #[test]
    fn test_assemble_glb_header_and_chunks() {
        let root = crate::GltfBuilder::new()
            .buffer_byte_length(6)
            .build(&[], &[], "test");
        let glb = assemble_glb(&root, &[1, 2, 3, 4, 5, 6]).unwrap();

        assert_eq!(&glb[0..4], b"glTF");
        assert_eq!(u32::from_le_bytes(glb[4..8].try_into().unwrap()), 2);
        assert_eq!(
            u32::from_le_bytes(glb[8..12].try_into().unwrap()) as usize,
            glb.len()
        );
        assert_eq!(glb.len() % 4, 0);

        let json_len = u32::from_le_bytes(glb[12..16].try_into().unwrap()) as usize;
        assert_eq!(json_len % 4, 0);
        let bin_header = 20 + json_len;
        let bin_len =
            u32::from_le_bytes(glb[bin_header..bin_header + 4].try_into().unwrap()) as usize;
        assert_eq!(bin_len, 8);
    }
}
