//! Low-level buffer packing with automatic alignment and accessor creation

use crate::utils::{align_buffer, compute_bounds};
use gltf_json as json;
use gltf_json::validation::Checked::Valid;
use tracing::debug;

/// Accessor index returned by buffer operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorIndex(pub u32);

impl AccessorIndex {
    pub fn as_json_index(&self) -> json::Index<json::Accessor> {
        json::Index::new(self.0)
    }
}

/// Builder for binary buffer with automatic alignment
///
/// Every packed array starts on a 4-byte boundary and is followed by zero padding,
/// so views never overlap and always satisfy the glTF alignment rules.
pub struct BufferBuilder {
    buffer: Vec<u8>,
    views: Vec<json::buffer::View>,
    accessors: Vec<json::Accessor>,
    view_base: u32,
    accessor_base: u32,
}

impl BufferBuilder {
    /// Create a new empty buffer builder
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            views: Vec::new(),
            accessors: Vec::new(),
            view_base: 0,
            accessor_base: 0,
        }
    }

    /// Continue packing after an existing binary blob.
    ///
    /// `view_base` and `accessor_base` are the lengths of the document's existing
    /// bufferView and accessor arrays; indices handed out by this builder start there.
    /// The blob is zero-padded to a 4-byte boundary before anything new is written.
    pub fn resume(existing: Vec<u8>, view_base: u32, accessor_base: u32) -> Self {
        let mut buffer = existing;
        align_buffer(&mut buffer);
        Self {
            buffer,
            views: Vec::new(),
            accessors: Vec::new(),
            view_base,
            accessor_base,
        }
    }

    /// Get the current accessor count (including any resumed-over accessors)
    pub fn accessor_count(&self) -> u32 {
        self.accessor_base + self.accessors.len() as u32
    }

    /// Get next accessor index (without creating it)
    pub fn next_accessor_index(&self) -> AccessorIndex {
        AccessorIndex(self.accessor_count())
    }

    /// Get the binary buffer data
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the builder, returning the binary buffer
    pub fn into_data(self) -> Vec<u8> {
        self.buffer
    }

    /// Get the buffer views created by this builder
    pub fn views(&self) -> &[json::buffer::View] {
        &self.views
    }

    /// Get the accessors created by this builder
    pub fn accessors(&self) -> &[json::Accessor] {
        &self.accessors
    }

    /// Pack Vec3 positions with bounds calculation
    pub fn pack_positions(&mut self, positions: &[[f32; 3]]) -> AccessorIndex {
        let view = self.push_view(
            bytemuck::cast_slice(positions),
            Some(json::buffer::Target::ArrayBuffer),
        );

        let (min, max) = compute_bounds(positions);
        let bounds = |values: [f32; 3]| {
            json::Value::Array(values.into_iter().map(json::Value::from).collect())
        };
        self.push_accessor(
            view,
            positions.len(),
            json::accessor::ComponentType::F32,
            json::accessor::Type::Vec3,
            Some((bounds(min), bounds(max))),
        )
    }

    /// Pack Vec3 data (normals)
    pub fn pack_vec3(&mut self, data: &[[f32; 3]]) -> AccessorIndex {
        let view = self.push_view(
            bytemuck::cast_slice(data),
            Some(json::buffer::Target::ArrayBuffer),
        );
        self.push_accessor(
            view,
            data.len(),
            json::accessor::ComponentType::F32,
            json::accessor::Type::Vec3,
            None,
        )
    }

    /// Pack Vec2 data (UVs)
    pub fn pack_vec2(&mut self, data: &[[f32; 2]]) -> AccessorIndex {
        let view = self.push_view(
            bytemuck::cast_slice(data),
            Some(json::buffer::Target::ArrayBuffer),
        );
        self.push_accessor(
            view,
            data.len(),
            json::accessor::ComponentType::F32,
            json::accessor::Type::Vec2,
            None,
        )
    }

    /// Pack u16 indices
    pub fn pack_indices_u16(&mut self, indices: &[u16]) -> AccessorIndex {
        let bytes: Vec<u8> = indices.iter().flat_map(|idx| idx.to_le_bytes()).collect();
        let view = self.push_view(&bytes, Some(json::buffer::Target::ElementArrayBuffer));
        self.push_accessor(
            view,
            indices.len(),
            json::accessor::ComponentType::U16,
            json::accessor::Type::Scalar,
            None,
        )
    }

    /// Pack opaque bytes (embedded images) into a view with no target or accessor
    pub fn pack_bytes(&mut self, bytes: &[u8]) -> json::Index<json::buffer::View> {
        self.push_view(bytes, None)
    }

    fn push_view(
        &mut self,
        bytes: &[u8],
        target: Option<json::buffer::Target>,
    ) -> json::Index<json::buffer::View> {
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(bytes);

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: bytes.len().into(),
            byte_offset: Some((offset as u64).into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: target.map(Valid),
        });
        align_buffer(&mut self.buffer);

        let index = self.view_base + self.views.len() as u32 - 1;
        debug!(
            "bufferView {}: offset {}, length {}",
            index,
            offset,
            bytes.len()
        );
        json::Index::new(index)
    }

    fn push_accessor(
        &mut self,
        view: json::Index<json::buffer::View>,
        count: usize,
        component_type: json::accessor::ComponentType,
        type_: json::accessor::Type,
        bounds: Option<(json::Value, json::Value)>,
    ) -> AccessorIndex {
        let (min, max) = match bounds {
            Some((min, max)) => (Some(min), Some(max)),
            None => (None, None),
        };

        let accessor_idx = self.accessor_count();
        self.accessors.push(json::Accessor {
            buffer_view: Some(view),
            byte_offset: Some(0u64.into()),
            count: count.into(),
            component_type: Valid(json::accessor::GenericComponentType(component_type)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(type_),
            min,
            max,
            name: None,
            normalized: false,
            sparse: None,
        });

        AccessorIndex(accessor_idx)
    }
}

impl Default for BufferBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_offset(view: &json::buffer::View) -> u64 {
        view.byte_offset.map(|o| o.0).unwrap_or(0)
    }

    #[test]
    fn test_buffer_builder_positions() {
        let mut builder = BufferBuilder::new();
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]];
        let idx = builder.pack_positions(&positions);

        assert_eq!(idx, AccessorIndex(0));
        assert_eq!(builder.accessor_count(), 1);
        assert_eq!(builder.views().len(), 1);
        // 3 positions * 12 bytes = 36 bytes, already aligned
        assert_eq!(builder.data().len(), 36);

        let accessor = &builder.accessors()[0];
        assert_eq!(
            accessor.min,
            Some(json::Value::Array(vec![0.0.into(), 0.0.into(), 0.0.into()]))
        );
        assert_eq!(
            accessor.max,
            Some(json::Value::Array(vec![1.0.into(), 1.0.into(), 0.0.into()]))
        );
    }

    #[test]
    fn test_buffer_builder_indices_padded() {
        let mut builder = BufferBuilder::new();
        let indices: [u16; 3] = [0, 1, 2];
        let idx = builder.pack_indices_u16(&indices);

        assert_eq!(idx, AccessorIndex(0));
        // 3 indices * 2 bytes = 6 bytes, aligned to 8
        assert_eq!(builder.data().len(), 8);
        assert_eq!(builder.views()[0].byte_length.0, 6);
    }

    #[test]
    fn test_views_are_aligned_and_disjoint() {
        let mut builder = BufferBuilder::new();
        builder.pack_indices_u16(&[0, 1, 2]);
        builder.pack_vec2(&[[0.0, 0.0], [1.0, 1.0], [0.5, 0.5]]);
        builder.pack_indices_u16(&[2, 1, 0, 0, 1]);
        builder.pack_vec3(&[[0.0, 1.0, 0.0]]);

        let mut previous_end = 0u64;
        for view in builder.views() {
            let offset = view_offset(view);
            assert_eq!(offset % 4, 0);
            assert!(offset >= previous_end);
            previous_end = offset + view.byte_length.0;
        }
    }

    #[test]
    fn test_resume_offsets_follow_existing_data() {
        let existing = vec![0xAB; 10];
        let mut builder = BufferBuilder::resume(existing, 4, 7);
        assert_eq!(builder.data().len(), 12);

        let idx = builder.pack_vec2(&[[0.25, 0.75]]);
        assert_eq!(idx, AccessorIndex(7));
        assert_eq!(view_offset(&builder.views()[0]), 12);
        assert_eq!(
            builder.accessors()[0].buffer_view.map(|v| v.value()),
            Some(4)
        );
        // Existing bytes are untouched
        assert!(builder.data()[..10].iter().all(|b| *b == 0xAB));
    }
}
