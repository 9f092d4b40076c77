//! Index resolution and interleaved vertex layout.
//!
//! Vertices are deduplicated by *position index* only: the first corner that
//! references a position decides the texcoord and normal baked into that slot,
//! and every later corner with the same position reuses it as-is. Meshes that
//! pair one position with several texcoords/normals must be split upstream.

use corelib::{AssetError, AssetResult};

use crate::{
    mesh::{MeshBuffers, NORMAL_OFFSET, POSITION_OFFSET, TEXCOORD_OFFSET, VERTEX_STRIDE},
    obj::{FaceCorner, ParsedMeshData},
};

/// Build the vertex and index buffers for one parsed file.
pub fn build_buffers(data: &ParsedMeshData, source_name: &str) -> AssetResult<MeshBuffers> {
    VertexBufferBuilder::new(data, source_name)?.build()
}

/// Scratch state for one build. Owned by the call, dropped with it.
struct VertexBufferBuilder<'a> {
    data: &'a ParsedMeshData,
    source_name: &'a str,
    vertices: Vec<f32>,
    indices: Vec<u32>,
    /// Parallel to `data.positions`: slot already written.
    built: Vec<bool>,
}

impl<'a> VertexBufferBuilder<'a> {
    fn new(data: &'a ParsedMeshData, source_name: &'a str) -> AssetResult<Self> {
        let count = data.positions.len();
        if u32::try_from(count).is_err() {
            return Err(AssetError::parse(
                source_name,
                0,
                format!("too many vertices in OBJ (>{})", u32::MAX),
            ));
        }
        Ok(Self {
            data,
            source_name,
            vertices: vec![0.0; count * VERTEX_STRIDE],
            indices: Vec::with_capacity(data.corners.len()),
            built: vec![false; count],
        })
    }

    fn build(mut self) -> AssetResult<MeshBuffers> {
        for (n, corner) in self.data.corners.iter().enumerate() {
            self.push_corner(n, corner)?;
        }
        Ok(MeshBuffers {
            vertices: self.vertices,
            indices: self.indices,
        })
    }

    fn push_corner(&mut self, n: usize, corner: &FaceCorner) -> AssetResult<()> {
        let slot = self.resolve(corner.position, self.data.positions.len(), n, "position")?;
        // Fits: the position count was checked against u32 in `new`.
        self.indices.push(slot as u32);

        if self.built[slot] {
            return Ok(());
        }

        let base = slot * VERTEX_STRIDE;
        let position = self.data.positions[slot];
        self.vertices[base + POSITION_OFFSET..base + POSITION_OFFSET + 3]
            .copy_from_slice(&position.to_array());

        // Channels absent from the file stay zero.
        if !self.data.texcoords.is_empty() {
            if let Some(index) = corner.texcoord {
                let t = self.resolve(index, self.data.texcoords.len(), n, "texcoord")?;
                self.vertices[base + TEXCOORD_OFFSET..base + TEXCOORD_OFFSET + 2]
                    .copy_from_slice(&self.data.texcoords[t].to_array());
            }
        }
        if !self.data.normals.is_empty() {
            if let Some(index) = corner.normal {
                let t = self.resolve(index, self.data.normals.len(), n, "normal")?;
                self.vertices[base + NORMAL_OFFSET..base + NORMAL_OFFSET + 3]
                    .copy_from_slice(&self.data.normals[t].to_array());
            }
        }

        self.built[slot] = true;
        Ok(())
    }

    fn resolve(&self, index: u32, len: usize, corner: usize, what: &str) -> AssetResult<usize> {
        wrap_index(index, len).ok_or_else(|| {
            let line = self.data.face_lines.get(corner / 3).copied().unwrap_or(0);
            AssetError::parse(
                self.source_name,
                line,
                format!(
                    "corner {}: {} index {} out of range ({} defined)",
                    corner % 3 + 1,
                    what,
                    index,
                    len
                ),
            )
        })
    }
}

/// 1-based → 0-based. An index that lands past the end is wrapped back once
/// by the list length; anything still outside the list is rejected.
fn wrap_index(index: u32, len: usize) -> Option<usize> {
    let mut i = (index as usize).checked_sub(1)?;
    if i > len {
        i -= len;
    }
    (i < len).then_some(i)
}

#[cfg(test)]
mod tests {
    use crate::obj::parse_obj_str;

    use super::*;

    fn build(src: &str) -> MeshBuffers {
        let data = parse_obj_str(src).expect("parse");
        build_buffers(&data, "test.obj").expect("build")
    }

    fn vertex(buffers: &MeshBuffers, i: usize) -> &[f32] {
        &buffers.vertices[i * VERTEX_STRIDE..(i + 1) * VERTEX_STRIDE]
    }

    #[test]
    fn positions_only_triangle() {
        let b = build("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        assert_eq!(b.vertices.len(), 24);
        assert_eq!(vertex(&b, 0), &[0.0; 8]);
        assert_eq!(vertex(&b, 1), &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(b.indices, vec![0, 1, 2]);
    }

    #[test]
    fn full_corners_are_interleaved() {
        let src = "v 1 2 3\nv 4 5 6\nv 7 8 9\n\
                   vt 0.1 0.2\nvt 0.3 0.4\n\
                   vn 0 0 1\nvn 0 1 0\n\
                   f 3/2/1 1/1/2 2/2/2\n";
        let b = build(src);
        assert_eq!(b.indices, vec![2, 0, 1]);
        assert_eq!(vertex(&b, 2), &[7.0, 8.0, 9.0, 0.3, 0.4, 0.0, 0.0, 1.0]);
        assert_eq!(vertex(&b, 0), &[1.0, 2.0, 3.0, 0.1, 0.2, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn dedup_keeps_first_texcoord_for_a_position() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\n\
                   vt 0.25 0.5\nvt 0.75 1.0\n\
                   vn 0 0 1\n\
                   f 1/1/1 2/1/1 3/1/1\n\
                   f 1/2/1 3/2/1 4/2/1\n";
        let b = build(src);
        assert_eq!(b.indices, vec![0, 1, 2, 0, 2, 3]);
        // Second reference to position 1 asked for texcoord 2; the slot keeps texcoord 1.
        assert_eq!(&vertex(&b, 0)[3..5], &[0.25, 0.5]);
        assert_eq!(&vertex(&b, 3)[3..5], &[0.75, 1.0]);
        assert_eq!(b.vertex_count(), 4);
    }

    #[test]
    fn missing_channels_are_zero_filled() {
        let b = build("v 1 1 1\nv 2 2 2\nv 3 3 3\nvn 0 1 0\nf 1//1 2//1 3//1\n");
        for i in 0..3 {
            let v = vertex(&b, i);
            assert_eq!(&v[3..5], &[0.0, 0.0]);
            assert_eq!(&v[5..8], &[0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn no_attributes_means_zero_texcoords_and_normals() {
        let src = "v 1 1 1\nv 2 2 2\nv 3 3 3\nv 4 4 4\nf 1 2 3\nf 3 2 4\n";
        let b = build(src);
        for v in b.vertices.chunks(VERTEX_STRIDE) {
            assert!(v[3..].iter().all(|&c| c == 0.0));
        }
    }

    #[test]
    fn indices_stay_below_vertex_count() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nv 2 2 0\nf 1 2 3\nf 2 4 3\nf 5 4 2\n";
        let b = build(src);
        assert_eq!(b.indices.len(), 9);
        assert!(b.indices.iter().all(|&i| (i as usize) < b.vertex_count()));
    }

    #[test]
    fn unreferenced_positions_keep_zeroed_slots() {
        let b = build("v 9 9 9\nv 0 0 1\nv 0 1 0\nv 1 0 0\nf 2 3 4\n");
        assert_eq!(b.vertex_count(), 4);
        assert_eq!(vertex(&b, 0), &[0.0; 8]);
        assert_eq!(b.indices, vec![1, 2, 3]);
    }

    #[test]
    fn indices_past_the_end_wrap_once() {
        // Three positions: index 5 wraps to the second one.
        let b = build("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 5 3\n");
        assert_eq!(b.indices, vec![0, 1, 2]);
    }

    #[test]
    fn unwrappable_index_fails() {
        let data = parse_obj_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n").unwrap();
        let err = build_buffers(&data, "test.obj").unwrap_err();
        match err {
            AssetError::Parse { line, message, .. } => {
                assert_eq!(line, 4);
                assert!(message.contains("position index 4"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn dangling_texcoord_fails() {
        let data = parse_obj_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1 2/9 3/1\n").unwrap();
        assert!(build_buffers(&data, "test.obj").is_err());
    }

    #[test]
    fn wrap_rule() {
        assert_eq!(wrap_index(1, 3), Some(0));
        assert_eq!(wrap_index(3, 3), Some(2));
        assert_eq!(wrap_index(4, 3), None);
        assert_eq!(wrap_index(5, 3), Some(1));
        assert_eq!(wrap_index(7, 3), None);
        assert_eq!(wrap_index(0, 3), None);
    }

    #[test]
    fn builds_are_deterministic() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n";
        assert_eq!(build(src), build(src));
    }
}
