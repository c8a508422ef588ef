use std::collections::HashMap;

use glam::{dvec2, DVec2};

use crate::PuppetError;

/// Fixed texture resolution; normalized coordinates are scaled by this
/// before the affine solve.
pub const TEXTURE_SIZE: f64 = 2048.0;

/// Viewport-to-texture ratio applied when remapping loader positions.
pub const CANVAS_SCALE: f64 = 2400.0 / 2048.0;

/// One triangle of a part: remapped model-space positions and flipped
/// texture UVs, vertex-correspondent.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub positions: [DVec2; 3],
    pub uvs: [DVec2; 3],
}

/// All triangles of one part, in index-triple order. The order is
/// load-bearing: per-triangle transforms bind to the part's rendered
/// sub-elements positionally.
#[derive(Debug, Clone)]
pub struct PartMesh {
    pub triangles: Vec<Triangle>,
    pub draw_order: i32,
}

/// Maps part identifiers to their triangle lists and external draw order.
/// Built once from the asset loader's buffers; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct PartGeometry {
    parts: HashMap<String, PartMesh>,
}

fn triangle_area(tri: [DVec2; 3]) -> f64 {
    ((tri[1] - tri[0]).perp_dot(tri[2] - tri[0]) * 0.5).abs()
}

impl PartGeometry {
    pub fn new() -> PartGeometry {
        PartGeometry::default()
    }

    /// Builds one part's triangle list from raw loader buffers: index
    /// triples into interleaved `[x, y]` positions and `[u, v]` UVs.
    ///
    /// Positions are remapped to `(x, 1 - y) * CANVAS_SCALE`, UVs flipped
    /// to `(u, 1 - v)`. Out-of-range indices and zero-area UV triangles
    /// are rejected here, so evaluation never sees them.
    pub fn insert_buffers(
        &mut self,
        id: impl Into<String>,
        indices: &[u16],
        positions: &[f32],
        uvs: &[f32],
        draw_order: i32,
    ) -> Result<(), PuppetError> {
        let id = id.into();
        if indices.len() % 3 != 0 {
            return Err(PuppetError::RaggedIndexBuffer {
                part: id,
                len: indices.len(),
            });
        }
        let vertex_count = positions.len().min(uvs.len()) / 2;

        let mut triangles = Vec::with_capacity(indices.len() / 3);
        for triple in indices.chunks_exact(3) {
            let mut tri_positions = [DVec2::ZERO; 3];
            let mut tri_uvs = [DVec2::ZERO; 3];
            for (corner, &index) in triple.iter().enumerate() {
                let index = index as usize;
                if index >= vertex_count {
                    return Err(PuppetError::IndexOutOfRange { part: id, index });
                }
                let px = positions[index * 2] as f64;
                let py = positions[index * 2 + 1] as f64;
                let u = uvs[index * 2] as f64;
                let v = uvs[index * 2 + 1] as f64;
                tri_positions[corner] = dvec2(px, 1.0 - py) * CANVAS_SCALE;
                tri_uvs[corner] = dvec2(u, 1.0 - v);
            }
            triangles.push(Triangle {
                positions: tri_positions,
                uvs: tri_uvs,
            });
        }
        self.insert_triangles(id, triangles, draw_order)
    }

    /// Inserts already-remapped triangles for one part.
    pub fn insert_triangles(
        &mut self,
        id: impl Into<String>,
        triangles: Vec<Triangle>,
        draw_order: i32,
    ) -> Result<(), PuppetError> {
        let id = id.into();
        if self.parts.contains_key(&id) {
            return Err(PuppetError::DuplicateGeometry { part: id });
        }
        for (i, tri) in triangles.iter().enumerate() {
            if triangle_area(tri.uvs) < f64::EPSILON {
                return Err(PuppetError::DegenerateTriangle {
                    part: id,
                    triangle: i,
                });
            }
        }
        self.parts.insert(
            id,
            PartMesh {
                triangles,
                draw_order,
            },
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&PartMesh> {
        self.parts.get(id)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
