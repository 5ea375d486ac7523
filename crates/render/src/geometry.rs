use std::f32::consts::PI;

/// UV sphere description. Vertex data is generated on demand by the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereGeometry {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl SphereGeometry {
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self {
            radius,
            width_segments: width_segments.max(3),
            height_segments: height_segments.max(2),
        }
    }

    /// Generate positions, normals, uvs and triangle indices.
    ///
    /// Rows run from the north pole (+Y) to the south pole; the seam column is
    /// duplicated so uvs wrap cleanly.
    pub fn build(&self) -> MeshData {
        let cols = self.width_segments;
        let rows = self.height_segments;
        let mut data = MeshData::default();

        for iy in 0..=rows {
            let v = iy as f32 / rows as f32;
            for ix in 0..=cols {
                let u = ix as f32 / cols as f32;
                let normal = [
                    -(u * 2.0 * PI).cos() * (v * PI).sin(),
                    (v * PI).cos(),
                    (u * 2.0 * PI).sin() * (v * PI).sin(),
                ];
                data.positions.push([
                    normal[0] * self.radius,
                    normal[1] * self.radius,
                    normal[2] * self.radius,
                ]);
                data.normals.push(normal);
                data.uvs.push([u, 1.0 - v]);
            }
        }

        let stride = cols + 1;
        for iy in 0..rows {
            for ix in 0..cols {
                let a = iy * stride + ix + 1;
                let b = iy * stride + ix;
                let c = (iy + 1) * stride + ix;
                let d = (iy + 1) * stride + ix + 1;
                // Degenerate triangles at the poles are skipped.
                if iy != 0 {
                    data.indices.extend_from_slice(&[a, b, d]);
                }
                if iy != rows - 1 {
                    data.indices.extend_from_slice(&[b, c, d]);
                }
            }
        }
        data
    }
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Line-list indices covering every triangle edge, for wireframe drawing.
    pub fn edge_indices(&self) -> Vec<u32> {
        let mut edges = Vec::with_capacity(self.indices.len() * 2);
        for tri in self.indices.chunks_exact(3) {
            edges.extend_from_slice(&[tri[0], tri[1], tri[1], tri[2], tri[2], tri[0]]);
        }
        edges
    }
}
