//! Flat per-particle position and color buffers, laid out the way a GPU
//! point-cloud upload expects them (three `f32` per vertex).

/// Position and color attribute buffers with upload-pending flags.
#[derive(Debug, Clone)]
pub struct PointCloud {
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
    positions_dirty: bool,
    colors_dirty: bool,
}

impl PointCloud {
    /// `len` vertices at the origin, black, flagged for upload.
    pub fn new(len: usize) -> Self {
        Self {
            positions: vec![[0.0; 3]; len],
            colors: vec![[0.0; 3]; len],
            positions_dirty: true,
            colors_dirty: true,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Linear RGB per vertex.
    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    pub fn set_position(&mut self, index: usize, position: [f32; 3]) {
        self.positions[index] = position;
    }

    /// Writes x and z only; the vertex keeps its height.
    pub fn set_orbit_position(&mut self, index: usize, x: f32, z: f32) {
        let p = &mut self.positions[index];
        p[0] = x;
        p[2] = z;
    }

    pub fn set_color(&mut self, index: usize, color: [f32; 3]) {
        self.colors[index] = color;
    }

    /// Flags both buffers as changed since the last upload.
    pub fn mark_dirty(&mut self) {
        self.positions_dirty = true;
        self.colors_dirty = true;
    }

    pub fn positions_dirty(&self) -> bool {
        self.positions_dirty
    }

    pub fn colors_dirty(&self) -> bool {
        self.colors_dirty
    }

    /// Called by a renderer once it has consumed both buffers.
    pub fn mark_uploaded(&mut self) {
        self.positions_dirty = false;
        self.colors_dirty = false;
    }
}
