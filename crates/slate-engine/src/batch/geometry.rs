use super::{BatchError, Vertex};

/// Default vertex capacity of a frame.
pub const MAX_VERTICES: usize = 5000;

/// Two triangles per quad, relative to the quad's first vertex.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Fixed-capacity CPU vertex and index storage for one frame.
///
/// Storage is allocated once; [`reset`](Self::reset) only rewinds it.
#[derive(Debug, Clone)]
pub struct GeometryBuffer {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    max_vertices: usize,
    max_indices: usize,
}

impl GeometryBuffer {
    /// A non-zero multiple of 4 whose index range and buffer sizes fit the
    /// 32-bit index format.
    pub fn is_valid_capacity(max_vertices: usize) -> bool {
        if max_vertices == 0 || max_vertices % 4 != 0 {
            return false;
        }
        let Some(max_indices) = max_vertices.checked_mul(4) else {
            return false;
        };
        u32::try_from(max_indices).is_ok()
            && max_vertices.checked_mul(size_of::<Vertex>()).is_some()
            && max_indices.checked_mul(size_of::<u32>()).is_some()
    }

    /// Room for `max_vertices` vertices and four times as many indices.
    pub fn new(max_vertices: usize) -> Self {
        let max_indices = max_vertices * 4;
        Self {
            vertices: Vec::with_capacity(max_vertices),
            indices: Vec::with_capacity(max_indices),
            max_vertices,
            max_indices,
        }
    }

    pub fn reset(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Appends one quad. On overflow nothing is written.
    pub fn append_quad(&mut self, quad: [Vertex; 4]) -> Result<(), BatchError> {
        if self.vertices.len() + 4 > self.max_vertices
            || self.indices.len() + QUAD_INDICES.len() > self.max_indices
        {
            return Err(BatchError::GeometryFull {
                vertices: self.vertices.len(),
                capacity: self.max_vertices,
            });
        }

        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&quad);
        self.indices.extend(QUAD_INDICES.iter().map(|i| base + i));
        Ok(())
    }

    /// True when another quad fits.
    #[inline]
    pub fn has_room(&self) -> bool {
        self.vertices.len() + 4 <= self.max_vertices
            && self.indices.len() + QUAD_INDICES.len() <= self.max_indices
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    #[inline]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn vertex_capacity(&self) -> usize {
        self.max_vertices
    }

    #[inline]
    pub fn index_capacity(&self) -> usize {
        self.max_indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> [Vertex; 4] {
        [Vertex::default(); 4]
    }

    #[test]
    fn capacity_must_fit_u32_indices() {
        assert!(GeometryBuffer::is_valid_capacity(MAX_VERTICES));
        assert!(GeometryBuffer::is_valid_capacity(u32::MAX as usize / 4 / 4 * 4));
        assert!(!GeometryBuffer::is_valid_capacity(0));
        assert!(!GeometryBuffer::is_valid_capacity(10));
        assert!(!GeometryBuffer::is_valid_capacity(1 << 32));
        assert!(!GeometryBuffer::is_valid_capacity(1 << 62));
    }

    #[test]
    fn indices_are_offset_by_quad_base() {
        let mut g = GeometryBuffer::new(8);
        g.append_quad(quad()).unwrap();
        g.append_quad(quad()).unwrap();
        assert_eq!(g.indices(), &[0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]);
        assert_eq!(g.quad_count(), 2);
    }

    #[test]
    fn full_buffer_rejects_without_writing() {
        let mut g = GeometryBuffer::new(4);
        g.append_quad(quad()).unwrap();
        assert!(!g.has_room());
        assert_eq!(
            g.append_quad(quad()),
            Err(BatchError::GeometryFull { vertices: 4, capacity: 4 })
        );
        assert_eq!(g.vertex_count(), 4);
        assert_eq!(g.index_count(), 6);
    }

    #[test]
    fn reset_keeps_allocation() {
        let mut g = GeometryBuffer::new(MAX_VERTICES);
        g.append_quad(quad()).unwrap();
        g.reset();
        assert!(g.is_empty());
        assert_eq!(g.index_count(), 0);
        assert!(g.vertices.capacity() >= MAX_VERTICES);
        assert_eq!(g.index_capacity(), 4 * MAX_VERTICES);
    }

    #[test]
    fn byte_views_cover_live_region() {
        let mut g = GeometryBuffer::new(16);
        g.append_quad(quad()).unwrap();
        assert_eq!(g.vertex_bytes().len(), 4 * 40);
        assert_eq!(g.index_bytes().len(), 6 * 4);
    }
}
