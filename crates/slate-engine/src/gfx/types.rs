/// Number of shader-visible texture slots usable by one draw call.
///
/// Fixed by the sampler array declared in the batch shader.
pub const TEX_SLOT_CAPACITY: usize = 10;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        ///
        /// Handles are deliberately neither `Copy` nor `Clone`: destroying one
        /// consumes it, so a dropped resource cannot be bound again.
        #[derive(Debug, PartialEq, Eq, Hash)]
        pub struct $name(u32);

        impl $name {
            /// Wraps a raw backend identifier. Intended for backend implementations.
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(&self) -> u32 {
                self.0
            }
        }
    };
}

handle!(
    /// Vertex array object: vertex layout plus the vertex buffer it reads from.
    VertexArrayId
);
handle!(
    /// Vertex or index buffer object.
    BufferId
);
handle!(
    /// Linked shader program.
    ShaderId
);
handle!(
    /// GPU texture object.
    TextureId
);

/// Binding point of a buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    /// 32-bit unsigned element indices.
    Index,
}

/// Update frequency hint supplied at buffer creation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once.
    Static,
    /// Rewritten by sub-range updates every frame.
    Dynamic,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    #[default]
    Linear,
    Nearest,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AttributeFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
}

impl AttributeFormat {
    /// Size in bytes.
    #[inline]
    pub const fn size(self) -> u32 {
        match self {
            AttributeFormat::Float32 => 4,
            AttributeFormat::Float32x2 => 8,
            AttributeFormat::Float32x3 => 12,
            AttributeFormat::Float32x4 => 16,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: AttributeFormat,
    pub offset: u32,
}

/// Interleaved vertex layout (one buffer, tightly packed).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: &'static [VertexAttribute],
}

impl VertexLayout {
    /// True when every attribute fits inside the stride.
    pub fn is_consistent(&self) -> bool {
        self.attributes
            .iter()
            .all(|a| a.offset + a.format.size() <= self.stride)
    }
}

/// Resolved uniform of a specific shader program.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    pub(crate) shader: u32,
    pub(crate) index: usize,
}

impl UniformLocation {
    /// Intended for backend implementations.
    #[inline]
    pub const fn new(shader: u32, index: usize) -> Self {
        Self { shader, index }
    }

    #[inline]
    pub const fn shader(&self) -> u32 {
        self.shader
    }

    #[inline]
    pub const fn index(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTRS: [VertexAttribute; 2] = [
        VertexAttribute { location: 0, format: AttributeFormat::Float32x3, offset: 0 },
        VertexAttribute { location: 1, format: AttributeFormat::Float32, offset: 12 },
    ];

    #[test]
    fn layout_consistency() {
        assert!(VertexLayout { stride: 16, attributes: &ATTRS }.is_consistent());
        assert!(!VertexLayout { stride: 12, attributes: &ATTRS }.is_consistent());
    }
}
