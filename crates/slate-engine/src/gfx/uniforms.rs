//! Uniform declarations and their packed byte layout.
//!
//! Layout rules (compatible with WGSL uniform address space):
//! - every declaration starts on a 16-byte boundary
//! - scalars and vectors occupy one 16-byte slot per element
//! - `Mat4` occupies 64 bytes per element
//!
//! Integer arrays must therefore be declared as `array<vec4<i32>, N>` in
//! WGSL and read through `.x`.

use crate::coords::Mat4;

use super::GfxError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    Mat4,
}

impl UniformKind {
    #[inline]
    const fn element_stride(self) -> u64 {
        match self {
            UniformKind::Mat4 => 64,
            _ => 16,
        }
    }
}

/// One member of a shader's uniform block, in declaration order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UniformDecl {
    pub name: &'static str,
    pub kind: UniformKind,
    /// Array length; `1` for non-arrays.
    pub count: u32,
}

impl UniformDecl {
    #[inline]
    pub const fn new(name: &'static str, kind: UniformKind) -> Self {
        Self { name, kind, count: 1 }
    }

    #[inline]
    pub const fn array(name: &'static str, kind: UniformKind, count: u32) -> Self {
        Self { name, kind, count }
    }
}

/// Value written through `GraphicsBackend::set_uniform`.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Int(i32),
    /// Writes the leading `len()` elements of an `Int` array.
    IntArray(Vec<i32>),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Int(_) | UniformValue::IntArray(_) => UniformKind::Int,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    fn element_count(&self) -> usize {
        match self {
            UniformValue::IntArray(v) => v.len(),
            _ => 1,
        }
    }
}

/// Packed uniform block of one shader program.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlock {
    decls: Vec<UniformDecl>,
    offsets: Vec<u64>,
    size: u64,
}

impl UniformBlock {
    pub fn new(decls: &[UniformDecl]) -> Self {
        let mut offsets = Vec::with_capacity(decls.len());
        let mut cursor = 0u64;
        for d in decls {
            offsets.push(cursor);
            cursor += d.kind.element_stride() * u64::from(d.count.max(1));
        }
        Self {
            decls: decls.to_vec(),
            offsets,
            size: cursor,
        }
    }

    /// Total size in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.decls.iter().position(|d| d.name == name)
    }

    #[inline]
    pub fn decl(&self, index: usize) -> Option<&UniformDecl> {
        self.decls.get(index)
    }

    #[inline]
    pub fn offset(&self, index: usize) -> Option<u64> {
        self.offsets.get(index).copied()
    }

    /// Packs `value` into `dst` at the location of declaration `index`.
    ///
    /// `dst` must be at least [`size`](Self::size) bytes long.
    pub fn write(&self, index: usize, value: &UniformValue, dst: &mut [u8]) -> Result<(), GfxError> {
        let (Some(decl), Some(base)) = (self.decl(index), self.offset(index)) else {
            return Err(GfxError::UniformMismatch {
                name: format!("#{index}"),
                message: "no such uniform".to_string(),
            });
        };

        if value.kind() != decl.kind {
            return Err(GfxError::UniformMismatch {
                name: decl.name.to_string(),
                message: format!("declared {:?}, got {:?}", decl.kind, value.kind()),
            });
        }
        if value.element_count() > decl.count.max(1) as usize {
            return Err(GfxError::UniformMismatch {
                name: decl.name.to_string(),
                message: format!(
                    "{} elements written to an array of {}",
                    value.element_count(),
                    decl.count
                ),
            });
        }
        debug_assert!(dst.len() as u64 >= self.size, "uniform staging buffer too small");

        let stride = decl.kind.element_stride() as usize;
        let base = base as usize;
        let mut put = |element: usize, bytes: &[u8]| {
            let at = base + element * stride;
            dst[at..at + bytes.len()].copy_from_slice(bytes);
        };

        match value {
            UniformValue::Float(v) => put(0, bytemuck::bytes_of(v)),
            UniformValue::Vec2(v) => put(0, bytemuck::cast_slice(v)),
            UniformValue::Vec3(v) => put(0, bytemuck::cast_slice(v)),
            UniformValue::Vec4(v) => put(0, bytemuck::cast_slice(v)),
            UniformValue::Int(v) => put(0, bytemuck::bytes_of(v)),
            UniformValue::IntArray(values) => {
                for (i, v) in values.iter().enumerate() {
                    put(i, bytemuck::bytes_of(v));
                }
            }
            UniformValue::Mat4(m) => put(0, bytemuck::cast_slice(m.as_slice())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> UniformBlock {
        UniformBlock::new(&[
            UniformDecl::new("world", UniformKind::Mat4),
            UniformDecl::array("textures", UniformKind::Int, 3),
            UniformDecl::new("tint", UniformKind::Vec4),
        ])
    }

    fn read_i32(bytes: &[u8], at: usize) -> i32 {
        i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    #[test]
    fn offsets_follow_16_byte_slots() {
        let b = block();
        assert_eq!(b.offset(0), Some(0));
        assert_eq!(b.offset(1), Some(64));
        assert_eq!(b.offset(2), Some(64 + 3 * 16));
        assert_eq!(b.size(), 64 + 48 + 16);
    }

    #[test]
    fn int_array_elements_land_on_slot_starts() {
        let b = block();
        let mut data = vec![0u8; b.size() as usize];
        b.write(1, &UniformValue::IntArray(vec![0, 1, -1]), &mut data).unwrap();
        assert_eq!(read_i32(&data, 64), 0);
        assert_eq!(read_i32(&data, 80), 1);
        assert_eq!(read_i32(&data, 96), -1);
    }

    #[test]
    fn mat4_is_written_column_major() {
        let b = block();
        let mut data = vec![0u8; b.size() as usize];
        let m = Mat4::orthographic(0.0, 10.0, 10.0, 0.0, -1.0, 1.0);
        b.write(0, &UniformValue::Mat4(m), &mut data).unwrap();
        let floats: Vec<f32> = bytemuck::pod_collect_to_vec(&data[..64]);
        assert_eq!(floats.as_slice(), m.as_slice());
    }

    #[test]
    fn rejects_kind_mismatch() {
        let b = block();
        let mut data = vec![0u8; b.size() as usize];
        let err = b.write(2, &UniformValue::Float(1.0), &mut data).unwrap_err();
        assert!(matches!(err, GfxError::UniformMismatch { .. }));
    }

    #[test]
    fn rejects_oversized_array() {
        let b = block();
        let mut data = vec![0u8; b.size() as usize];
        assert!(b.write(1, &UniformValue::IntArray(vec![0; 4]), &mut data).is_err());
    }

    #[test]
    fn index_of_finds_declarations() {
        let b = block();
        assert_eq!(b.index_of("textures"), Some(1));
        assert_eq!(b.index_of("missing"), None);
    }
}
