use super::TextureId;

/// Caller-owned GPU texture.
///
/// Created by `Renderer::load_texture` and released with
/// `Renderer::destroy_texture`, which consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    #[inline]
    pub(crate) fn new(id: TextureId, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    #[inline]
    pub fn id(&self) -> &TextureId {
        &self.id
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub(crate) fn into_id(self) -> TextureId {
        self.id
    }
}
