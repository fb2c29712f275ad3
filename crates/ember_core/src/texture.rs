//! In-memory textures referenced by material properties.

use glam::Vec4;

/// A texture with linear RGBA texels, row-major, row 0 at the top.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<Vec4>,
}

impl Texture {
    /// Create a texture. Missing texels are filled with opaque black.
    pub fn new(width: u32, height: u32, mut texels: Vec<Vec4>) -> Self {
        texels.resize((width * height) as usize, Vec4::W);
        Self { width, height, texels }
    }

    /// Single-texel texture.
    pub fn solid(color: Vec4) -> Self {
        Self::new(1, 1, vec![color])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_pads_missing_texels() {
        let tex = Texture::new(2, 2, vec![Vec4::ONE]);
        assert_eq!(tex.texels.len(), 4);
        assert_eq!(tex.texels[3], Vec4::W);
    }
}
