//! Decoded texture images.
//!
//! The compositor treats textures as opaque handles; [`TextureImage`] is the
//! handle produced by the bundled [`ImageDecoder`](crate::resources::texture::ImageDecoder).
//! It carries what a renderer needs to create and fill the GPU texture.

use crate::data_structures::name::ResourceName;

/// CPU-side RGBA8 texture ready for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureImage {
    pub name: ResourceName,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureImage {
    /// Color format the rgba bytes are meant to be uploaded as.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    pub fn size(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width.max(1),
            height: self.height.max(1),
            depth_or_array_layers: 1,
        }
    }

    /// Bytes per row for a tightly packed upload.
    pub fn bytes_per_row(&self) -> u32 {
        4 * self.width
    }
}
