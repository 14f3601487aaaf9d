use image::ImageFormat;

use crate::data_structures::{name::ResourceName, texture::TextureImage};

/// Turns fetched texture bytes into the handle batches bind.
///
/// Proprietary texture containers plug in here; the resolver and compositor
/// only ever see `Self::Texture`.
pub trait TextureDecoder {
    type Texture;

    fn decode(&self, name: &ResourceName, bytes: &[u8]) -> anyhow::Result<Self::Texture>;
}

/// Decodes anything the `image` crate understands into RGBA8.
#[derive(Clone, Debug, Default)]
pub struct ImageDecoder {
    /// Format hint (file extension); guessed from the bytes when `None`.
    pub format: Option<String>,
}

impl ImageDecoder {
    pub fn with_format(format: &str) -> Self {
        Self {
            format: Some(format.to_string()),
        }
    }
}

impl TextureDecoder for ImageDecoder {
    type Texture = TextureImage;

    fn decode(&self, name: &ResourceName, bytes: &[u8]) -> anyhow::Result<TextureImage> {
        let img = match self.format.as_deref().and_then(ImageFormat::from_extension) {
            Some(format) => image::load_from_memory_with_format(bytes, format)?,
            None => image::load_from_memory(bytes)?,
        };
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(TextureImage {
            name: name.clone(),
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }
}
