//! Structs and functions for handling textures.
//!
//! The module provides the [`Texture`] struct which is a CPU representation of a GPU texture.

use std::path::Path;
use std::sync::Arc;

use glow::HasContext;
use image::{DynamicImage, GenericImageView};

/// Represents a texture stored on the GPU side.
pub struct Texture {
    gl: Arc<glow::Context>,
    id: glow::Texture,
}

impl Texture {
    /// Decodes an image file from disk and uploads it.
    pub fn open(gl: &Arc<glow::Context>, path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| format!("failed to load texture {}: {e}", path.display()))?;
        Ok(Self::new(gl, &image))
    }

    /// Creates a new texture from the given [`image::DynamicImage`].
    pub fn new(gl: &Arc<glow::Context>, image: &DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        let data = image.to_rgba8().into_raw();
        unsafe {
            let texture = gl.create_texture().unwrap();
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(data.as_slice())),
            );
            gl.generate_mipmap(glow::TEXTURE_2D);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            gl.bind_texture(glow::TEXTURE_2D, None);

            Self {
                gl: Arc::clone(gl),
                id: texture,
            }
        }
    }

    /// Binds the texture to the specified texture unit.
    pub fn bind_to_unit(&self, unit: u32) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(self.id));
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_texture(self.id);
        }
    }
}
