use std::path::PathBuf;

use wgpu::util::DeviceExt;

use crate::error::{RenderError, Result};

/// Where texture pixels come from.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureSource {
    /// Image file decoded with the `image` crate (PNG, JPEG, BMP, GIF).
    Path(PathBuf),
    /// Already-decoded straight-alpha RGBA8 pixels, row-major, top row first.
    Rgba8 {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
}

impl TextureSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Two-tone checkerboard of `size`x`size` pixels with `cell`-pixel squares.
    pub fn checkerboard(size: u32, cell: u32) -> Self {
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity(rgba8_len(size, size));
        for y in 0..size {
            for x in 0..size {
                let light = ((x / cell) + (y / cell)) % 2 == 0;
                let texel = if light {
                    [0xee, 0xee, 0xee, 0xff]
                } else {
                    [0x33, 0x66, 0xcc, 0xff]
                };
                pixels.extend_from_slice(&texel);
            }
        }
        Self::Rgba8 {
            width: size,
            height: size,
            pixels,
        }
    }

    /// Human-readable name used in logs and errors.
    pub fn name(&self) -> String {
        match self {
            Self::Path(p) => p.display().to_string(),
            Self::Rgba8 { width, height, .. } => format!("<rgba8 {width}x{height}>"),
        }
    }

    /// Resolves the source to RGBA8 pixels.
    pub fn decode(&self) -> Result<DecodedImage> {
        match self {
            Self::Path(path) => {
                let img = image::open(path).map_err(|e| RenderError::texture(self.name(), e))?;
                let rgba = img.to_rgba8();
                let (width, height) = rgba.dimensions();
                DecodedImage::new(&self.name(), width, height, rgba.into_raw())
            }
            Self::Rgba8 {
                width,
                height,
                pixels,
            } => DecodedImage::new(&self.name(), *width, *height, pixels.clone()),
        }
    }
}

/// RGBA8 pixels with validated dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    fn new(name: &str, width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::texture(name, "image has zero size"));
        }
        let expected = rgba8_len(width, height);
        if pixels.len() != expected {
            return Err(RenderError::texture(
                name,
                format!("expected {expected} bytes of RGBA8 data, got {}", pixels.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}

/// Byte length of a tightly packed RGBA8 image.
fn rgba8_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// Fixed sampler policy for a texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SamplerConfig {
    pub filter: wgpu::FilterMode,
    pub wrap: wgpu::AddressMode,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            filter: wgpu::FilterMode::Linear,
            wrap: wgpu::AddressMode::ClampToEdge,
        }
    }
}

impl SamplerConfig {
    /// Nearest filtering for pixel-art sprites.
    pub fn pixel_art() -> Self {
        Self {
            filter: wgpu::FilterMode::Nearest,
            ..Self::default()
        }
    }

    fn descriptor<'a>(&self, label: &'a str) -> wgpu::SamplerDescriptor<'a> {
        wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: self.wrap,
            address_mode_v: self.wrap,
            address_mode_w: self.wrap,
            mag_filter: self.filter,
            min_filter: self.filter,
            ..Default::default()
        }
    }
}

/// Texture resident on the device, with a view and a sampler.
///
/// Never mutated after creation.
#[derive(Debug)]
pub struct Texture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl Texture {
    /// Texel format used for every loaded texture.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Decodes `source` and uploads it.
    ///
    /// Runs synchronously on the calling thread: file reads and decoding
    /// block until done. Images larger than the device's 2D texture limit
    /// are rejected before anything is created.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        source: &TextureSource,
        sampler: SamplerConfig,
    ) -> Result<Self> {
        let image = source.decode()?;
        let max = device.limits().max_texture_dimension_2d;
        if image.width > max || image.height > max {
            return Err(RenderError::texture(
                source.name(),
                format!(
                    "{}x{} exceeds the device limit of {max} texels per side",
                    image.width, image.height
                ),
            ));
        }
        let label = format!("tessera texture {}", source.name());

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(&label),
                size: wgpu::Extent3d {
                    width: image.width,
                    height: image.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: Self::FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &image.pixels,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&sampler.descriptor("tessera texture sampler"));

        log::info!(
            "loaded texture {} ({}x{})",
            source.name(),
            image.width,
            image.height
        );

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkerboard_has_rgba8_layout() {
        let img = TextureSource::checkerboard(8, 2).decode().unwrap();
        assert_eq!((img.width, img.height), (8, 8));
        assert_eq!(img.pixels.len(), 8 * 8 * 4);
        // Cells alternate along a row.
        assert_ne!(img.pixels[0..4], img.pixels[8..12]);
        assert_eq!(img.pixels[0..4], img.pixels[4..8]);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn rgba8_len_does_not_wrap_u32() {
        // 65536 * 65536 * 4 wraps to zero in u32 arithmetic.
        assert_eq!(rgba8_len(65_536, 65_536), 1usize << 34);
        assert_eq!(rgba8_len(40_000, 1), 160_000);
    }

    #[test]
    fn rgba8_length_mismatch_fails() {
        let src = TextureSource::Rgba8 {
            width: 2,
            height: 2,
            pixels: vec![0; 15],
        };
        assert!(matches!(src.decode(), Err(RenderError::TextureLoad { .. })));
    }

    #[test]
    fn zero_sized_image_fails() {
        let src = TextureSource::Rgba8 {
            width: 0,
            height: 4,
            pixels: vec![],
        };
        assert!(matches!(src.decode(), Err(RenderError::TextureLoad { .. })));
    }

    #[test]
    fn missing_file_is_a_texture_load_failure() {
        let src = TextureSource::path("does/not/exist/uv_test.png");
        match src.decode() {
            Err(RenderError::TextureLoad { source_name, .. }) => {
                assert!(source_name.ends_with("uv_test.png"));
            }
            other => panic!("expected TextureLoad, got {other:?}"),
        }
    }

    #[test]
    fn sampler_presets() {
        assert_eq!(SamplerConfig::default().filter, wgpu::FilterMode::Linear);
        assert_eq!(SamplerConfig::pixel_art().filter, wgpu::FilterMode::Nearest);
        assert_eq!(SamplerConfig::pixel_art().wrap, wgpu::AddressMode::ClampToEdge);
    }
}
