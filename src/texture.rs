use std::{collections::HashSet, fs, path::Path};

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage, imageops::FilterType};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pixel layout of a texture payload as stored in the source container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureFormat {
    Rgb8,
    #[default]
    Rgba8,
    Dxt1,
    Dxt3,
    Dxt5,
    Ati2,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Texture {
    pub id: i32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub format: TextureFormat,
    /// Top-level mip payload.
    #[serde(default)]
    pub data: Vec<u8>,
}

impl Texture {
    /// File name under which the texture is written next to the scene.
    pub fn file_name(&self) -> String {
        let stem = match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => sanitize_file_stem(name),
            _ => format!("texture_{}", self.id),
        };
        format!("{stem}.png")
    }
}

fn sanitize_file_stem(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextureSet {
    pub textures: Vec<Texture>,
}

impl TextureSet {
    pub fn find(&self, id: i32) -> Option<&Texture> {
        self.textures.iter().find(|texture| texture.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureEntry {
    pub id: i32,
    pub name: String,
}

/// Lookup table from texture ids to readable names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextureDatabase {
    pub textures: Vec<TextureEntry>,
}

impl TextureDatabase {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read texture database: {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse texture database: {}", path.display()))
    }

    pub fn resolve_name(&self, texture: &Texture) -> Option<&str> {
        self.textures
            .iter()
            .find(|entry| entry.id == texture.id)
            .map(|entry| entry.name.as_str())
    }
}

/// Returns a copy of `textures` named after the database entries.
///
/// Textures unknown to the database keep their current name. The input set
/// is left untouched.
pub fn rename_textures(textures: &TextureSet, database: Option<&TextureDatabase>) -> TextureSet {
    let Some(database) = database else {
        return textures.clone();
    };

    TextureSet {
        textures: textures
            .textures
            .iter()
            .map(|texture| Texture {
                name: database
                    .resolve_name(texture)
                    .map(ToOwned::to_owned)
                    .or_else(|| texture.name.clone()),
                ..texture.clone()
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureError {
    #[error("texture {id} uses {format:?}, which this decoder cannot read")]
    UnsupportedFormat { id: i32, format: TextureFormat },

    #[error("texture {id} payload has {actual} bytes, expected {expected}")]
    PayloadSize {
        id: i32,
        expected: usize,
        actual: usize,
    },
}

/// Turns a texture record into pixels that can be written to disk.
pub trait TextureDecoder {
    fn decode(&self, texture: &Texture) -> Result<DynamicImage, TextureError>;
}

/// Decoder for uncompressed RGB/RGBA payloads. Block-compressed formats are
/// left to a dedicated decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTextureDecoder;

impl TextureDecoder for RawTextureDecoder {
    fn decode(&self, texture: &Texture) -> Result<DynamicImage, TextureError> {
        let channels = match texture.format {
            TextureFormat::Rgb8 => 3,
            TextureFormat::Rgba8 => 4,
            format => {
                return Err(TextureError::UnsupportedFormat {
                    id: texture.id,
                    format,
                });
            }
        };

        let expected = texture.width as usize * texture.height as usize * channels;
        let size_error = || TextureError::PayloadSize {
            id: texture.id,
            expected,
            actual: texture.data.len(),
        };
        if texture.data.len() != expected {
            return Err(size_error());
        }

        let data = texture.data.clone();
        let image = if channels == 3 {
            RgbImage::from_raw(texture.width, texture.height, data).map(DynamicImage::ImageRgb8)
        } else {
            RgbaImage::from_raw(texture.width, texture.height, data).map(DynamicImage::ImageRgba8)
        };
        image.ok_or_else(size_error)
    }
}

/// Interpolation method used for texture resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResizeInterpolation {
    /// Fast nearest-neighbor interpolation.
    Nearest,
    /// Bilinear interpolation (`image`'s `Triangle` filter).
    #[default]
    Bilinear,
    /// Bicubic interpolation (`image`'s `CatmullRom` filter).
    Bicubic,
    /// Lanczos (windowed sinc) interpolation.
    Lanczos3,
}

impl From<ResizeInterpolation> for FilterType {
    fn from(value: ResizeInterpolation) -> Self {
        match value {
            ResizeInterpolation::Nearest => FilterType::Nearest,
            ResizeInterpolation::Bilinear => FilterType::Triangle,
            ResizeInterpolation::Bicubic => FilterType::CatmullRom,
            ResizeInterpolation::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Resize image to fit within a square of `max_size` while preserving aspect
/// ratio. Smaller images are returned unchanged.
pub fn resize_texture_to_max(
    image: DynamicImage,
    max_size: u32,
    interpolation: ResizeInterpolation,
) -> DynamicImage {
    if image.width() <= max_size && image.height() <= max_size {
        return image;
    }

    image.resize(max_size, max_size, interpolation.into())
}

/// Options for writing side-car textures.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextureExportOptions {
    pub max_size: Option<u32>,
    pub interpolation: ResizeInterpolation,
}

/// Decodes each texture and writes it as `<dir>/<file_name>`.
///
/// Textures the decoder rejects are skipped with a warning. Returns the
/// number of files written.
pub fn save_textures<'a>(
    textures: impl IntoIterator<Item = (&'a Texture, &'a str)>,
    output_dir: &Path,
    decoder: &dyn TextureDecoder,
    options: TextureExportOptions,
) -> Result<usize> {
    fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "failed to create texture output directory: {}",
            output_dir.display()
        )
    })?;

    let mut written = HashSet::new();
    for (texture, file_name) in textures {
        if written.contains(file_name) {
            continue;
        }

        let image = match decoder.decode(texture) {
            Ok(image) => image,
            Err(err) => {
                warn!("skipping texture '{file_name}': {err}");
                continue;
            }
        };
        let image = match options.max_size {
            Some(max_size) => resize_texture_to_max(image, max_size, options.interpolation),
            None => image,
        };

        let path = output_dir.join(file_name);
        image
            .save_with_format(&path, ImageFormat::Png)
            .with_context(|| format!("failed to write texture: {}", path.display()))?;
        debug!("wrote texture {}", path.display());
        written.insert(file_name);
    }

    Ok(written.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn rgba_texture(id: i32, name: Option<&str>, size: u32) -> Texture {
        Texture {
            id,
            name: name.map(ToOwned::to_owned),
            width: size,
            height: size,
            format: TextureFormat::Rgba8,
            data: vec![255; (size * size * 4) as usize],
        }
    }

    #[test]
    fn given_unnamed_texture_when_building_file_name_then_id_is_used() {
        let texture = rgba_texture(17, None, 1);

        assert_eq!(texture.file_name(), "texture_17.png");
    }

    #[test]
    fn given_name_with_separators_when_building_file_name_then_they_are_replaced() {
        let texture = rgba_texture(1, Some("chara/body:01"), 1);

        assert_eq!(texture.file_name(), "chara_body_01.png");
    }

    #[test]
    fn given_database_when_renaming_then_copy_is_renamed_and_source_is_untouched() {
        let source = TextureSet {
            textures: vec![
                rgba_texture(5, Some("5"), 1),
                rgba_texture(6, Some("keep"), 1),
            ],
        };
        let database = TextureDatabase {
            textures: vec![TextureEntry {
                id: 5,
                name: "MIK_SKIN".to_string(),
            }],
        };

        let renamed = rename_textures(&source, Some(&database));

        assert_eq!(renamed.textures[0].name.as_deref(), Some("MIK_SKIN"));
        assert_eq!(renamed.textures[1].name.as_deref(), Some("keep"));
        assert_eq!(source.textures[0].name.as_deref(), Some("5"));
    }

    #[test]
    fn given_compressed_texture_when_decoding_raw_then_format_is_rejected() {
        let texture = Texture {
            format: TextureFormat::Dxt5,
            ..rgba_texture(3, None, 4)
        };

        let err = RawTextureDecoder.decode(&texture).unwrap_err();

        assert_eq!(
            err,
            TextureError::UnsupportedFormat {
                id: 3,
                format: TextureFormat::Dxt5
            }
        );
    }

    #[test]
    fn given_short_payload_when_decoding_raw_then_size_error_is_returned() {
        let mut texture = rgba_texture(3, None, 4);
        texture.data.truncate(10);

        assert!(matches!(
            RawTextureDecoder.decode(&texture),
            Err(TextureError::PayloadSize { actual: 10, .. })
        ));
    }

    #[test]
    fn given_large_texture_when_resize_with_lanczos_then_image_fits_bounds() {
        let source = DynamicImage::ImageRgba8(RgbaImage::new(2048, 1024));

        let resized = resize_texture_to_max(source, 1024, ResizeInterpolation::Lanczos3);

        assert_eq!(resized.dimensions(), (1024, 512));
    }

    #[test]
    fn given_small_texture_when_resize_then_original_size_is_kept() {
        let source = DynamicImage::ImageRgba8(RgbaImage::new(512, 512));

        let resized = resize_texture_to_max(source, 1024, ResizeInterpolation::Bilinear);

        assert_eq!(resized.dimensions(), (512, 512));
    }

    #[test]
    fn given_textures_when_saving_then_png_files_are_written_once() {
        let dir = std::env::temp_dir().join("model2scene_save_textures_test");
        let _ = fs::remove_dir_all(&dir);
        let good = rgba_texture(1, Some("skin"), 8);
        let bad = Texture {
            format: TextureFormat::Dxt1,
            ..rgba_texture(2, Some("packed"), 8)
        };
        let options = TextureExportOptions {
            max_size: Some(4),
            interpolation: ResizeInterpolation::Nearest,
        };

        let written = save_textures(
            [
                (&good, "skin.png"),
                (&good, "skin.png"),
                (&bad, "packed.png"),
            ],
            &dir,
            &RawTextureDecoder,
            options,
        )
        .expect("saving textures should succeed");

        assert_eq!(written, 1);
        let saved = image::open(dir.join("skin.png")).expect("texture should be readable");
        assert_eq!(saved.dimensions(), (4, 4));
        assert!(!dir.join("packed.png").exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
