use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::info;

use crate::{
    convert::{ConvertOptions, SceneConversion, convert_model, convert_models},
    model::Model,
    scene::Scene,
    texture::{TextureDatabase, TextureDecoder, TextureExportOptions, save_textures},
};

/// Writes an assembled scene graph to an interchange file.
pub trait SceneExporter {
    fn export(&self, scene: &Scene, output_path: &Path) -> Result<()>;
}

/// Serializes the scene graph as JSON.
#[derive(Debug, Clone, Copy)]
pub struct JsonSceneExporter {
    pub pretty: bool,
}

impl SceneExporter for JsonSceneExporter {
    fn export(&self, scene: &Scene, output_path: &Path) -> Result<()> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(scene)
        } else {
            serde_json::to_vec(scene)
        }
        .context("failed to serialize scene")?;

        fs::write(output_path, bytes)
            .with_context(|| format!("failed to write output: {}", output_path.display()))
    }
}

/// Summary of a finished export.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub output_path: PathBuf,
    pub node_count: usize,
    pub mesh_count: usize,
    pub material_count: usize,
    pub bone_count: usize,
    pub texture_count: usize,
}

/// Converts one model and writes the scene plus its side-car textures.
pub fn export_model(
    model: &Model,
    output_path: &Path,
    texture_database: Option<&TextureDatabase>,
    exporter: &dyn SceneExporter,
    decoder: &dyn TextureDecoder,
    options: &ConvertOptions,
) -> Result<ExportReport> {
    let conversion = convert_model(model, texture_database, options)
        .with_context(|| format!("failed to convert model '{}'", model.name))?;
    write_conversion(&conversion, output_path, exporter, decoder, options)
}

/// Merges several models into one scene and writes it with every model's
/// side-car textures.
pub fn export_models(
    models: &[Model],
    output_path: &Path,
    texture_database: Option<&TextureDatabase>,
    exporter: &dyn SceneExporter,
    decoder: &dyn TextureDecoder,
    options: &ConvertOptions,
) -> Result<ExportReport> {
    let conversion = convert_models(models, texture_database, options)
        .with_context(|| format!("failed to convert {} model(s)", models.len()))?;
    write_conversion(&conversion, output_path, exporter, decoder, options)
}

fn write_conversion(
    conversion: &SceneConversion,
    output_path: &Path,
    exporter: &dyn SceneExporter,
    decoder: &dyn TextureDecoder,
    options: &ConvertOptions,
) -> Result<ExportReport> {
    exporter.export(&conversion.scene, output_path)?;

    let texture_count = if options.export_textures {
        let output_dir = output_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        save_textures(
            conversion
                .textures
                .iter()
                .map(|sidecar| (&sidecar.texture, sidecar.file_name.as_str())),
            output_dir,
            decoder,
            TextureExportOptions {
                max_size: options.max_texture_size,
                interpolation: options.texture_resize_method,
            },
        )?
    } else {
        0
    };

    info!(
        "exported {} ({} texture file(s))",
        output_path.display(),
        texture_count
    );

    Ok(ExportReport {
        output_path: output_path.to_path_buf(),
        node_count: conversion.scene.node_count(),
        mesh_count: conversion.scene.meshes.len(),
        material_count: conversion.scene.materials.len(),
        bone_count: conversion.bone_node_count,
        texture_count,
    })
}
