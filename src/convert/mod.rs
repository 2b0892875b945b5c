mod bones;
mod hierarchy;
mod materials;
mod meshes;

use std::collections::HashSet;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    error::ConvertError,
    model::Model,
    scene::Scene,
    texture::{ResizeInterpolation, Texture, TextureDatabase, TextureSet, rename_textures},
};

use bones::collect_bones;
use hierarchy::build_bone_nodes;
use materials::register_materials;
use meshes::convert_mesh_node;

/// Conversion options shared by the CLI and library callers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Appends `_ID=<id>_` tags to bone and mesh node names.
    pub append_tags: bool,
    /// Writes side-car textures next to the exported scene.
    pub export_textures: bool,
    /// Downscales side-car textures larger than this size.
    pub max_texture_size: Option<u32>,
    /// Interpolation method used for texture downscaling.
    pub texture_resize_method: ResizeInterpolation,
    /// Pretty-prints JSON output.
    pub pretty_json: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            append_tags: false,
            export_textures: true,
            max_texture_size: None,
            texture_resize_method: ResizeInterpolation::Bilinear,
            pretty_json: true,
        }
    }
}

/// A texture to be written next to the exported scene.
#[derive(Debug, Clone)]
pub struct SidecarTexture {
    pub texture: Texture,
    pub file_name: String,
}

/// Result of a conversion: the scene plus the textures it references.
#[derive(Debug, Clone)]
pub struct SceneConversion {
    pub scene: Scene,
    pub textures: Vec<SidecarTexture>,
    /// Number of bone nodes attached to the scene hierarchy, skinned or not.
    pub bone_node_count: usize,
}

/// Converts one model into a scene graph.
///
/// Textures are renamed through `texture_database` on a copy; `model` is not
/// modified.
///
/// # Errors
///
/// Returns [`ConvertError::EmptyModel`] for a model without meshes and
/// propagates fatal errors from hierarchy and mesh conversion.
pub fn convert_model(
    model: &Model,
    texture_database: Option<&TextureDatabase>,
    options: &ConvertOptions,
) -> Result<SceneConversion, ConvertError> {
    convert_models(std::slice::from_ref(model), texture_database, options)
}

/// Merges several models into one scene.
///
/// Bones and materials are deduplicated by name across all models, the
/// first occurrence wins. Each model's meshes keep their own node subtrees.
pub fn convert_models(
    models: &[Model],
    texture_database: Option<&TextureDatabase>,
    options: &ConvertOptions,
) -> Result<SceneConversion, ConvertError> {
    if models.is_empty() {
        return Err(ConvertError::NoModels);
    }
    if let Some(model) = models.iter().find(|model| model.meshes.is_empty()) {
        return Err(ConvertError::EmptyModel {
            model: model.name.clone(),
        });
    }

    let texture_sets: Vec<Option<TextureSet>> = models
        .iter()
        .map(|model| {
            model
                .texture_set
                .as_ref()
                .map(|set| rename_textures(set, texture_database))
        })
        .collect();

    let mut scene = Scene::default();

    for (model, textures) in models.iter().zip(&texture_sets) {
        for mesh in &model.meshes {
            register_materials(&mut scene, &mesh.materials, textures.as_ref());
        }
    }
    debug!("registered {} material(s)", scene.materials.len());

    let bones = collect_bones(models.iter().flat_map(|model| &model.meshes));
    debug!("collected {} unique bone(s)", bones.len());
    let bone_node_count = build_bone_nodes(&mut scene.root, &bones, options.append_tags)?;

    for model in models {
        for mesh in &model.meshes {
            let node = convert_mesh_node(&mut scene, mesh, options.append_tags)?;
            scene.root.children.push(node);
        }
    }

    info!(
        "converted {} model(s): {} mesh(es), {} material(s), {} bone node(s)",
        models.len(),
        scene.meshes.len(),
        scene.materials.len(),
        bone_node_count
    );

    Ok(SceneConversion {
        scene,
        textures: collect_sidecar_textures(texture_sets),
        bone_node_count,
    })
}

fn collect_sidecar_textures(texture_sets: Vec<Option<TextureSet>>) -> Vec<SidecarTexture> {
    let mut seen = HashSet::new();
    texture_sets
        .into_iter()
        .flatten()
        .flat_map(|set| set.textures)
        .filter_map(|texture| {
            let file_name = texture.file_name();
            seen.insert(file_name.clone())
                .then_some(SidecarTexture { texture, file_name })
        })
        .collect()
}
