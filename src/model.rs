use std::{fs, path::Path};

use anyhow::{Context, Result};
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::texture::TextureSet;

/// Index value that terminates a triangle strip and starts a new one.
pub const STRIP_RESTART_INDEX: u32 = 0xFFFF_FFFF;

/// Weight slot index marking an unused influence.
pub const UNUSED_BONE_SLOT: i32 = -1;

/// A named asset loaded from the game's model container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
    #[serde(default)]
    pub texture_set: Option<TextureSet>,
}

impl Model {
    /// Reads a model dump written by the container reader as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read model: {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse model JSON: {}", path.display()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub sub_meshes: Vec<SubMesh>,
    #[serde(default)]
    pub skin: Option<Skin>,
}

/// Bones bound to a mesh. Positions in `bones` are the "local bone indices"
/// referenced by [`IndexTable::bone_indices`] and [`Bone::parent_id`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Skin {
    pub bones: Vec<Bone>,
}

impl Skin {
    /// Resolves the parent of `bone` within this skin, `None` for roots and
    /// for parents that do not exist.
    pub fn parent_of(&self, bone: &Bone) -> Option<&Bone> {
        let parent_index = usize::try_from(bone.parent_id?).ok()?;
        self.bones.get(parent_index)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    pub id: u32,
    /// Position of the parent bone in the owning skin.
    #[serde(default)]
    pub parent_id: Option<i32>,
    /// World-space bind transform.
    pub matrix: Matrix4x4,
}

/// Row-major 4x4 matrix as stored by the source format. Translation lives
/// in `m41..m43`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix4x4 {
    pub m11: f32,
    pub m12: f32,
    pub m13: f32,
    pub m14: f32,
    pub m21: f32,
    pub m22: f32,
    pub m23: f32,
    pub m24: f32,
    pub m31: f32,
    pub m32: f32,
    pub m33: f32,
    pub m34: f32,
    pub m41: f32,
    pub m42: f32,
    pub m43: f32,
    pub m44: f32,
}

impl Matrix4x4 {
    pub const IDENTITY: Self = Self {
        m11: 1.0,
        m12: 0.0,
        m13: 0.0,
        m14: 0.0,
        m21: 0.0,
        m22: 1.0,
        m23: 0.0,
        m24: 0.0,
        m31: 0.0,
        m32: 0.0,
        m33: 1.0,
        m34: 0.0,
        m41: 0.0,
        m42: 0.0,
        m43: 0.0,
        m44: 1.0,
    };

    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self {
            m41: x,
            m42: y,
            m43: z,
            ..Self::IDENTITY
        }
    }
}

impl Default for Matrix4x4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Up to four bone influences of one vertex. Indices point into the
/// owning index table's `bone_indices`, [`UNUSED_BONE_SLOT`] marks an empty
/// influence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoneWeight {
    pub indices: [i32; 4],
    pub weights: [f32; 4],
}

impl BoneWeight {
    pub fn influences(&self) -> impl Iterator<Item = (i32, f32)> + '_ {
        self.indices.iter().copied().zip(self.weights.iter().copied())
    }
}

impl Default for BoneWeight {
    fn default() -> Self {
        Self {
            indices: [UNUSED_BONE_SLOT; 4],
            weights: [0.0; 4],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubMesh {
    pub name: String,
    #[serde(default)]
    pub vertices: Option<Vec<Vector3<f32>>>,
    #[serde(default)]
    pub normals: Option<Vec<Vector3<f32>>>,
    #[serde(default)]
    pub uv_channel1: Option<Vec<Vector2<f32>>>,
    #[serde(default)]
    pub uv_channel2: Option<Vec<Vector2<f32>>>,
    #[serde(default)]
    pub colors: Option<Vec<Color>>,
    #[serde(default)]
    pub bone_weights: Option<Vec<BoneWeight>>,
    #[serde(default)]
    pub index_tables: Vec<IndexTable>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveType {
    #[default]
    Triangles,
    TriangleStrip,
}

/// Triangle indices sharing one material inside a submesh.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexTable {
    pub material_index: usize,
    #[serde(default)]
    pub primitive_type: PrimitiveType,
    #[serde(default)]
    pub indices: Vec<u32>,
    /// Maps weight slots of [`BoneWeight::indices`] to positions in the
    /// mesh skin.
    #[serde(default)]
    pub bone_indices: Option<Vec<usize>>,
}

impl IndexTable {
    pub fn triangles(&self) -> Triangles<'_> {
        Triangles {
            indices: &self.indices,
            primitive_type: self.primitive_type,
            position: 0,
            flip: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Triangle {
    fn is_degenerate(&self) -> bool {
        self.a == self.b || self.b == self.c || self.a == self.c
    }
}

/// Lazy triangle sequence over an index table.
#[derive(Debug, Clone)]
pub struct Triangles<'a> {
    indices: &'a [u32],
    primitive_type: PrimitiveType,
    position: usize,
    flip: bool,
}

impl Iterator for Triangles<'_> {
    type Item = Triangle;

    fn next(&mut self) -> Option<Triangle> {
        match self.primitive_type {
            PrimitiveType::Triangles => {
                let window = self.indices.get(self.position..self.position + 3)?;
                self.position += 3;
                Some(Triangle {
                    a: window[0],
                    b: window[1],
                    c: window[2],
                })
            }
            PrimitiveType::TriangleStrip => loop {
                let window = self.indices.get(self.position..self.position + 3)?;
                self.position += 1;

                if let Some(restart) = window.iter().position(|&i| i == STRIP_RESTART_INDEX) {
                    // Continue right after the restart marker with fresh parity.
                    self.position += restart;
                    self.flip = false;
                    continue;
                }

                let flip = self.flip;
                self.flip = !self.flip;

                let triangle = if flip {
                    Triangle {
                        a: window[0],
                        b: window[2],
                        c: window[1],
                    }
                } else {
                    Triangle {
                        a: window[0],
                        b: window[1],
                        c: window[2],
                    }
                };

                if !triangle.is_degenerate() {
                    return Some(triangle);
                }
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialTexture {
    pub is_active: bool,
    /// Texture id inside the model's texture set, `-1` when unbound.
    pub texture_id: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    #[serde(default)]
    pub diffuse: MaterialTexture,
    #[serde(default)]
    pub ambient: MaterialTexture,
    #[serde(default)]
    pub normal: MaterialTexture,
    #[serde(default)]
    pub specular: MaterialTexture,
    #[serde(default)]
    pub reflection: MaterialTexture,
    #[serde(default)]
    pub specular_power: MaterialTexture,
}
