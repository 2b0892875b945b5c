use nalgebra::{Matrix4, Vector2, Vector4};

use crate::{
    error::ConvertError,
    model::{BoneWeight, IndexTable, Mesh, SubMesh},
    scene::{Node, Scene, SceneBone, SceneMesh, VertexWeight},
    tag,
    transform::to_scene_matrix,
};

/// Converts a source mesh into a node subtree, pushing one output mesh per
/// index table into `scene.meshes`.
///
/// The returned node is named after the mesh and holds one child node per
/// converted index table.
pub(crate) fn convert_mesh_node(
    scene: &mut Scene,
    mesh: &Mesh,
    append_tags: bool,
) -> Result<Node, ConvertError> {
    let name = if append_tags {
        tag::append(&mesh.name, "ID", mesh.id)
    } else {
        mesh.name.clone()
    };
    let mut mesh_node = Node::new(name, Matrix4::identity());

    for sub_mesh in &mesh.sub_meshes {
        for index_table in &sub_mesh.index_tables {
            let scene_mesh = convert_index_table(scene, mesh, sub_mesh, index_table, append_tags)?;
            let mesh_index = scene.push_mesh(scene_mesh);

            let mut sub_mesh_node = Node::new(sub_mesh.name.clone(), Matrix4::identity());
            sub_mesh_node.mesh_indices.push(mesh_index);
            mesh_node.children.push(sub_mesh_node);
        }
    }

    Ok(mesh_node)
}

fn convert_index_table(
    scene: &Scene,
    mesh: &Mesh,
    sub_mesh: &SubMesh,
    index_table: &IndexTable,
    append_tags: bool,
) -> Result<SceneMesh, ConvertError> {
    let material = mesh.materials.get(index_table.material_index).ok_or_else(|| {
        ConvertError::MaterialIndexOutOfRange {
            mesh: mesh.name.clone(),
            index: index_table.material_index,
            count: mesh.materials.len(),
        }
    })?;
    let material_index =
        scene
            .material_index(&material.name)
            .ok_or_else(|| ConvertError::UnregisteredMaterial {
                material: material.name.clone(),
            })?;

    let mut scene_mesh = SceneMesh {
        name: sub_mesh.name.clone(),
        vertices: sub_mesh.vertices.clone().unwrap_or_default(),
        normals: sub_mesh.normals.clone().unwrap_or_default(),
        texture_coordinates: [
            flip_uv_channel(sub_mesh.uv_channel1.as_deref()),
            flip_uv_channel(sub_mesh.uv_channel2.as_deref()),
        ],
        colors: sub_mesh
            .colors
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|c| Vector4::new(c.r, c.g, c.b, c.a))
            .collect(),
        faces: index_table
            .triangles()
            .map(|triangle| [triangle.a, triangle.b, triangle.c])
            .collect(),
        material_index,
        bones: Vec::new(),
    };

    if let Some(bone_indices) = index_table.bone_indices.as_deref() {
        scene_mesh.bones = convert_bones(
            mesh,
            bone_indices,
            sub_mesh.bone_weights.as_deref().unwrap_or_default(),
            append_tags,
        )?;
    }

    Ok(scene_mesh)
}

/// Texture space flip between the source (top-left origin) and the target
/// (bottom-left origin).
fn flip_uv_channel(channel: Option<&[Vector2<f32>]>) -> Vec<Vector2<f32>> {
    channel
        .unwrap_or_default()
        .iter()
        .map(|uv| Vector2::new(uv.x, 1.0 - uv.y))
        .collect()
}

/// Redistributes packed per-vertex influences into per-bone weight lists.
fn convert_bones(
    mesh: &Mesh,
    bone_indices: &[usize],
    bone_weights: &[BoneWeight],
    append_tags: bool,
) -> Result<Vec<SceneBone>, ConvertError> {
    let skin = mesh.skin.as_ref().ok_or_else(|| ConvertError::MissingSkin {
        mesh: mesh.name.clone(),
    })?;

    let mut scene_bones: Vec<SceneBone> = Vec::new();

    for (slot, &bone_index) in bone_indices.iter().enumerate() {
        let bone = skin
            .bones
            .get(bone_index)
            .ok_or_else(|| ConvertError::BoneIndexOutOfRange {
                mesh: mesh.name.clone(),
                index: bone_index,
                count: skin.bones.len(),
            })?;

        let name = if append_tags {
            tag::append(&bone.name, "ID", bone.id)
        } else {
            bone.name.clone()
        };

        let position = match scene_bones.iter().position(|b| b.name == name) {
            Some(position) => position,
            None => {
                scene_bones.push(SceneBone {
                    name,
                    offset_matrix: to_scene_matrix(&bone.matrix),
                    vertex_weights: Vec::new(),
                });
                scene_bones.len() - 1
            }
        };

        let Ok(slot) = i32::try_from(slot) else {
            continue;
        };
        let scene_bone = &mut scene_bones[position];
        for (vertex, weight) in bone_weights.iter().enumerate() {
            for (index, value) in weight.influences() {
                if index == slot {
                    scene_bone.vertex_weights.push(VertexWeight {
                        vertex_id: vertex_id(&mesh.name, vertex)?,
                        weight: value,
                    });
                }
            }
        }
    }

    Ok(scene_bones)
}

fn vertex_id(mesh_name: &str, vertex: usize) -> Result<u32, ConvertError> {
    u32::try_from(vertex).map_err(|_| ConvertError::VertexIndexOverflow {
        mesh: mesh_name.to_string(),
        index: vertex,
    })
}
