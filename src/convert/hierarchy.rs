use std::collections::HashSet;

use log::warn;
use nalgebra::Matrix4;

use super::bones::CollectedBones;
use crate::{
    error::ConvertError,
    model::Bone,
    scene::Node,
    tag,
    transform::{bone_local_transform, to_scene_matrix},
};

/// Attaches one node per collected bone below `root`, mirroring the parent
/// relations recorded by the bone collector.
///
/// Bones caught in a parent cycle cannot be reached from a root; they are
/// attached under `root` instead. Returns the number of bone nodes created,
/// which always equals `bones.len()`.
pub(crate) fn build_bone_nodes(
    root: &mut Node,
    bones: &CollectedBones<'_>,
    append_tags: bool,
) -> Result<usize, ConvertError> {
    let mut built = HashSet::new();
    build_recursive(
        root,
        &Matrix4::identity(),
        None,
        bones,
        &mut built,
        append_tags,
    )?;

    if built.len() < bones.len() {
        for bone in &bones.bones {
            if built.contains(bone.name.as_str()) {
                continue;
            }

            warn!(
                "bone '{}' is not reachable from a root (parent cycle), attaching it to the root",
                bone.name
            );
            let node = build_bone_node(bone, &Matrix4::identity(), bones, &mut built, append_tags)?;
            root.children.push(node);
        }
    }

    Ok(built.len())
}

fn build_recursive<'a>(
    parent: &mut Node,
    inverse_parent_transform: &Matrix4<f32>,
    parent_name: Option<&str>,
    bones: &CollectedBones<'a>,
    built: &mut HashSet<&'a str>,
    append_tags: bool,
) -> Result<(), ConvertError> {
    for bone in &bones.bones {
        if bones.parent_name(&bone.name) != parent_name || built.contains(bone.name.as_str()) {
            continue;
        }

        let node = build_bone_node(bone, inverse_parent_transform, bones, built, append_tags)?;
        parent.children.push(node);
    }

    Ok(())
}

fn build_bone_node<'a>(
    bone: &'a Bone,
    inverse_parent_transform: &Matrix4<f32>,
    bones: &CollectedBones<'a>,
    built: &mut HashSet<&'a str>,
    append_tags: bool,
) -> Result<Node, ConvertError> {
    built.insert(bone.name.as_str());

    let bone_matrix = to_scene_matrix(&bone.matrix);
    let transform = bone_local_transform(inverse_parent_transform, &bone_matrix).ok_or_else(|| {
        ConvertError::SingularBoneMatrix {
            bone: bone.name.clone(),
        }
    })?;

    let name = if append_tags {
        tag::append(&bone.name, "ID", bone.id)
    } else {
        bone.name.clone()
    };

    let mut node = Node::new(name, transform);
    build_recursive(
        &mut node,
        &bone_matrix,
        Some(bone.name.as_str()),
        bones,
        built,
        append_tags,
    )?;

    Ok(node)
}
