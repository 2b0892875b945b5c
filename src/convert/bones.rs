use std::collections::HashMap;

use log::warn;

use crate::model::{Bone, Mesh};

/// Unique bones across a set of meshes plus each bone's parent by name.
#[derive(Debug, Clone, Default)]
pub struct CollectedBones<'a> {
    /// First occurrence per name, in discovery order.
    pub bones: Vec<&'a Bone>,
    /// Bone name to parent bone name; `None` marks a root.
    pub parent_names: HashMap<&'a str, Option<&'a str>>,
}

impl<'a> CollectedBones<'a> {
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn parent_name(&self, bone_name: &str) -> Option<&'a str> {
        self.parent_names.get(bone_name).copied().flatten()
    }
}

/// Walks every skinned mesh and deduplicates bones by name.
///
/// Parent ids are resolved inside the skin that declares the bone; a parent
/// that cannot be found, or a bone naming itself as parent, turns the bone
/// into a root.
pub(crate) fn collect_bones<'a>(meshes: impl IntoIterator<Item = &'a Mesh>) -> CollectedBones<'a> {
    let mut collected = CollectedBones::default();

    for mesh in meshes {
        let Some(skin) = mesh.skin.as_ref() else {
            continue;
        };

        for bone in &skin.bones {
            if collected.parent_names.contains_key(bone.name.as_str()) {
                continue;
            }

            let parent = match skin.parent_of(bone) {
                Some(parent) if parent.name == bone.name => {
                    warn!(
                        "bone '{}' in mesh '{}' is its own parent, treating it as a root",
                        bone.name, mesh.name
                    );
                    None
                }
                Some(parent) => Some(parent),
                None => {
                    if bone.parent_id.is_some_and(|id| id >= 0) {
                        warn!(
                            "bone '{}' in mesh '{}' points to missing parent {:?}, treating it as a root",
                            bone.name, mesh.name, bone.parent_id
                        );
                    }
                    None
                }
            };

            collected.bones.push(bone);
            collected
                .parent_names
                .insert(bone.name.as_str(), parent.map(|p| p.name.as_str()));
        }
    }

    collected
}
