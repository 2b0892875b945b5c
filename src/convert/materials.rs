use log::{debug, warn};

use crate::{
    model::{Material, MaterialTexture},
    scene::{Scene, SceneMaterial, TextureKind, TextureSlot, WrapMode},
    texture::TextureSet,
};

/// Adds every material not yet present (by name) to the scene.
pub(crate) fn register_materials(
    scene: &mut Scene,
    materials: &[Material],
    textures: Option<&TextureSet>,
) {
    for material in materials {
        if scene.material_index(&material.name).is_some() {
            continue;
        }

        let converted = convert_material(material, textures);
        debug!(
            "registered material '{}' with {} texture slot(s)",
            converted.name,
            converted.textures.len()
        );
        scene.materials.push(converted);
    }
}

pub(crate) fn convert_material(material: &Material, textures: Option<&TextureSet>) -> SceneMaterial {
    let channels = [
        (&material.diffuse, TextureKind::Diffuse),
        (&material.ambient, TextureKind::Ambient),
        (&material.normal, TextureKind::Normals),
        (&material.specular, TextureKind::Specular),
        (&material.reflection, TextureKind::Reflection),
        (&material.specular_power, TextureKind::Shininess),
    ];

    SceneMaterial {
        name: material.name.clone(),
        textures: channels
            .into_iter()
            .filter(|(channel, _)| channel.is_active)
            .filter_map(|(channel, kind)| texture_slot(&material.name, channel, kind, textures))
            .collect(),
    }
}

fn texture_slot(
    material_name: &str,
    channel: &MaterialTexture,
    kind: TextureKind,
    textures: Option<&TextureSet>,
) -> Option<TextureSlot> {
    if channel.texture_id == -1 {
        return None;
    }

    let Some(texture) = textures.and_then(|set| set.find(channel.texture_id)) else {
        warn!(
            "material '{}' {:?} slot references unknown texture {}, skipping",
            material_name, kind, channel.texture_id
        );
        return None;
    };

    Some(TextureSlot {
        file_path: texture.file_name(),
        kind,
        uv_index: 0,
        wrap_u: WrapMode::Repeat,
        wrap_v: WrapMode::Repeat,
        blend_factor: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::Texture;

    fn active(texture_id: i32) -> MaterialTexture {
        MaterialTexture {
            is_active: true,
            texture_id,
        }
    }

    fn texture_set() -> TextureSet {
        TextureSet {
            textures: vec![
                Texture {
                    id: 5,
                    name: Some("skin".to_string()),
                    ..Texture::default()
                },
                Texture {
                    id: 6,
                    name: Some("skin_n".to_string()),
                    ..Texture::default()
                },
            ],
        }
    }

    #[test]
    fn given_active_diffuse_when_converting_then_one_repeat_slot_is_bound() {
        let material = Material {
            name: "skin".to_string(),
            diffuse: active(5),
            ..Material::default()
        };

        let converted = convert_material(&material, Some(&texture_set()));

        assert_eq!(
            converted.textures,
            vec![TextureSlot {
                file_path: "skin.png".to_string(),
                kind: TextureKind::Diffuse,
                uv_index: 0,
                wrap_u: WrapMode::Repeat,
                wrap_v: WrapMode::Repeat,
                blend_factor: 0.0,
            }]
        );
    }

    #[test]
    fn given_unbound_or_unknown_texture_when_converting_then_slot_is_omitted() {
        let material = Material {
            name: "skin".to_string(),
            diffuse: active(-1),
            normal: active(77),
            specular: MaterialTexture {
                is_active: false,
                texture_id: 5,
            },
            ..Material::default()
        };

        assert!(convert_material(&material, Some(&texture_set())).textures.is_empty());
    }

    #[test]
    fn given_no_texture_set_when_converting_then_material_has_no_slots() {
        let material = Material {
            name: "skin".to_string(),
            diffuse: active(5),
            ..Material::default()
        };

        let converted = convert_material(&material, None);

        assert_eq!(converted.name, "skin");
        assert!(converted.textures.is_empty());
    }

    #[test]
    fn given_all_channels_when_converting_then_kinds_follow_channel_order() {
        let material = Material {
            name: "full".to_string(),
            diffuse: active(5),
            ambient: active(5),
            normal: active(6),
            specular: active(5),
            reflection: active(5),
            specular_power: active(6),
        };

        let converted = convert_material(&material, Some(&texture_set()));

        let kinds: Vec<TextureKind> = converted.textures.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TextureKind::Diffuse,
                TextureKind::Ambient,
                TextureKind::Normals,
                TextureKind::Specular,
                TextureKind::Reflection,
                TextureKind::Shininess,
            ]
        );
        assert_eq!(
            converted.texture(TextureKind::Normals).map(|s| s.file_path.as_str()),
            Some("skin_n.png")
        );
    }

    #[test]
    fn given_same_material_twice_when_registering_then_it_is_added_once_with_same_slots() {
        let material = Material {
            name: "skin".to_string(),
            diffuse: active(5),
            ..Material::default()
        };
        let textures = texture_set();
        let mut scene = Scene::default();

        register_materials(&mut scene, std::slice::from_ref(&material), Some(&textures));
        let first = scene.materials.clone();
        register_materials(&mut scene, &[material.clone(), material], Some(&textures));

        assert_eq!(scene.materials.len(), 1);
        assert_eq!(scene.materials, first);
        assert_eq!(
            convert_material(&scene_material_source(), Some(&textures)),
            convert_material(&scene_material_source(), Some(&textures))
        );
    }

    fn scene_material_source() -> Material {
        Material {
            name: "eye".to_string(),
            diffuse: active(5),
            normal: active(6),
            ..Material::default()
        }
    }
}
