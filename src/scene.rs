use nalgebra::{Matrix4, Vector2, Vector3, Vector4};
use serde::Serialize;

pub const ROOT_NODE_NAME: &str = "RootNode";

/// Output scene graph handed to an interchange writer.
///
/// Every matrix in the scene keeps the source's row-vector convention: points
/// transform as `p * M` and the translation sits in row 3, elements
/// `(3, 0..3)`. A column-vector writer such as glTF must transpose.
#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    pub root: Node,
    pub meshes: Vec<SceneMesh>,
    pub materials: Vec<SceneMaterial>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            root: Node::new(ROOT_NODE_NAME, Matrix4::identity()),
            meshes: Vec::new(),
            materials: Vec::new(),
        }
    }
}

impl Scene {
    pub fn material_index(&self, name: &str) -> Option<usize> {
        self.materials
            .iter()
            .position(|material| material.name == name)
    }

    /// Adds a mesh to the global list and returns its index.
    pub fn push_mesh(&mut self, mesh: SceneMesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    /// Node count including the root.
    pub fn node_count(&self) -> usize {
        self.root.descendants().count()
    }

    pub fn find_node(&self, name: &str) -> Option<&Node> {
        self.root.descendants().find(|node| node.name == name)
    }

    /// Ancestor names of the first node called `name`, nearest first,
    /// ending with the root.
    pub fn ancestors_of(&self, name: &str) -> Option<Vec<&str>> {
        fn walk<'a>(node: &'a Node, name: &str, path: &mut Vec<&'a str>) -> bool {
            if node.name == name {
                return true;
            }
            path.push(&node.name);
            if node.children.iter().any(|child| walk(child, name, path)) {
                return true;
            }
            path.pop();
            false
        }

        let mut path = Vec::new();
        if !walk(&self.root, name, &mut path) {
            return None;
        }
        path.reverse();
        Some(path)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub name: String,
    /// Transform relative to the parent node, row-vector convention with the
    /// translation in row 3.
    pub transform: Matrix4<f32>,
    /// Indices into [`Scene::meshes`].
    pub mesh_indices: Vec<usize>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>, transform: Matrix4<f32>) -> Self {
        Self {
            name: name.into(),
            transform,
            mesh_indices: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Depth-first iterator over this node and all nodes below it.
    pub fn descendants(&self) -> impl Iterator<Item = &Node> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SceneMesh {
    pub name: String,
    pub vertices: Vec<Vector3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    /// UV channels 0 and 1; an empty channel is absent.
    pub texture_coordinates: [Vec<Vector2<f32>>; 2],
    pub colors: Vec<Vector4<f32>>,
    pub faces: Vec<[u32; 3]>,
    pub material_index: usize,
    pub bones: Vec<SceneBone>,
}

impl SceneMesh {
    pub fn find_bone(&self, name: &str) -> Option<&SceneBone> {
        self.bones.iter().find(|bone| bone.name == name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneBone {
    pub name: String,
    /// Bind matrix from mesh space into bone space, row-vector convention
    /// with the translation in row 3.
    pub offset_matrix: Matrix4<f32>,
    pub vertex_weights: Vec<VertexWeight>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VertexWeight {
    pub vertex_id: u32,
    pub weight: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextureKind {
    Diffuse,
    Ambient,
    Normals,
    Specular,
    Reflection,
    Shininess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WrapMode {
    Repeat,
    Clamp,
    Mirror,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextureSlot {
    pub file_path: String,
    pub kind: TextureKind,
    pub uv_index: u32,
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    pub blend_factor: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneMaterial {
    pub name: String,
    pub textures: Vec<TextureSlot>,
}

impl SceneMaterial {
    pub fn texture(&self, kind: TextureKind) -> Option<&TextureSlot> {
        self.textures.iter().find(|slot| slot.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_scene() -> Scene {
        let mut scene = Scene::default();
        let mut hips = Node::new("hips", Matrix4::identity());
        hips.children.push(Node::new("spine", Matrix4::identity()));
        hips.children.push(Node::new("leg", Matrix4::identity()));
        scene.root.children.push(hips);
        scene.root.children.push(Node::new("body", Matrix4::identity()));
        scene
    }

    #[test]
    fn given_tree_when_walking_descendants_then_order_is_depth_first() {
        let scene = sample_scene();

        let names: Vec<&str> = scene.root.descendants().map(|n| n.name.as_str()).collect();

        assert_eq!(names, vec!["RootNode", "hips", "spine", "leg", "body"]);
        assert_eq!(scene.node_count(), 5);
    }

    #[test]
    fn given_nested_node_when_listing_ancestors_then_chain_ends_at_root() {
        let scene = sample_scene();

        assert_eq!(scene.ancestors_of("leg"), Some(vec!["hips", "RootNode"]));
        assert_eq!(scene.ancestors_of("body"), Some(vec!["RootNode"]));
        assert_eq!(scene.ancestors_of("missing"), None);
    }
}
