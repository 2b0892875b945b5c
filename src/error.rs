use thiserror::Error;

/// Fatal conditions that abort a scene conversion.
///
/// Recoverable problems (a bone whose parent is missing, a texture slot that
/// points nowhere) are logged and never reach this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("model '{model}' has no meshes to convert")]
    EmptyModel { model: String },

    #[error("no models were given to convert")]
    NoModels,

    /// The bind matrix of a bone cannot be inverted, so no node-local
    /// transform exists for it.
    #[error("bind matrix of bone '{bone}' is singular")]
    SingularBoneMatrix { bone: String },

    #[error("mesh '{mesh}' references material {index} but only has {count}")]
    MaterialIndexOutOfRange {
        mesh: String,
        index: usize,
        count: usize,
    },

    #[error("mesh '{mesh}' references bone {index} but its skin only has {count}")]
    BoneIndexOutOfRange {
        mesh: String,
        index: usize,
        count: usize,
    },

    #[error("mesh '{mesh}' has vertex {index}, beyond the 32-bit vertex id range")]
    VertexIndexOverflow { mesh: String, index: usize },

    #[error("mesh '{mesh}' has bone indices but no skin")]
    MissingSkin { mesh: String },

    #[error("material '{material}' was not registered in the scene")]
    UnregisteredMaterial { material: String },
}
