use nalgebra::Matrix4;

use crate::model::Matrix4x4;

/// Copies a source matrix into the scene matrix type element by element.
///
/// Element `(r, c)` of the result is `m{r+1}{c+1}` of the source, so the
/// source's row-vector convention is carried over unchanged.
pub fn to_scene_matrix(m: &Matrix4x4) -> Matrix4<f32> {
    Matrix4::new(
        m.m11, m.m12, m.m13, m.m14, //
        m.m21, m.m22, m.m23, m.m24, //
        m.m31, m.m32, m.m33, m.m34, //
        m.m41, m.m42, m.m43, m.m44,
    )
}

/// Returns `None` when the matrix is singular.
pub fn invert(m: &Matrix4<f32>) -> Option<Matrix4<f32>> {
    m.try_inverse()
}

/// Parent-then-child composition, `parent * child`.
pub fn compose(parent: &Matrix4<f32>, child: &Matrix4<f32>) -> Matrix4<f32> {
    parent * child
}

/// Node-local transform of a bone given the basis inherited from its parent.
///
/// # Arguments
///
/// * `inverse_parent_transform` - Parent bone bind matrix (identity for roots).
/// * `bone_matrix` - Bind matrix of the bone itself.
///
/// # Returns
///
/// `inverse_parent_transform * bone_matrix⁻¹`, or `None` when the bone
/// matrix cannot be inverted.
pub fn bone_local_transform(
    inverse_parent_transform: &Matrix4<f32>,
    bone_matrix: &Matrix4<f32>,
) -> Option<Matrix4<f32>> {
    let inverse_bone_matrix = invert(bone_matrix)?;
    Some(compose(inverse_parent_transform, &inverse_bone_matrix))
}
