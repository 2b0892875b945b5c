//! Converts skinned game models into a generic node/mesh/bone scene graph.
//!
//! The source representation keeps bones as flat per-skin lists, splits
//! submeshes by material through index tables and packs four bone
//! influences per vertex. [`convert::convert_model`] and
//! [`convert::convert_models`] rebuild that into a [`scene::Scene`] tree that
//! an interchange writer can consume.

pub mod convert;
pub mod error;
pub mod export;
pub mod model;
pub mod scene;
pub mod tag;
pub mod texture;
pub mod transform;

pub use convert::{ConvertOptions, SceneConversion, SidecarTexture, convert_model, convert_models};
pub use error::ConvertError;
