//! Errors raised while building or preparing a scene.

use thiserror::Error;

use crate::scene::NodeKind;

/// Errors that can occur while assembling or transforming a scene.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("material property '{0}' is already registered")]
    DuplicateProperty(String),

    #[error("material property '{key}' has type {found}, expected {expected}")]
    PropertyType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("node {node} references missing model {model}")]
    MissingModel { node: usize, model: usize },

    #[error("node {node} references missing {kind:?} {entity}")]
    MissingEntity {
        node: usize,
        kind: NodeKind,
        entity: usize,
    },

    #[error("{kind:?} {entity} is referenced by more than one node")]
    SharedEntity { kind: NodeKind, entity: usize },

    #[error("model {model} has a zero scale component {scale}")]
    DegenerateScale { model: usize, scale: glam::Vec3 },

    #[error("material property '{key}' references missing texture {texture}")]
    MissingTexture { key: String, texture: u32 },
}

pub type SceneResult<T> = Result<T, SceneError>;
