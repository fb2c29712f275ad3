//! Render errors.

use ember_core::SceneError;
use thiserror::Error;

/// Errors that can stop a render before any pixel is produced.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),
}

pub type RenderResult<T> = Result<T, RenderError>;
