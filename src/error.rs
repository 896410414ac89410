// error.rs: error taxonomy for the tour viewer

use std::path::PathBuf;
use thiserror::Error;

/// Failures reading or editing a tour file.
#[derive(Error, Debug)]
pub enum TourError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid tour data in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("scene not found: {0}")]
    UnknownScene(String),

    #[error("info point {point} not found in scene {scene}")]
    UnknownInfoPoint { scene: String, point: String },

    #[error("info point {point} already exists in scene {scene}")]
    DuplicateInfoPoint { scene: String, point: String },
}

/// Failures loading a panorama image in the background.
#[derive(Error, Debug, Clone)]
pub enum LoadError {
    #[error("cannot open {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("cannot decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
}

/// Failures surfaced by the viewer controller to its collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewerError {
    #[error("navigation target not found: {0}")]
    UnknownScene(String),

    #[error("info point not found in current scene: {0}")]
    UnknownInfoPoint(String),

    #[error("no scene is loaded")]
    NoScene,
}

/// Failures acquiring the rendering surface.
#[derive(Error, Debug)]
pub enum RendererError {
    #[error("cannot create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible graphics adapter")]
    NoAdapter,

    #[error("cannot open graphics device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}
