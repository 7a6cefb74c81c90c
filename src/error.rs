//! Error types for Orrery.
//!
//! Per-frame code never fails: missing shapes fall back to the home sphere and
//! failed mask loads keep the placeholder set. These types cover the operations
//! that genuinely can fail at process level (configuration, window and GPU
//! setup, snapshot writing) plus the mask loading failures that are logged and
//! recovered internally.

use std::path::PathBuf;

use thiserror::Error;

use crate::shape::ShapeId;

/// A shape name that matches no shape, group or alias.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown shape `{0}`")]
pub struct UnknownShape(pub String);

/// A theme mode other than `auto`, `light` or `dark`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown theme mode `{0}`")]
pub struct UnknownTheme(pub String);

/// Errors that can occur while producing an alpha mask for a shape.
#[derive(Debug, Error)]
pub enum MaskError {
    /// Failed to decode an image file.
    #[error("failed to decode mask image: {0}")]
    Image(#[from] image::ImageError),
    /// Failed to read a mask file from disk.
    #[error("failed to read mask file: {0}")]
    Io(#[from] std::io::Error),
    /// The mask decoded but contains no pixel above the opacity threshold.
    #[error("mask for {0:?} has no opaque pixels")]
    Empty(ShapeId),
    /// The mask would have a zero-sized dimension.
    #[error("cannot rasterize into a {width}x{height} mask")]
    Degenerate { width: u32, height: u32 },
}

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML for [`EngineConfig`](crate::config::EngineConfig).
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is outside its allowed range.
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    /// The surface reports no usable texture format.
    #[error("surface has no supported texture format")]
    NoSurfaceFormat,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
}

/// Errors that can occur while presenting a rendered frame.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The swapchain texture could not be acquired.
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    /// Writing a snapshot image failed.
    #[error("failed to write snapshot: {0}")]
    Snapshot(#[from] image::ImageError),
}

/// Errors that can occur when running the interactive viewer or a snapshot.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to create or run the event loop.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create the window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Rendering failed.
    #[error("render error: {0}")]
    Render(#[from] RenderError),
}
