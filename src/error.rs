//! Error types for the inference binding layer.
//!
//! This module defines the errors that can occur while configuring an engine,
//! selecting a plugin, loading images and running an inference. Plugin-level
//! status codes live in [`crate::backends::PluginError`]; they are wrapped by
//! [`DlInferError`] once they cross into the engine.

use crate::backends::PluginError;
use crate::types::Precision;
use thiserror::Error;

/// Represents all possible errors that can occur in the binding layer.
#[derive(Error, Debug)]
pub enum DlInferError {
    /// Indicates a failure in file system operations.
    ///
    /// This is what a missing model file produces: the configurator refuses to
    /// exist without a model to point at.
    #[error("Failed to access file: {0}")]
    FileError(#[from] std::io::Error),

    /// Indicates that a path does not point at a regular file.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// No plugin directory yielded a loadable plugin library.
    ///
    /// `attempts` holds one line per directory that was tried, in order.
    #[error("cannot load plugin: {name}")]
    PluginNotFound { name: String, attempts: Vec<String> },

    /// A plugin call failed outside of model loading and scoring.
    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    /// The network could not be read or could not be loaded into the plugin.
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    /// The plugin rejected an inference request.
    #[error("Scoring failed! {0}")]
    Scoring(String),

    /// Indicates that the provided input data is invalid.
    ///
    /// This error occurs when:
    /// - An image does not match the network input size
    /// - None of the requested images could be used
    /// - The network reports unusable input dimensions
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Indicates that an operation was called out of order.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The network input uses a precision no input blob can be built for.
    #[error("Unsupported network precision: {0}")]
    UnsupportedPrecision(Precision),

    /// An image could not be decoded.
    #[error("Failed to decode image: {0}")]
    ImageError(#[from] image::ImageError),

    /// Indicates a failure in JSON deserialization of a configurator file.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
