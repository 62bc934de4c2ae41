//! Plugin abstraction for the Inference Engine
//!
//! Every hardware backend (CPU, GPU, accelerator) is exposed to the engine as
//! an [`InferencePlugin`]. The engine itself never touches native handles: it
//! reads a network through the plugin, hands it input blobs and collects the
//! output scores.
//!
//! - **OpenVINO**: the Inference Engine C API through the `openvino` crate,
//!   enabled with the `openvino` feature
//!
//! New backends are added by implementing [`InferencePlugin`] and extending
//! [`BackendConfig`].

use crate::blob::{InputBlob, OutputBlob};
use crate::error::DlInferError;
use crate::types::{NetworkInfo, Precision, ProfileInfo, Version};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(feature = "openvino")]
pub mod openvino;

/// Status codes returned by Inference Engine calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    GeneralError,
    NotImplemented,
    NetworkNotLoaded,
    ParameterMismatch,
    NotFound,
    OutOfBounds,
    Unexpected,
    RequestBusy,
    ResultNotReady,
    NotAllocated,
    InferNotStarted,
    NetworkNotReady,
    Undefined,
}

impl From<i32> for StatusCode {
    fn from(code: i32) -> Self {
        match code {
            0 => StatusCode::Ok,
            -1 => StatusCode::GeneralError,
            -2 => StatusCode::NotImplemented,
            -3 => StatusCode::NetworkNotLoaded,
            -4 => StatusCode::ParameterMismatch,
            -5 => StatusCode::NotFound,
            -6 => StatusCode::OutOfBounds,
            -7 => StatusCode::Unexpected,
            -8 => StatusCode::RequestBusy,
            -9 => StatusCode::ResultNotReady,
            -10 => StatusCode::NotAllocated,
            -11 => StatusCode::InferNotStarted,
            -12 => StatusCode::NetworkNotReady,
            _ => StatusCode::Undefined,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCode::Ok => "OK",
            StatusCode::GeneralError => "GENERAL_ERROR",
            StatusCode::NotImplemented => "NOT_IMPLEMENTED",
            StatusCode::NetworkNotLoaded => "NETWORK_NOT_LOADED",
            StatusCode::ParameterMismatch => "PARAMETER_MISMATCH",
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::OutOfBounds => "OUT_OF_BOUNDS",
            StatusCode::Unexpected => "UNEXPECTED",
            StatusCode::RequestBusy => "REQUEST_BUSY",
            StatusCode::ResultNotReady => "RESULT_NOT_READY",
            StatusCode::NotAllocated => "NOT_ALLOCATED",
            StatusCode::InferNotStarted => "INFER_NOT_STARTED",
            StatusCode::NetworkNotReady => "NETWORK_NOT_READY",
            StatusCode::Undefined => "UNDEFINED",
        };
        f.write_str(name)
    }
}

/// A failed plugin call: the engine status plus whatever the plugin said about it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{status}: {message}")]
pub struct PluginError {
    pub status: StatusCode,
    pub message: String,
}

impl PluginError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Configuration for different backend types
#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// OpenVINO Inference Engine
    OpenVino {
        /// Plugin library that was selected, e.g. `.../libMKLDNNPlugin.so`
        plugin_library: PathBuf,
        /// Device the network is compiled for, e.g. `CPU`
        device: String,
    },
}

/// Trait for hardware plugins
///
/// Calls happen in a fixed order: `read_network` once, optionally
/// `set_batch_size`, then `load_network`, then any number of `infer` calls.
pub trait InferencePlugin {
    /// Describe the plugin, if it can
    fn version(&self) -> Option<Version>;

    /// Read a network and its weights, reporting its input and output shape
    fn read_network(&mut self, model: &Path, weights: &Path) -> Result<NetworkInfo, PluginError>;

    /// Change the batch dimension of the network that was read
    fn set_batch_size(&mut self, size: usize) -> Result<(), PluginError>;

    /// Make the network ready for inference on the device
    fn load_network(&mut self) -> Result<(), PluginError>;

    /// Run a synchronous inference over every item of `input`
    fn infer(&mut self, input: &InputBlob) -> Result<OutputBlob, PluginError>;

    /// Per-layer timings of the last inference, keyed by layer name
    fn performance_counts(&self) -> BTreeMap<String, ProfileInfo>;
}

/// Number of items a plugin request takes at a time when it is handed `provided` items.
///
/// `provided` must match the batch last passed to `set_batch_size`, if any, and
/// split evenly into batches of the network's own size.
#[cfg_attr(not(feature = "openvino"), allow(dead_code))]
pub(crate) fn batch_chunk(
    network_batch: usize,
    requested: Option<usize>,
    provided: usize,
) -> Result<usize, PluginError> {
    if let Some(requested) = requested {
        if requested != provided {
            return Err(PluginError::new(
                StatusCode::ParameterMismatch,
                format!("batch size is {requested}, got {provided} images"),
            ));
        }
    }
    let chunk = network_batch.max(1);
    if provided % chunk != 0 {
        return Err(PluginError::new(
            StatusCode::ParameterMismatch,
            format!("batch of {provided} images cannot be split into network batches of {chunk}"),
        ));
    }
    Ok(chunk)
}

/// Scores are read back as `f32`; any other output precision is refused.
#[cfg_attr(not(feature = "openvino"), allow(dead_code))]
pub(crate) fn check_output_precision(precision: Precision) -> Result<(), PluginError> {
    match precision {
        Precision::FP32 => Ok(()),
        other => Err(PluginError::new(
            StatusCode::NotImplemented,
            format!("output precision {other} is not supported, expected FP32"),
        )),
    }
}

/// Factory function to create the appropriate plugin
pub fn create_plugin(config: BackendConfig) -> Result<Box<dyn InferencePlugin>, DlInferError> {
    match config {
        #[cfg(feature = "openvino")]
        BackendConfig::OpenVino {
            plugin_library,
            device,
        } => Ok(Box::new(self::openvino::OpenVinoPlugin::open(
            &plugin_library,
            &device,
        )?)),
        #[cfg(not(feature = "openvino"))]
        BackendConfig::OpenVino { .. } => Err(DlInferError::InvalidOperation(
            "OpenVINO backend not enabled. Enable the 'openvino' feature.".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(StatusCode::from(0), StatusCode::Ok);
        assert_eq!(StatusCode::from(-1), StatusCode::GeneralError);
        assert_eq!(StatusCode::from(-3), StatusCode::NetworkNotLoaded);
        assert_eq!(StatusCode::from(-12), StatusCode::NetworkNotReady);
        assert_eq!(StatusCode::from(-13), StatusCode::Undefined);
        assert_eq!(StatusCode::from(5), StatusCode::Undefined);
    }

    #[test]
    fn test_plugin_error_display() {
        let error = PluginError::new(StatusCode::NotFound, "no such layer");
        assert_eq!(error.to_string(), "NOT_FOUND: no such layer");
    }

    #[test]
    fn test_batch_chunk() {
        assert_eq!(batch_chunk(1, Some(3), 3), Ok(1));
        assert_eq!(batch_chunk(2, None, 4), Ok(2));
        assert_eq!(batch_chunk(0, None, 5), Ok(1));

        let error = batch_chunk(1, Some(3), 2).unwrap_err();
        assert_eq!(error.status, StatusCode::ParameterMismatch);
        assert_eq!(error.message, "batch size is 3, got 2 images");

        let error = batch_chunk(2, None, 3).unwrap_err();
        assert_eq!(error.status, StatusCode::ParameterMismatch);
    }

    #[test]
    fn test_output_must_be_fp32() {
        assert!(check_output_precision(Precision::FP32).is_ok());
        let error = check_output_precision(Precision::FP16).unwrap_err();
        assert_eq!(error.status, StatusCode::NotImplemented);
        assert!(error.message.contains("FP16"));
    }

    #[cfg(not(feature = "openvino"))]
    #[test]
    fn test_disabled_backend() {
        let result = create_plugin(BackendConfig::OpenVino {
            plugin_library: PathBuf::from("libMKLDNNPlugin.so"),
            device: "CPU".to_string(),
        });
        match result {
            Err(DlInferError::InvalidOperation(msg)) => assert!(msg.contains("'openvino' feature")),
            Err(other) => panic!("Expected InvalidOperation, got {:?}", other),
            Ok(_) => panic!("Expected the OpenVINO backend to be disabled"),
        }
    }
}
