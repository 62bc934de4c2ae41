use super::{batch_chunk, check_output_precision, InferencePlugin, PluginError, StatusCode};
use crate::blob::{InputBlob, OutputBlob};
use crate::error::DlInferError;
use crate::types::{NetworkInfo, Precision, ProfileInfo, ProfileStatus, Version};
use openvino::{
    Blob, CNNNetwork, Core, ExecutableNetwork, InferRequest, InferenceError, Layout, TensorDesc,
};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

impl From<InferenceError> for PluginError {
    fn from(error: InferenceError) -> Self {
        let status = match &error {
            InferenceError::GeneralError => StatusCode::GeneralError,
            InferenceError::NotImplemented => StatusCode::NotImplemented,
            InferenceError::NetworkNotLoaded => StatusCode::NetworkNotLoaded,
            InferenceError::ParameterMismatch => StatusCode::ParameterMismatch,
            InferenceError::NotFound => StatusCode::NotFound,
            InferenceError::OutOfBounds => StatusCode::OutOfBounds,
            InferenceError::Unexpected => StatusCode::Unexpected,
            InferenceError::RequestBusy => StatusCode::RequestBusy,
            InferenceError::ResultNotReady => StatusCode::ResultNotReady,
            InferenceError::NotAllocated => StatusCode::NotAllocated,
            InferenceError::InferNotStarted => StatusCode::InferNotStarted,
            InferenceError::NetworkNotReady => StatusCode::NetworkNotReady,
            #[allow(unreachable_patterns)]
            _ => StatusCode::Undefined,
        };
        PluginError::new(status, format!("{error:?}"))
    }
}

fn from_openvino_precision(precision: openvino::Precision) -> Precision {
    match precision {
        openvino::Precision::FP32 => Precision::FP32,
        openvino::Precision::FP16 => Precision::FP16,
        openvino::Precision::Q78 => Precision::Q78,
        openvino::Precision::I16 => Precision::I16,
        openvino::Precision::U8 => Precision::U8,
        openvino::Precision::I8 => Precision::I8,
        openvino::Precision::U16 => Precision::U16,
        openvino::Precision::I32 => Precision::I32,
        _ => Precision::Unspecified,
    }
}

fn to_openvino_precision(precision: Precision) -> Result<openvino::Precision, PluginError> {
    Ok(match precision {
        Precision::FP32 => openvino::Precision::FP32,
        Precision::Q78 => openvino::Precision::Q78,
        Precision::I16 => openvino::Precision::I16,
        Precision::U8 => openvino::Precision::U8,
        other => {
            return Err(PluginError::new(
                StatusCode::NotImplemented,
                format!("input precision {other} is not supported"),
            ))
        }
    })
}

fn general_error(context: &str, error: impl Debug) -> PluginError {
    PluginError::new(StatusCode::GeneralError, format!("{context}: {error:?}"))
}

/// A network that has been read and inspected, but not necessarily compiled.
struct ReadNetwork {
    network: CNNNetwork,
    input_name: String,
    output_name: String,
    info: NetworkInfo,
}

/// Plugin backed by the Inference Engine C API.
pub struct OpenVinoPlugin {
    // Fields drop in declaration order: the request goes before its network, the core last.
    request: Option<InferRequest>,
    executable: Option<ExecutableNetwork>,
    network: Option<ReadNetwork>,
    core: Core,
    library: PathBuf,
    device: String,
    requested_batch: Option<usize>,
    last_infer: Option<Duration>,
}

impl OpenVinoPlugin {
    /// Connect to the engine for `device`, using the plugin library that was selected.
    ///
    /// A `plugins.xml` next to the library is used as the engine configuration
    /// when present; otherwise the engine falls back to its default one.
    pub fn open(library: &Path, device: &str) -> Result<Self, DlInferError> {
        if !library.is_file() {
            return Err(DlInferError::FileError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("plugin library {} not found", library.display()),
            )));
        }

        let plugins_xml = library.with_file_name("plugins.xml");
        let xml_config = plugins_xml
            .is_file()
            .then(|| plugins_xml.to_string_lossy().into_owned());
        let core = Core::new(xml_config.as_deref())
            .map_err(|e| general_error("cannot create inference engine core", e))?;

        info!("Connected to OpenVINO {} for device {}", openvino::version(), device);
        Ok(Self {
            request: None,
            executable: None,
            network: None,
            core,
            library: library.to_path_buf(),
            device: device.to_string(),
            requested_batch: None,
            last_infer: None,
        })
    }

    fn compile(&mut self) -> Result<(), PluginError> {
        let read = self.network.as_ref().ok_or_else(|| {
            PluginError::new(StatusCode::NetworkNotLoaded, "no network has been read")
        })?;
        self.request = None;
        let mut executable = self.core.load_network(&read.network, &self.device)?;
        self.request = Some(executable.create_infer_request()?);
        self.executable = Some(executable);
        Ok(())
    }
}

impl InferencePlugin for OpenVinoPlugin {
    fn version(&self) -> Option<Version> {
        let full = openvino::version();
        let mut parts = full.split('.');
        let api_major = parts.next().and_then(|p| p.parse().ok())?;
        let api_minor = parts.next().and_then(|p| p.parse().ok())?;
        let description = self
            .library
            .file_stem()
            .map(|stem| stem.to_string_lossy().trim_start_matches("lib").to_string());
        Some(Version {
            api_major,
            api_minor,
            description,
            build_number: Some(full),
        })
    }

    fn read_network(&mut self, model: &Path, weights: &Path) -> Result<NetworkInfo, PluginError> {
        let mut network = self
            .core
            .read_network_from_file(&model.to_string_lossy(), &weights.to_string_lossy())?;
        let input_name = network.get_input_name(0)?;
        let output_name = network.get_output_name(0)?;
        network.set_input_layout(&input_name, Layout::NCHW)?;
        network.set_output_precision(&output_name, openvino::Precision::FP32)?;

        // The C API only reports shapes through blobs, so compile once to inspect them.
        let mut executable = self.core.load_network(&network, &self.device)?;
        let mut request = executable.create_infer_request()?;
        let input_desc = request.get_blob(&input_name)?.tensor_desc()?;
        let output_desc = request.get_blob(&output_name)?.tensor_desc()?;
        check_output_precision(from_openvino_precision(output_desc.precision()))?;

        let dims: Vec<usize> = input_desc.dims().iter().map(|&d| d as usize).collect();
        let [batch_size, channels, height, width] = match dims[..] {
            [n, c, h, w] => [n, c, h, w],
            _ => {
                return Err(PluginError::new(
                    StatusCode::NotImplemented,
                    format!("expected a 4-dimensional input, got {dims:?}"),
                ))
            }
        };
        let classes = output_desc
            .dims()
            .iter()
            .skip(1)
            .map(|&d| d as usize)
            .product();
        let info = NetworkInfo {
            batch_size,
            channels,
            height,
            width,
            precision: from_openvino_precision(input_desc.precision()),
            classes,
        };
        debug!("Read network {} ({} -> {}): {:?}", model.display(), input_name, output_name, info);

        self.request = Some(request);
        self.executable = Some(executable);
        self.network = Some(ReadNetwork {
            network,
            input_name,
            output_name,
            info: info.clone(),
        });
        Ok(info)
    }

    fn set_batch_size(&mut self, size: usize) -> Result<(), PluginError> {
        // Requests run one network batch at a time, so a larger batch is split up in `infer`.
        debug!("Batch size set to {}", size);
        self.requested_batch = Some(size);
        Ok(())
    }

    fn load_network(&mut self) -> Result<(), PluginError> {
        self.compile()
    }

    fn infer(&mut self, input: &InputBlob) -> Result<OutputBlob, PluginError> {
        let read = self.network.as_ref().ok_or_else(|| {
            PluginError::new(StatusCode::NetworkNotLoaded, "no network has been read")
        })?;
        let request = self.request.as_mut().ok_or_else(|| {
            PluginError::new(StatusCode::NetworkNotLoaded, "network is not loaded")
        })?;

        let chunk = batch_chunk(read.info.batch_size, self.requested_batch, input.batch_size())?;

        let [_, channels, height, width] = input.dims();
        let precision = to_openvino_precision(input.precision())?;
        let started = Instant::now();
        let mut scores = Vec::with_capacity(input.batch_size() * read.info.classes);
        for first in (0..input.batch_size()).step_by(chunk) {
            let mut bytes = Vec::new();
            for index in first..first + chunk {
                bytes.extend(input.item_bytes(index).unwrap_or_default());
            }
            let desc = TensorDesc::new(
                Layout::NCHW,
                &[chunk as u64, channels as u64, height as u64, width as u64],
                precision,
            );
            let blob = Blob::new(desc, &bytes)?;
            request.set_blob(&read.input_name, blob)?;
            request.infer()?;

            let mut output = request.get_blob(&read.output_name)?;
            let values = unsafe { output.buffer_as_type::<f32>() }?;
            scores.extend_from_slice(values);
        }
        self.last_infer = Some(started.elapsed());

        let classes = read.info.classes;
        OutputBlob::new(input.batch_size(), classes, scores)
    }

    fn performance_counts(&self) -> BTreeMap<String, ProfileInfo> {
        // The C API binding exposes no per-layer counters; report the request as a whole.
        let mut counts = BTreeMap::new();
        if let Some(elapsed) = self.last_infer {
            let micros = i64::try_from(elapsed.as_micros()).unwrap_or(i64::MAX);
            counts.insert(
                "infer".to_string(),
                ProfileInfo {
                    status: ProfileStatus::Executed,
                    real_time_us: micros,
                    cpu_us: micros,
                },
            );
        }
        counts
    }
}
