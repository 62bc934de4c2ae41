//! The inference engine: a configured network bound to a hardware plugin.
//!
//! An [`InferenceEngine`] goes through a fixed life cycle:
//!
//! 1. construction reads the network and its labels through the plugin
//! 2. [`InferenceEngine::load_images`] decodes images into an input blob
//! 3. [`InferenceEngine::load_model`] makes the network ready on the device
//! 4. [`InferenceEngine::infer`] scores the loaded input
//! 5. [`InferenceEngine::top_results`] ranks the scores per image
//!
//! Steps 2 and 3 can happen in either order. Loading new images discards the
//! previous scores.

use crate::backends::{create_plugin, BackendConfig, InferencePlugin, PluginError, StatusCode};
use crate::blob::{InputBlob, OutputBlob};
use crate::config::{Configurator, ImageOptions};
use crate::error::DlInferError;
use crate::input::{read_image, reconcile_batch, RawImage};
use crate::labels::Labels;
use crate::perf::PerformanceReport;
use crate::plugin;
use crate::ranking;
use crate::types::{ClassResult, InferenceResults, NetworkInfo};
use std::path::Path;
use tracing::{debug, info, warn};

/// Per-channel means of the ILSVRC 2012 training set, in BGR order.
pub const ILSVRC2012_MEAN_SCALARS: [f32; 3] = [104.00698793, 116.66876762, 122.67891434];

struct LoadedInput {
    images: Vec<RawImage>,
    blob: InputBlob,
}

/// A trained network connected to the plugin that executes it.
pub struct InferenceEngine {
    plugin: Box<dyn InferencePlugin>,
    network: NetworkInfo,
    /// Batch dimension as the network declared it, before any resizing
    declared_batch: usize,
    labels: Labels,
    image_options: ImageOptions,
    mean_scalars: Option<[f32; 3]>,
    input: Option<LoadedInput>,
    output: Option<OutputBlob>,
}

impl InferenceEngine {
    /// Connect to the configured plugin and read the network.
    ///
    /// The plugin library is searched for in every configured directory, in
    /// order. Each directory that fails is logged.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dlinfer::{Configurator, InferenceEngine};
    ///
    /// let config = Configurator::with_plugin_path(
    ///     "/models/CaffeNet.xml",
    ///     "/opt/intel/inference_engine/lib/intel64",
    ///     "MKLDNNPlugin",
    ///     None,
    /// )?;
    /// let mut engine = InferenceEngine::new(&config)?;
    /// engine.load_image("cat.bmp")?;
    /// engine.load_model()?;
    /// engine.infer()?;
    /// for results in engine.top_results(5)? {
    ///     print!("{results}");
    /// }
    /// # Ok::<(), dlinfer::DlInferError>(())
    /// ```
    pub fn new(config: &Configurator) -> Result<Self, DlInferError> {
        let name = config.plugin_name();
        let device = plugin::device_name(name).to_string();
        let plugin = plugin::select_plugin(config.plugin_dirs(), name, |library| {
            create_plugin(BackendConfig::OpenVino {
                plugin_library: library.to_path_buf(),
                device: device.clone(),
            })
        })?;
        Self::with_plugin(config, plugin)
    }

    /// Read the configured network through an already connected plugin.
    pub fn with_plugin(
        config: &Configurator,
        mut plugin: Box<dyn InferencePlugin>,
    ) -> Result<Self, DlInferError> {
        let weights = config.weights_file();
        let network = plugin
            .read_network(config.model_file(), &weights)
            .map_err(|e| {
                DlInferError::ModelLoad(format!(
                    "cannot read network {}: {}",
                    config.model_file().display(),
                    e
                ))
            })?;
        info!(
            "Read network {} ({}x{}x{}, batch {}, {} classes, {})",
            config.model_file().display(),
            network.channels,
            network.height,
            network.width,
            network.batch_size,
            network.classes,
            network.precision
        );

        let labels_path = config.labels_path();
        let labels = match Labels::from_file(&labels_path) {
            Ok(labels) => labels,
            Err(e) => {
                warn!("Cannot read labels from {}: {}", labels_path.display(), e);
                Labels::default()
            }
        };

        Ok(Self {
            plugin,
            declared_batch: network.batch_size,
            network,
            labels,
            image_options: config.image_options(),
            mean_scalars: config.mean_scalars(),
            input: None,
            output: None,
        })
    }

    /// Load a single image as the network input.
    pub fn load_image(&mut self, path: impl AsRef<Path>) -> Result<(), DlInferError> {
        self.load_images(&[path])
    }

    /// Load `paths` as the network input, replacing whatever was loaded before.
    ///
    /// Images that cannot be decoded or do not fit the network are skipped.
    /// A network with batch 1 is resized to the number of usable images; any
    /// other batch is filled by repeating images or truncated.
    pub fn load_images<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<(), DlInferError> {
        let mut images = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            match read_image(path, &self.network, &self.image_options) {
                Ok(image) => images.push(image),
                Err(e) => warn!("Image {} cannot be read: {}", path.display(), e),
            }
        }
        if images.is_empty() {
            return Err(DlInferError::InvalidInput(
                "Valid input images were not found!".to_string(),
            ));
        }

        let images = if self.declared_batch == 1 {
            if self.network.batch_size != images.len() {
                self.plugin.set_batch_size(images.len())?;
                self.network.batch_size = images.len();
            }
            images
        } else {
            reconcile_batch(images, self.declared_batch)
        };

        let blob = InputBlob::from_images(&images, &self.network, self.mean_scalars)?;
        debug!("Loaded input blob {:?} ({})", blob.dims(), blob.precision());
        self.output = None;
        self.input = Some(LoadedInput { images, blob });
        Ok(())
    }

    /// Load the network into the plugin so it can be executed.
    pub fn load_model(&mut self) -> Result<(), DlInferError> {
        self.output = None;
        self.plugin.load_network().map_err(|e| match e.status {
            StatusCode::GeneralError => DlInferError::ModelLoad(e.message),
            StatusCode::NotImplemented => DlInferError::ModelLoad(
                "Model cannot be loaded! Plugin is not supported this model!".to_string(),
            ),
            _ => DlInferError::ModelLoad(e.to_string()),
        })?;
        info!("Model loaded with batch size {}", self.network.batch_size);
        Ok(())
    }

    /// Score the loaded input.
    pub fn infer(&mut self) -> Result<(), DlInferError> {
        let input = self.input.as_ref().ok_or_else(|| {
            DlInferError::InvalidOperation("Scoring failed! Input data is not loaded!".to_string())
        })?;
        self.output = None;
        let output = self.plugin.infer(&input.blob).map_err(scoring_error)?;
        debug!(
            "Scored {} images over {} classes",
            output.batch_size(),
            output.classes()
        );
        self.output = Some(output);
        Ok(())
    }

    /// The `top_count` best classes of every loaded image, best first.
    ///
    /// `top_count` is clamped to the number of classes the network produces.
    pub fn top_results(&self, top_count: usize) -> Result<Vec<InferenceResults>, DlInferError> {
        let (output, input) = match (&self.output, &self.input) {
            (Some(output), Some(input)) => (output, input),
            _ => {
                return Err(DlInferError::InvalidOperation(
                    "Cannot get top results!".to_string(),
                ))
            }
        };
        if output.batch_size() != input.images.len() {
            return Err(DlInferError::InvalidOperation(
                "Batch size is not equal to the number of images!".to_string(),
            ));
        }

        let top_count = top_count.min(output.classes());
        let results = input
            .images
            .iter()
            .enumerate()
            .map(|(index, image)| {
                let scores = output.scores(index);
                let mut results = InferenceResults::new(image.name.as_str());
                for id in ranking::top_results(top_count, scores) {
                    results.add_result(ClassResult {
                        id,
                        probability: scores[id],
                        label: self.labels.label_for(id).into_owned(),
                    });
                }
                results
            })
            .collect();
        Ok(results)
    }

    /// Timings the plugin recorded for the last inference.
    pub fn performance_counts(&self) -> PerformanceReport {
        PerformanceReport::new(self.plugin.performance_counts())
    }

    /// Subtract the ILSVRC 2012 channel means from `FP32` input.
    pub fn set_ilsvrc2012_mean_scalars(&mut self) -> Result<(), DlInferError> {
        self.set_mean_scalars(ILSVRC2012_MEAN_SCALARS)
    }

    /// Subtract `means` (one per channel, in blob channel order) from `FP32` input.
    ///
    /// Images that are already loaded are converted again with the new means.
    pub fn set_mean_scalars(&mut self, means: [f32; 3]) -> Result<(), DlInferError> {
        self.mean_scalars = Some(means);
        if let Some(input) = &mut self.input {
            input.blob = InputBlob::from_images(&input.images, &self.network, Some(means))?;
            self.output = None;
        }
        Ok(())
    }

    pub fn mean_scalars(&self) -> Option<[f32; 3]> {
        self.mean_scalars
    }

    /// The network as it will be executed; the batch reflects the loaded images.
    pub fn network_info(&self) -> &NetworkInfo {
        &self.network
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Names of the loaded images, one per batch item.
    pub fn image_names(&self) -> Vec<&str> {
        self.input
            .iter()
            .flat_map(|input| input.images.iter().map(|image| image.name.as_str()))
            .collect()
    }
}

fn scoring_error(error: PluginError) -> DlInferError {
    let message = match error.status {
        StatusCode::GeneralError => format!("Critical error: {}", error.message),
        StatusCode::NotImplemented => "Input data is incorrect and not supported!".to_string(),
        StatusCode::NetworkNotLoaded => error.message,
        _ => error.to_string(),
    };
    DlInferError::Scoring(message)
}

/// Load `path` as the input of `engine`.
pub fn load_image(engine: &mut InferenceEngine, path: impl AsRef<Path>) -> Result<(), DlInferError> {
    engine.load_image(path)
}

/// Score whatever input `engine` has loaded.
pub fn infer(engine: &mut InferenceEngine) -> Result<(), DlInferError> {
    engine.infer()
}

/// The `top_count` best classes per image from the last inference of `engine`.
pub fn get_top_result(
    engine: &InferenceEngine,
    top_count: usize,
) -> Result<Vec<InferenceResults>, DlInferError> {
    engine.top_results(top_count)
}
