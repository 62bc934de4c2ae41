//! Configuration of a single trained model.
//!
//! A [`Configurator`] is an inert, validated description of which network to
//! read, where to look for the hardware plugin, and which labels belong to the
//! network outputs. It does no work on its own; hand it to
//! [`crate::InferenceEngine::new`] to connect to a plugin.

use crate::error::DlInferError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Order in which color channels are laid out in the input blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    /// Blue, green, red; what Caffe-trained networks expect
    #[default]
    Bgr,
    Rgb,
}

/// How images are turned into network input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    pub channel_order: ChannelOrder,
    /// Resize images to the network input size instead of rejecting them
    pub resize: bool,
}

/// Describes a trained model and the plugin that should execute it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configurator {
    model_file: PathBuf,
    #[serde(default)]
    plugin_dirs: Vec<PathBuf>,
    plugin_name: String,
    #[serde(default)]
    label_file: Option<PathBuf>,
    #[serde(default)]
    image_options: ImageOptions,
    #[serde(default)]
    mean_scalars: Option<[f32; 3]>,
}

impl Configurator {
    /// Create a configurator for a particular trained model.
    ///
    /// # Arguments
    ///
    /// * `model_file` - Path to the network description (`.xml`)
    /// * `plugin_dirs` - Directories searched, in order, for `lib<plugin_name>.so`
    /// * `plugin_name` - Name of the plugin, e.g. `MKLDNNPlugin`
    /// * `label_file` - Optional label file; defaults to `<model>.labels`
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dlinfer::Configurator;
    ///
    /// let configurator = Configurator::new(
    ///     "/models/CaffeNet.xml",
    ///     ["/opt/intel/inference_engine/lib/intel64"],
    ///     "MKLDNNPlugin",
    ///     None,
    /// )
    /// .unwrap();
    /// ```
    pub fn new(
        model_file: impl AsRef<Path>,
        plugin_dirs: impl IntoIterator<Item = impl Into<PathBuf>>,
        plugin_name: impl Into<String>,
        label_file: Option<&Path>,
    ) -> Result<Self, DlInferError> {
        let configurator = Self {
            model_file: model_file.as_ref().to_path_buf(),
            plugin_dirs: plugin_dirs.into_iter().map(Into::into).collect(),
            plugin_name: plugin_name.into(),
            label_file: label_file.map(Path::to_path_buf),
            image_options: ImageOptions::default(),
            mean_scalars: None,
        };
        configurator.validate()?;
        Ok(configurator)
    }

    /// Create a configurator that searches a single plugin directory.
    pub fn with_plugin_path(
        model_file: impl AsRef<Path>,
        plugin_path: impl Into<PathBuf>,
        plugin_name: impl Into<String>,
        label_file: Option<&Path>,
    ) -> Result<Self, DlInferError> {
        Self::new(model_file, [plugin_path.into()], plugin_name, label_file)
    }

    /// Load a configurator from a JSON file.
    ///
    /// The model file named in the JSON is validated exactly as in [`Configurator::new`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DlInferError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, DlInferError> {
        let configurator: Self = serde_json::from_str(contents)?;
        configurator.validate()?;
        Ok(configurator)
    }

    /// Only a missing model is fatal; anything else is left for the plugin to report.
    fn validate(&self) -> Result<(), DlInferError> {
        match fs::metadata(&self.model_file) {
            Ok(metadata) if metadata.is_dir() => Err(DlInferError::InvalidPath(format!(
                "{} is a directory",
                self.model_file.display()
            ))),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(DlInferError::FileError(e)),
            Err(_) => Ok(()),
        }
    }

    pub fn with_image_options(mut self, options: ImageOptions) -> Self {
        self.image_options = options;
        self
    }

    pub fn with_mean_scalars(mut self, means: [f32; 3]) -> Self {
        self.mean_scalars = Some(means);
        self
    }

    pub fn model_file(&self) -> &Path {
        &self.model_file
    }

    pub fn plugin_dirs(&self) -> &[PathBuf] {
        &self.plugin_dirs
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// The label file as configured, if any.
    pub fn label_file(&self) -> Option<&Path> {
        self.label_file
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    pub fn image_options(&self) -> ImageOptions {
        self.image_options
    }

    pub fn mean_scalars(&self) -> Option<[f32; 3]> {
        self.mean_scalars
    }

    /// The weights file that accompanies the model: `<model>.bin`.
    pub fn weights_file(&self) -> PathBuf {
        self.model_file.with_extension("bin")
    }

    /// The label file that will actually be read.
    pub fn labels_path(&self) -> PathBuf {
        match self.label_file() {
            Some(path) => path.to_path_buf(),
            None => self.model_file.with_extension("labels"),
        }
    }
}
