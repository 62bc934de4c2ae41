//! A plugin that replays scripted scores, for tests that must not need a device.

use crate::backends::{InferencePlugin, PluginError, StatusCode};
use crate::blob::{InputBlob, OutputBlob};
use crate::types::{NetworkInfo, Precision, ProfileInfo, Version};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// What the engine did to a [`ScriptedPlugin`], shared with the test after the
/// plugin has been boxed.
#[derive(Debug, Default)]
pub struct PluginLog {
    pub batch_sizes: Vec<usize>,
    pub loads: usize,
    pub inferences: usize,
    pub last_input: Option<InputBlob>,
}

pub struct ScriptedPlugin {
    info: NetworkInfo,
    scores: Vec<Vec<f32>>,
    read_error: Option<PluginError>,
    load_error: Option<PluginError>,
    infer_error: Option<PluginError>,
    counts: BTreeMap<String, ProfileInfo>,
    loaded: bool,
    log: Arc<Mutex<PluginLog>>,
}

impl ScriptedPlugin {
    /// A 2x2 BGR, batch 1, FP32 classifier with `classes` outputs scoring
    /// class `i` as `i / classes`.
    pub fn classifier(classes: usize) -> Self {
        let scores = (0..classes).map(|i| i as f32 / classes as f32).collect();
        Self {
            info: NetworkInfo {
                batch_size: 1,
                channels: 3,
                height: 2,
                width: 2,
                precision: Precision::FP32,
                classes,
            },
            scores: vec![scores],
            read_error: None,
            load_error: None,
            infer_error: None,
            counts: BTreeMap::new(),
            loaded: false,
            log: Arc::default(),
        }
    }

    pub fn with_network(mut self, info: NetworkInfo) -> Self {
        self.info = info;
        self
    }

    /// Batch item `b` gets `scores[b % scores.len()]`.
    pub fn with_scores(mut self, scores: Vec<Vec<f32>>) -> Self {
        self.scores = scores;
        self
    }

    pub fn failing_read(mut self, error: PluginError) -> Self {
        self.read_error = Some(error);
        self
    }

    pub fn failing_load(mut self, error: PluginError) -> Self {
        self.load_error = Some(error);
        self
    }

    pub fn failing_infer(mut self, error: PluginError) -> Self {
        self.infer_error = Some(error);
        self
    }

    pub fn with_counts(mut self, counts: BTreeMap<String, ProfileInfo>) -> Self {
        self.counts = counts;
        self
    }

    pub fn log(&self) -> Arc<Mutex<PluginLog>> {
        Arc::clone(&self.log)
    }

    pub fn boxed(self) -> Box<dyn InferencePlugin> {
        Box::new(self)
    }
}

impl InferencePlugin for ScriptedPlugin {
    fn version(&self) -> Option<Version> {
        Some(Version {
            api_major: 1,
            api_minor: 0,
            description: Some("ScriptedPlugin".to_string()),
            build_number: None,
        })
    }

    fn read_network(&mut self, _model: &Path, _weights: &Path) -> Result<NetworkInfo, PluginError> {
        match &self.read_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.info.clone()),
        }
    }

    fn set_batch_size(&mut self, size: usize) -> Result<(), PluginError> {
        self.info.batch_size = size;
        self.log.lock().unwrap().batch_sizes.push(size);
        Ok(())
    }

    fn load_network(&mut self) -> Result<(), PluginError> {
        if let Some(error) = &self.load_error {
            return Err(error.clone());
        }
        self.loaded = true;
        self.log.lock().unwrap().loads += 1;
        Ok(())
    }

    fn infer(&mut self, input: &InputBlob) -> Result<OutputBlob, PluginError> {
        if let Some(error) = &self.infer_error {
            return Err(error.clone());
        }
        if !self.loaded {
            return Err(PluginError::new(
                StatusCode::NetworkNotLoaded,
                "network is not loaded",
            ));
        }

        let batch = input.batch_size();
        let data = (0..batch)
            .flat_map(|b| self.scores[b % self.scores.len()].iter().copied())
            .collect();

        let mut log = self.log.lock().unwrap();
        log.inferences += 1;
        log.last_input = Some(input.clone());
        OutputBlob::new(batch, self.info.classes, data)
    }

    fn performance_counts(&self) -> BTreeMap<String, ProfileInfo> {
        self.counts.clone()
    }
}

/// Scratch model, label and image files in a temporary directory.
pub struct Fixture {
    pub dir: tempfile::TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("net.xml"), "<net/>").unwrap();
        std::fs::write(dir.path().join("net.bin"), [0u8; 4]).unwrap();
        Self { dir }
    }

    pub fn model(&self) -> std::path::PathBuf {
        self.dir.path().join("net.xml")
    }

    pub fn configurator(&self) -> crate::Configurator {
        crate::Configurator::with_plugin_path(self.model(), self.dir.path(), "MKLDNNPlugin", None)
            .unwrap()
    }

    pub fn write_labels(&self, contents: &str) {
        std::fs::write(self.dir.path().join("net.labels"), contents).unwrap();
    }

    /// Writes a `width x height` PNG filled with one RGB color and returns its path.
    pub fn write_image(&self, name: &str, width: u32, height: u32, rgb: [u8; 3]) -> std::path::PathBuf {
        let path = self.dir.path().join(name);
        image::RgbImage::from_pixel(width, height, image::Rgb(rgb))
            .save(&path)
            .unwrap();
        path
    }
}
