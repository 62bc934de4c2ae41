//! Typed tensor buffers exchanged with plugins.
//!
//! An [`InputBlob`] holds a whole batch in planar `NCHW` order, converted to
//! the precision the network declares. An [`OutputBlob`] holds one score per
//! class for every batch item.

use crate::backends::{PluginError, StatusCode};
use crate::error::DlInferError;
use crate::types::{NetworkInfo, Precision};

/// Storage of an input blob, one variant per supported input precision.
#[derive(Debug, Clone, PartialEq)]
pub enum BlobData {
    F32(Vec<f32>),
    /// Used for both `I16` and `Q78` networks
    I16(Vec<i16>),
    U8(Vec<u8>),
}

impl BlobData {
    pub fn len(&self) -> usize {
        match self {
            BlobData::F32(values) => values.len(),
            BlobData::I16(values) => values.len(),
            BlobData::U8(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bytes(&self, start: usize, end: usize) -> Vec<u8> {
        match self {
            BlobData::F32(values) => values[start..end]
                .iter()
                .flat_map(|v| v.to_ne_bytes())
                .collect(),
            BlobData::I16(values) => values[start..end]
                .iter()
                .flat_map(|v| v.to_ne_bytes())
                .collect(),
            BlobData::U8(values) => values[start..end].to_vec(),
        }
    }
}

/// A batch of images ready to be handed to a plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct InputBlob {
    dims: [usize; 4],
    precision: Precision,
    data: BlobData,
}

impl InputBlob {
    /// Convert interleaved 8-bit images into a planar blob of the network precision.
    ///
    /// Every image must hold exactly `info.input_size()` bytes laid out as
    /// `height x width x channels`. Mean scalars are subtracted per channel,
    /// and only for `FP32` networks.
    pub fn from_images<I: AsRef<[u8]>>(
        images: &[I],
        info: &NetworkInfo,
        mean_scalars: Option<[f32; 3]>,
    ) -> Result<Self, DlInferError> {
        let item_size = info.input_size();
        if item_size == 0 {
            return Err(DlInferError::InvalidInput(
                "Error: Incorrect network input dimensions!".to_string(),
            ));
        }
        if let Some(image) = images.iter().find(|image| image.as_ref().len() != item_size) {
            return Err(DlInferError::InvalidInput(format!(
                "Input sizes mismatch, got {} bytes, expecting {}",
                image.as_ref().len(),
                item_size
            )));
        }

        let plane = info.height * info.width;
        let mut planar = Vec::with_capacity(images.len() * item_size);
        for image in images {
            let image = image.as_ref();
            for channel in 0..info.channels {
                planar.extend((0..plane).map(|pixel| image[pixel * info.channels + channel]));
            }
        }

        let data = match info.precision {
            Precision::FP32 => {
                let means = mean_scalars.unwrap_or([0.0; 3]);
                BlobData::F32(
                    planar
                        .iter()
                        .enumerate()
                        .map(|(i, &value)| {
                            let channel = (i / plane) % info.channels;
                            f32::from(value) - means.get(channel).copied().unwrap_or(0.0)
                        })
                        .collect(),
                )
            }
            Precision::I16 | Precision::Q78 => {
                BlobData::I16(planar.into_iter().map(i16::from).collect())
            }
            Precision::U8 => BlobData::U8(planar),
            other => return Err(DlInferError::UnsupportedPrecision(other)),
        };

        Ok(Self {
            dims: [images.len(), info.channels, info.height, info.width],
            precision: info.precision,
            data,
        })
    }

    /// `[batch, channels, height, width]`
    pub fn dims(&self) -> [usize; 4] {
        self.dims
    }

    pub fn batch_size(&self) -> usize {
        self.dims[0]
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn data(&self) -> &BlobData {
        &self.data
    }

    /// Number of values a single batch item occupies.
    pub fn item_len(&self) -> usize {
        self.dims[1] * self.dims[2] * self.dims[3]
    }

    /// Native-endian bytes of one batch item, as a plugin copies them into its own tensor.
    pub fn item_bytes(&self, index: usize) -> Option<Vec<u8>> {
        if index >= self.batch_size() {
            return None;
        }
        let len = self.item_len();
        Some(self.data.bytes(index * len, (index + 1) * len))
    }
}

/// Scores produced by a plugin, `classes` values per batch item.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputBlob {
    batch_size: usize,
    classes: usize,
    data: Vec<f32>,
}

impl OutputBlob {
    pub fn new(batch_size: usize, classes: usize, data: Vec<f32>) -> Result<Self, PluginError> {
        if data.len() != batch_size * classes {
            return Err(PluginError::new(
                StatusCode::ParameterMismatch,
                format!(
                    "output holds {} values, expected {} x {}",
                    data.len(),
                    batch_size,
                    classes
                ),
            ));
        }
        Ok(Self {
            batch_size,
            classes,
            data,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    /// The scores of batch item `index`.
    pub fn scores(&self, index: usize) -> &[f32] {
        &self.data[index * self.classes..(index + 1) * self.classes]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network(precision: Precision) -> NetworkInfo {
        NetworkInfo {
            batch_size: 1,
            channels: 3,
            height: 1,
            width: 2,
            precision,
            classes: 4,
        }
    }

    #[test]
    fn test_interleaved_to_planar() {
        // Two pixels, BGR interleaved.
        let image = vec![1u8, 2, 3, 4, 5, 6];
        let blob = InputBlob::from_images(&[image], &network(Precision::U8), None).unwrap();
        assert_eq!(blob.dims(), [1, 3, 1, 2]);
        assert_eq!(blob.data(), &BlobData::U8(vec![1, 4, 2, 5, 3, 6]));
    }

    #[test]
    fn test_fp32_mean_subtraction() {
        let image = vec![10u8, 20, 30, 40, 50, 60];
        let blob = InputBlob::from_images(
            &[image],
            &network(Precision::FP32),
            Some([1.0, 2.0, 3.0]),
        )
        .unwrap();
        assert_eq!(
            blob.data(),
            &BlobData::F32(vec![9.0, 39.0, 18.0, 48.0, 27.0, 57.0])
        );
    }

    #[test]
    fn test_means_are_ignored_for_integer_precisions() {
        let image = vec![10u8, 20, 30, 40, 50, 60];
        for precision in [Precision::I16, Precision::Q78] {
            let blob =
                InputBlob::from_images(&[image.clone()], &network(precision), Some([1.0; 3]))
                    .unwrap();
            assert_eq!(blob.data(), &BlobData::I16(vec![10, 40, 20, 50, 30, 60]));
            assert_eq!(blob.precision(), precision);
        }
    }

    #[test]
    fn test_batch_layout_and_item_bytes() {
        let first = vec![1u8; 6];
        let second = vec![2u8; 6];
        let blob =
            InputBlob::from_images(&[first, second], &network(Precision::U8), None).unwrap();
        assert_eq!(blob.batch_size(), 2);
        assert_eq!(blob.item_bytes(1), Some(vec![2u8; 6]));
        assert_eq!(blob.item_bytes(2), None);

        let blob = InputBlob::from_images(&[vec![0u8; 6]], &network(Precision::FP32), None)
            .unwrap();
        assert_eq!(blob.item_bytes(0).map(|b| b.len()), Some(6 * 4));
    }

    #[test]
    fn test_unsupported_precision() {
        let result = InputBlob::from_images(&[vec![0u8; 6]], &network(Precision::FP16), None);
        assert!(matches!(
            result,
            Err(DlInferError::UnsupportedPrecision(Precision::FP16))
        ));
    }

    #[test]
    fn test_size_mismatch() {
        let result = InputBlob::from_images(&[vec![0u8; 5]], &network(Precision::U8), None);
        match result {
            Err(DlInferError::InvalidInput(msg)) => {
                assert_eq!(msg, "Input sizes mismatch, got 5 bytes, expecting 6")
            }
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_output_blob() {
        let output = OutputBlob::new(2, 3, vec![0.1, 0.2, 0.7, 0.5, 0.4, 0.1]).unwrap();
        assert_eq!(output.scores(1), &[0.5, 0.4, 0.1]);
        let error = OutputBlob::new(2, 3, vec![0.0; 5]).unwrap_err();
        assert_eq!(error.status, StatusCode::ParameterMismatch);
    }
}
