//! Reading images and fitting them to the network batch.

use crate::config::{ChannelOrder, ImageOptions};
use crate::error::DlInferError;
use crate::types::NetworkInfo;
use image::imageops::FilterType;
use image::GenericImageView;
use std::path::Path;
use tracing::{debug, warn};

/// A decoded image: interleaved 8-bit pixels, `height x width x channels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    /// Path the image was read from, used to label its results
    pub name: String,
    pub data: Vec<u8>,
}

impl AsRef<[u8]> for RawImage {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Decode `path` into network input for a single batch item.
///
/// The decoded size must match `info.input_size()`. With `options.resize`
/// the image is first scaled to the network's spatial dimensions.
pub fn read_image(
    path: &Path,
    info: &NetworkInfo,
    options: &ImageOptions,
) -> Result<RawImage, DlInferError> {
    let mut img = image::open(path)?;
    let (width, height) = img.dimensions();
    if options.resize && (width as usize != info.width || height as usize != info.height) {
        debug!(
            "Resizing {} from {}x{} to {}x{}",
            path.display(),
            width,
            height,
            info.width,
            info.height
        );
        img = img.resize_exact(info.width as u32, info.height as u32, FilterType::Triangle);
    }

    let data = match info.channels {
        1 => img.to_luma8().into_raw(),
        3 => {
            let mut data = img.to_rgb8().into_raw();
            if options.channel_order == ChannelOrder::Bgr {
                for pixel in data.chunks_exact_mut(3) {
                    pixel.swap(0, 2);
                }
            }
            data
        }
        channels => {
            return Err(DlInferError::InvalidInput(format!(
                "networks with {channels} input channels cannot take images"
            )))
        }
    };

    if data.len() != info.input_size() {
        return Err(DlInferError::InvalidInput(format!(
            "Input sizes mismatch, got {} bytes, expecting {}",
            data.len(),
            info.input_size()
        )));
    }

    Ok(RawImage {
        name: path.display().to_string(),
        data,
    })
}

/// Fit `images` to a network whose batch dimension is `batch_size` (> 1).
///
/// Short batches are filled by repeating the images in order; long batches
/// lose their trailing images.
pub fn reconcile_batch(mut images: Vec<RawImage>, batch_size: usize) -> Vec<RawImage> {
    let count = images.len();
    if count == 0 || count == batch_size {
        return images;
    }

    if count < batch_size {
        debug!("Repeating {} images to fill a batch of {}", count, batch_size);
        for index in count..batch_size {
            let repeated = images[index % count].clone();
            images.push(repeated);
        }
    } else {
        for skipped in images.drain(batch_size..) {
            warn!("Image {} skipped!", skipped.name);
        }
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Precision;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;
    use tracing_test::traced_test;

    fn network(width: usize, height: usize, channels: usize) -> NetworkInfo {
        NetworkInfo {
            batch_size: 1,
            channels,
            height,
            width,
            precision: Precision::U8,
            classes: 10,
        }
    }

    fn named(names: &[&str]) -> Vec<RawImage> {
        names
            .iter()
            .map(|name| RawImage {
                name: name.to_string(),
                data: vec![0; 3],
            })
            .collect()
    }

    fn names(images: &[RawImage]) -> Vec<&str> {
        images.iter().map(|image| image.name.as_str()).collect()
    }

    #[test]
    fn test_read_image_as_bgr() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("red.png");
        RgbImage::from_pixel(2, 2, Rgb([255, 10, 0])).save(&path).unwrap();

        let image = read_image(&path, &network(2, 2, 3), &ImageOptions::default()).unwrap();
        assert_eq!(image.data.len(), 12);
        assert_eq!(&image.data[..3], &[0, 10, 255]);
        assert_eq!(image.name, path.display().to_string());

        let options = ImageOptions {
            channel_order: ChannelOrder::Rgb,
            resize: false,
        };
        let image = read_image(&path, &network(2, 2, 3), &options).unwrap();
        assert_eq!(&image.data[..3], &[255, 10, 0]);
    }

    #[test]
    fn test_read_image_size_mismatch_and_resize() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.png");
        RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])).save(&path).unwrap();

        match read_image(&path, &network(2, 2, 3), &ImageOptions::default()) {
            Err(DlInferError::InvalidInput(msg)) => {
                assert_eq!(msg, "Input sizes mismatch, got 48 bytes, expecting 12")
            }
            other => panic!("Expected a size mismatch, got {:?}", other),
        }

        let options = ImageOptions {
            resize: true,
            ..ImageOptions::default()
        };
        let image = read_image(&path, &network(2, 2, 3), &options).unwrap();
        assert_eq!(image.data.len(), 12);
    }

    #[test]
    fn test_read_grayscale() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gray.png");
        RgbImage::from_pixel(3, 1, Rgb([90, 90, 90])).save(&path).unwrap();

        let image = read_image(&path, &network(3, 1, 1), &ImageOptions::default()).unwrap();
        assert_eq!(image.data, vec![90, 90, 90]);
    }

    #[test]
    fn test_unreadable_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(
            read_image(&path, &network(2, 2, 3), &ImageOptions::default()),
            Err(DlInferError::ImageError(_))
        ));
    }

    #[test]
    fn test_fill_short_batch() {
        let images = reconcile_batch(named(&["a", "b", "c"]), 8);
        assert_eq!(names(&images), vec!["a", "b", "c", "a", "b", "c", "a", "b"]);

        let images = reconcile_batch(named(&["a"]), 3);
        assert_eq!(names(&images), vec!["a", "a", "a"]);
    }

    #[test]
    #[traced_test]
    fn test_truncate_long_batch() {
        let images = reconcile_batch(named(&["a", "b", "c", "d"]), 2);
        assert_eq!(names(&images), vec!["a", "b"]);
        assert!(logs_contain("Image c skipped!"));
        assert!(logs_contain("Image d skipped!"));
    }

    #[test]
    fn test_exact_batch_is_untouched() {
        let images = reconcile_batch(named(&["a", "b"]), 2);
        assert_eq!(names(&images), vec!["a", "b"]);
    }
}
